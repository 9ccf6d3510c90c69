//! UI components

mod dashboard;

pub use dashboard::Dashboard;
