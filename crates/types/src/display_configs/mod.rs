//! Display configuration types for dashboard views

pub mod drip;

pub use drip::{DripScaling, DripThresholds, DripViewConfig};
