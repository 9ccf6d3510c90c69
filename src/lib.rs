//! dripwatch: IV drip monitoring over a polled weight sensor
//!
//! This library provides the core functionality for dripwatch, including:
//! - The weight observation service (one poller, many subscribers)
//! - Per-consumer observation bindings
//! - Configuration management
//! - The console dashboard

pub mod config;
pub mod core;
pub mod ui;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::core::{ObservationBinding, Subscription, WeightObservationService};
pub use dripwatch_types::{Observation, ObservationState, SensorError, WeightReading};
