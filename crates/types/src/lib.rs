//! dripwatch-types: Shared data types for the dripwatch drip monitor.
//!
//! This crate contains pure data types (observations, sensor and view
//! configs) shared across all dripwatch crates. It has no async or network
//! dependencies.

pub mod display_configs;
pub mod observation;
pub mod source_configs;

// Re-export commonly used types at the crate root for convenience
pub use observation::{Observation, ObservationState, SensorError, SensorFailure, WeightReading};
