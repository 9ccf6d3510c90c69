//! dripwatch-core: Core traits for the dripwatch drip monitor.
//!
//! This crate contains the fundamental traits (SensorClient, Displayer)
//! and shared constants.

pub mod constants;
mod displayer;
mod sensor_client;

pub use constants::{DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
pub use displayer::{BoxedDisplayer, Displayer};
pub use sensor_client::{SensorClient, SensorMetadata, SharedSensorClient};

// Re-export types used in trait signatures for convenience
pub use dripwatch_types::{Observation, ObservationState, SensorError, WeightReading};
