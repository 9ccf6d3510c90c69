//! Source configuration types for weight sensors.

pub mod sensor;

pub use sensor::{SensorConfig, SimulatedSensorConfig};
