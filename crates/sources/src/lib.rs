//! dripwatch-sources: Sensor client implementations for dripwatch.

mod http;
mod simulated;

pub use http::HttpSensorClient;
pub use simulated::SimulatedSensor;

use anyhow::Result;
use dripwatch_core::SharedSensorClient;
use dripwatch_types::source_configs::{SensorConfig, SimulatedSensorConfig};
use log::info;
use std::sync::Arc;

/// Build the sensor client selected by configuration
///
/// A simulated sensor takes precedence over the HTTP endpoint when given.
pub fn create_sensor_client(
    sensor: &SensorConfig,
    simulated: Option<&SimulatedSensorConfig>,
) -> Result<SharedSensorClient> {
    let client: SharedSensorClient = match simulated {
        Some(config) => Arc::new(SimulatedSensor::new(config.clone())),
        None => Arc::new(HttpSensorClient::new(sensor)?),
    };
    info!("Using sensor client: {}", client.metadata().description);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sensor_client_selection() {
        let simulated = SimulatedSensorConfig::default();
        let client = create_sensor_client(&SensorConfig::default(), Some(&simulated)).unwrap();
        assert_eq!(client.metadata().id, "simulated");

        let client = create_sensor_client(&SensorConfig::new("http://localhost:8000"), None).unwrap();
        assert_eq!(client.metadata().id, "http");

        assert!(create_sensor_client(&SensorConfig::default(), None).is_err());
    }
}
