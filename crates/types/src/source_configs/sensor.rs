//! Weight sensor source configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_weight_endpoint() -> String {
    "/weight".to_string()
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_request_timeout() -> u64 {
    10_000
}

/// Remote weight sensor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Base URL of the sensor bridge (e.g. `http://192.168.1.20:8000`)
    #[serde(default)]
    pub base_url: String,
    /// Path appended to the base URL
    #[serde(default = "default_weight_endpoint")]
    pub weight_endpoint: String,
    /// Poll interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl SensorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Full URL of the weight endpoint
    pub fn weight_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.weight_endpoint.starts_with('/') {
            format!("{}{}", base, self.weight_endpoint)
        } else {
            format!("{}/{}", base, self.weight_endpoint)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            weight_endpoint: default_weight_endpoint(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_initial_weight() -> f64 {
    1.0
}

fn default_drain_per_second() -> f64 {
    0.0005
}

fn default_jitter() -> f64 {
    0.002
}

/// Offline sensor that simulates a draining drip bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSensorConfig {
    /// Weight of the bag when the simulation starts
    #[serde(default = "default_initial_weight")]
    pub initial_weight: f64,
    /// Weight lost per second
    #[serde(default = "default_drain_per_second")]
    pub drain_per_second: f64,
    /// Maximum absolute random noise added to each reading
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for SimulatedSensorConfig {
    fn default() -> Self {
        Self {
            initial_weight: default_initial_weight(),
            drain_per_second: default_drain_per_second(),
            jitter: default_jitter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_url_joins_slashes() {
        let mut config = SensorConfig::new("http://10.0.0.5:8000/");
        assert_eq!(config.weight_url(), "http://10.0.0.5:8000/weight");

        config.weight_endpoint = "scale/weight".to_string();
        assert_eq!(config.weight_url(), "http://10.0.0.5:8000/scale/weight");
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let config: SensorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.weight_endpoint, "/weight");
        assert!(config.base_url.is_empty());
    }
}
