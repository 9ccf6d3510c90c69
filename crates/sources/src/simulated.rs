//! Simulated weight sensor for demonstration and offline use
//!
//! Models a drip bag that drains at a constant rate, with optional noise on
//! each reading. Never fails.

use chrono::Utc;
use dripwatch_core::{SensorClient, SensorMetadata, DEFAULT_POLL_INTERVAL};
use dripwatch_types::source_configs::SimulatedSensorConfig;
use dripwatch_types::{Observation, WeightReading};
use futures::future::{self, BoxFuture, FutureExt};
use rand::Rng;
use std::time::Instant;

/// Simulated sensor
pub struct SimulatedSensor {
    metadata: SensorMetadata,
    config: SimulatedSensorConfig,
    start_time: Instant,
}

impl SimulatedSensor {
    pub fn new(config: SimulatedSensorConfig) -> Self {
        Self {
            metadata: SensorMetadata {
                id: "simulated".to_string(),
                name: "Simulated".to_string(),
                description: "Draining drip bag for demonstration".to_string(),
                default_interval: DEFAULT_POLL_INTERVAL,
            },
            config,
            start_time: Instant::now(),
        }
    }

    /// Weight of the bag after `elapsed_secs`, before noise
    fn drained_weight(&self, elapsed_secs: f64) -> f64 {
        (self.config.initial_weight - self.config.drain_per_second * elapsed_secs).max(0.0)
    }

    fn sample(&self) -> WeightReading {
        let mut weight = self.drained_weight(self.start_time.elapsed().as_secs_f64());

        let jitter = self.config.jitter.abs();
        if jitter.is_finite() && jitter > 0.0 {
            weight = (weight + rand::thread_rng().gen_range(-jitter..=jitter)).max(0.0);
        }

        WeightReading::new(weight, Utc::now().to_rfc3339())
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new(SimulatedSensorConfig::default())
    }
}

impl SensorClient for SimulatedSensor {
    fn metadata(&self) -> &SensorMetadata {
        &self.metadata
    }

    fn fetch_reading(&self) -> BoxFuture<'_, Observation> {
        future::ready(Observation::Reading(self.sample())).boxed()
    }
}
