//! Sensor client trait and related types

use dripwatch_types::Observation;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Metadata about a sensor client
#[derive(Debug, Clone)]
pub struct SensorMetadata {
    /// Unique identifier for this client type
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of where readings come from
    pub description: String,
    /// Recommended poll interval
    pub default_interval: Duration,
}

/// Trait for anything that can produce weight observations
///
/// Implementations perform exactly one read per call and never retry. Every
/// failure is reported as [`Observation::Failure`]; callers never see an
/// `Err`.
pub trait SensorClient: Send + Sync {
    /// Get metadata about this client
    fn metadata(&self) -> &SensorMetadata;

    /// Take one reading
    fn fetch_reading(&self) -> BoxFuture<'_, Observation>;
}

/// Shared sensor client for dynamic dispatch
pub type SharedSensorClient = Arc<dyn SensorClient>;
