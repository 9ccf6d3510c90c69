//! Sensor observation types
//!
//! An [`Observation`] is the unit delivered to every subscriber: either a
//! successful weight reading or a failure describing why no reading could be
//! taken. The two never mix.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One successful reading from the weight sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightReading {
    /// Measured weight, in whatever unit the sensor reports
    pub weight: f64,
    /// Time the sensor produced the reading (ISO-8601, as sent)
    pub timestamp: String,
}

impl WeightReading {
    pub fn new(weight: f64, timestamp: impl Into<String>) -> Self {
        Self {
            weight,
            timestamp: timestamp.into(),
        }
    }

    /// Interpret the timestamp.
    ///
    /// Accepts RFC 3339 (`2025-03-04T10:30:00Z`) as well as the offset-less
    /// form some sensor bridges emit (`2025-03-04T10:30:00.123456`), which is
    /// taken to be UTC.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts);
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    }
}

/// Why a sensor fetch produced no reading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// Network unreachable, connection reset, request timed out
    #[error("{0}")]
    Transport(String),
    /// The endpoint answered with a non-2xx status
    #[error("HTTP error! status: {0}")]
    Status(u16),
    /// The body was not a valid weight payload
    #[error("invalid weight payload: {0}")]
    Parse(String),
}

/// A failed fetch together with the local time it was recorded
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFailure {
    pub error: SensorError,
    pub observed_at: DateTime<Utc>,
}

/// Result of one sensor fetch as seen by subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Reading(WeightReading),
    Failure(SensorFailure),
}

impl Observation {
    /// Build a failure observation stamped with the current time
    pub fn failure(error: SensorError) -> Self {
        Observation::Failure(SensorFailure {
            error,
            observed_at: Utc::now(),
        })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Observation::Failure(_))
    }

    /// The reading, if this observation is a success
    pub fn reading(&self) -> Option<&WeightReading> {
        match self {
            Observation::Reading(reading) => Some(reading),
            Observation::Failure(_) => None,
        }
    }

    /// The error, if this observation is a failure
    pub fn error(&self) -> Option<&SensorError> {
        match self {
            Observation::Reading(_) => None,
            Observation::Failure(failure) => Some(&failure.error),
        }
    }
}

impl From<Result<WeightReading, SensorError>> for Observation {
    fn from(result: Result<WeightReading, SensorError>) -> Self {
        match result {
            Ok(reading) => Observation::Reading(reading),
            Err(error) => Observation::failure(error),
        }
    }
}

/// What a consumer sees of the weight feed
///
/// Starts out loading. After the first notification exactly one of `value`
/// and `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationState {
    pub value: Option<WeightReading>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ObservationState {
    /// Fold one notification into the state
    pub fn apply(&mut self, observation: &Observation) {
        self.loading = false;
        match observation {
            Observation::Reading(reading) => {
                self.value = Some(reading.clone());
                self.error = None;
            }
            Observation::Failure(failure) => {
                self.value = None;
                self.error = Some(failure.error.to_string());
            }
        }
    }
}

impl Default for ObservationState {
    fn default() -> Self {
        Self {
            value: None,
            loading: true,
            error: None,
        }
    }
}
