//! HTTP weight sensor client
//!
//! Issues `GET {base_url}/weight` against the sensor bridge and turns the JSON
//! answer into an [`Observation`]. The bridge sends the weight either as a
//! number or as a numeric string, so both are accepted.

use anyhow::{Context, Result};
use dripwatch_core::{SensorClient, SensorMetadata, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
use dripwatch_types::source_configs::SensorConfig;
use dripwatch_types::{Observation, SensorError, WeightReading};
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;

/// Wire format of the weight endpoint
#[derive(Debug, Deserialize)]
struct WeightPayload {
    weight: WeightValue,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WeightValue {
    Number(f64),
    Text(String),
}

/// Parse a weight endpoint body
fn parse_payload(body: &[u8]) -> Result<WeightReading, SensorError> {
    let payload: WeightPayload =
        serde_json::from_slice(body).map_err(|e| SensorError::Parse(e.to_string()))?;

    let weight = match payload.weight {
        WeightValue::Number(value) => value,
        WeightValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| SensorError::Parse(format!("weight {:?} is not a number", text)))?,
    };

    if !weight.is_finite() {
        return Err(SensorError::Parse(format!("weight {} is not finite", weight)));
    }

    Ok(WeightReading::new(weight, payload.timestamp))
}

/// Client for a weight sensor bridge reachable over HTTP
pub struct HttpSensorClient {
    metadata: SensorMetadata,
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpSensorClient {
    /// Build a client for the configured endpoint
    ///
    /// Fails only if the base URL is missing or the HTTP client cannot be
    /// constructed; network errors surface later as failure observations.
    pub fn new(config: &SensorConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            anyhow::bail!("Sensor base URL is not configured");
        }

        // A zero timeout would fail every request
        let timeout = if config.request_timeout_ms == 0 {
            DEFAULT_REQUEST_TIMEOUT
        } else {
            config.request_timeout()
        };
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            metadata: SensorMetadata {
                id: "http".to_string(),
                name: "HTTP Sensor".to_string(),
                description: format!("Weight sensor at {}", config.weight_url()),
                default_interval: DEFAULT_POLL_INTERVAL,
            },
            client,
            url: config.weight_url(),
            timeout,
        })
    }

    /// URL this client reads from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Read the current weight once, reporting failures as `Err`
    pub async fn current_weight(&self) -> Result<WeightReading, SensorError> {
        debug!("Fetching weight from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SensorError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let reading = parse_payload(&body)?;
        debug!("Weight data received: {} at {}", reading.weight, reading.timestamp);
        Ok(reading)
    }

    fn transport_error(&self, error: reqwest::Error) -> SensorError {
        if error.is_timeout() {
            SensorError::Transport(format!("request timed out after {:?}", self.timeout))
        } else {
            SensorError::Transport(error.to_string())
        }
    }
}

impl SensorClient for HttpSensorClient {
    fn metadata(&self) -> &SensorMetadata {
        &self.metadata
    }

    fn fetch_reading(&self) -> BoxFuture<'_, Observation> {
        async move {
            let result = self.current_weight().await;
            if let Err(e) = &result {
                warn!("Error fetching weight from {}: {}", self.url, e);
            }
            Observation::from(result)
        }
        .boxed()
    }
}
