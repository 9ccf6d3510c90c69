//! Scripted sensor used by the service and binding tests

use dripwatch_core::{SensorClient, SensorMetadata, DEFAULT_POLL_INTERVAL};
use dripwatch_types::{Observation, WeightReading};
use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn reading(weight: f64) -> Observation {
    Observation::Reading(WeightReading::new(weight, "2025-03-04T10:30:00Z"))
}

/// Returns scripted observations in order, repeating the last one once the
/// script runs out.
pub struct ScriptedSensor {
    metadata: SensorMetadata,
    script: Mutex<VecDeque<Observation>>,
    last: Mutex<Option<Observation>>,
    delay: Duration,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSensor {
    pub fn new(script: Vec<Observation>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Vec<Observation>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            metadata: SensorMetadata {
                id: "scripted".to_string(),
                name: "Scripted".to_string(),
                description: "Scripted test sensor".to_string(),
                default_interval: DEFAULT_POLL_INTERVAL,
            },
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay,
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_observation(&self) -> Observation {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Observation::failure(dripwatch_types::SensorError::Transport("empty script".into())))
    }
}

impl SensorClient for ScriptedSensor {
    fn metadata(&self) -> &SensorMetadata {
        &self.metadata
    }

    fn fetch_reading(&self) -> BoxFuture<'_, Observation> {
        async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let observation = self.next_observation();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            observation
        }
        .boxed()
    }
}
