//! Per-consumer binding to the observation service
//!
//! A binding subscribes when it is created and unsubscribes exactly once when
//! it is unbound or dropped. In between it exposes an [`ObservationState`]
//! that starts out loading and follows every notification.

use super::observation_service::{Subscription, WeightObservationService};
use dripwatch_types::{ObservationState, WeightReading};
use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

pub struct ObservationBinding {
    service: WeightObservationService,
    receiver: watch::Receiver<ObservationState>,
    subscription: Option<Subscription>,
}

impl ObservationBinding {
    /// Subscribe to `service` and start tracking its observations
    ///
    /// Binding to a service that is already polling triggers a fetch, so the
    /// new consumer leaves the loading state without waiting for the next tick.
    pub fn bind(service: &WeightObservationService) -> Self {
        let (sender, receiver) = watch::channel(ObservationState::default());
        let subscription = service.subscribe_fresh(move |observation| {
            sender.send_modify(|state| state.apply(observation));
        });
        debug!("Bound observation consumer {:?}", subscription.id());

        Self {
            service: service.clone(),
            receiver,
            subscription: Some(subscription),
        }
    }

    /// Current state (cloned)
    pub fn state(&self) -> ObservationState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state change
    ///
    /// Returns `None` once the binding can no longer change, i.e. after
    /// [`unbind`](Self::unbind).
    pub async fn changed(&mut self) -> Option<ObservationState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Ask the service for an immediate fetch
    pub fn refresh(&self) {
        self.service.fetch_now();
    }

    /// Last successful reading known to the service, even from before this
    /// binding existed
    pub fn last_known(&self) -> Option<Arc<WeightReading>> {
        self.service.last_observation()
    }

    pub fn is_bound(&self) -> bool {
        self.subscription.is_some()
    }

    /// Release the subscription. Safe to call more than once.
    pub fn unbind(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!("Unbinding observation consumer {:?}", subscription.id());
            subscription.unsubscribe();
        }
    }
}

impl Drop for ObservationBinding {
    fn drop(&mut self) {
        self.unbind();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{reading, ScriptedSensor};
    use dripwatch_types::{Observation, SensorError};
    use std::time::Duration;
    use tokio::time::sleep;

    const INTERVAL: Duration = Duration::from_millis(2000);

    #[tokio::test(start_paused = true)]
    async fn test_state_follows_success_then_failure() {
        let sensor = ScriptedSensor::new(vec![
            reading(0.45),
            Observation::failure(SensorError::Status(500)),
        ]);
        let service = WeightObservationService::new(sensor, INTERVAL).unwrap();

        let binding = ObservationBinding::bind(&service);
        assert_eq!(binding.state(), ObservationState::default());
        assert!(binding.state().loading);

        sleep(Duration::from_millis(10)).await;
        let state = binding.state();
        assert!(!state.loading);
        assert_eq!(state.value.as_ref().map(|r| r.weight), Some(0.45));
        assert_eq!(
            state.value.as_ref().map(|r| r.timestamp.as_str()),
            Some("2025-03-04T10:30:00Z")
        );
        assert_eq!(state.error, None);

        sleep(INTERVAL).await;
        let state = binding.state();
        assert!(!state.loading);
        assert_eq!(state.value, None);
        assert_eq!(state.error.as_deref(), Some("HTTP error! status: 500"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbind_without_notification() {
        let sensor = ScriptedSensor::new(vec![reading(1.0)]);
        let service = WeightObservationService::new(sensor.clone(), INTERVAL).unwrap();

        let mut binding = ObservationBinding::bind(&service);
        assert_eq!(service.subscriber_count(), 1);
        binding.unbind();
        binding.unbind();

        assert!(!binding.is_bound());
        assert_eq!(service.subscriber_count(), 0);
        assert!(!service.is_polling());

        sleep(Duration::from_millis(10)).await;
        assert_eq!(sensor.fetch_count(), 0);
        assert!(binding.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_unbinds() {
        let sensor = ScriptedSensor::new(vec![reading(1.0)]);
        let service = WeightObservationService::new(sensor, INTERVAL).unwrap();

        let first = ObservationBinding::bind(&service);
        let second = ObservationBinding::bind(&service);
        assert_eq!(service.subscriber_count(), 2);

        drop(first);
        assert_eq!(service.subscriber_count(), 1);
        assert!(service.is_polling());

        drop(second);
        assert!(!service.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_binding_settles_before_next_tick() {
        let sensor = ScriptedSensor::new(vec![reading(0.45)]);
        let service = WeightObservationService::new(sensor.clone(), Duration::from_secs(60)).unwrap();

        let first = ObservationBinding::bind(&service);
        sleep(Duration::from_millis(10)).await;
        assert!(!first.state().loading);

        let second = ObservationBinding::bind(&service);
        assert!(second.state().loading);
        sleep(Duration::from_millis(10)).await;

        let state = second.state();
        assert!(!state.loading);
        assert_eq!(state.value.map(|r| r.weight), Some(0.45));
        assert_eq!(sensor.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bindings_created_together_share_eager_fetch() {
        let sensor = ScriptedSensor::new(vec![reading(0.45)]);
        let service = WeightObservationService::new(sensor.clone(), INTERVAL).unwrap();

        let first = ObservationBinding::bind(&service);
        let second = ObservationBinding::bind(&service);
        sleep(Duration::from_millis(10)).await;

        assert!(!first.state().loading);
        assert!(!second.state().loading);
        assert_eq!(sensor.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_yields_updates() {
        let sensor = ScriptedSensor::new(vec![reading(0.2), reading(0.1)]);
        let service = WeightObservationService::new(sensor, INTERVAL).unwrap();
        let mut binding = ObservationBinding::bind(&service);

        let first = binding.changed().await.unwrap();
        assert_eq!(first.value.map(|r| r.weight), Some(0.2));

        let second = binding.changed().await.unwrap();
        assert_eq!(second.value.map(|r| r.weight), Some(0.1));

        binding.unbind();
        assert!(binding.changed().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_and_last_known_across_churn() {
        let sensor = ScriptedSensor::new(vec![reading(0.45), reading(0.44)]);
        let service = WeightObservationService::new(sensor.clone(), INTERVAL).unwrap();

        let mut patient = ObservationBinding::bind(&service);
        sleep(Duration::from_millis(10)).await;
        patient.unbind();
        assert!(!service.is_polling());

        let staff = ObservationBinding::bind(&service);
        assert!(staff.state().loading);
        assert_eq!(staff.last_known().map(|r| r.weight), Some(0.45));

        sleep(Duration::from_millis(10)).await;
        staff.refresh();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(sensor.fetch_count(), 3);
        assert_eq!(staff.state().value.map(|r| r.weight), Some(0.44));
    }
}
