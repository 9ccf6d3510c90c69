//! Weight observation service - one poller, many subscribers
//!
//! The service owns the only poll task against the weight sensor. Consumers
//! subscribe with a callback; the first subscriber starts the poll session
//! (with an immediate fetch), the last one to leave stops it. Every fetch
//! result, success or failure, is fanned out to all current subscribers.
//!
//! Sessions that stop and start again reuse the same task, so tick fetches
//! stay sequential even under heavy subscriber churn.
//!
//! The last successful reading is cached for the lifetime of the service and
//! survives subscriber churn.

use anyhow::{bail, Result};
use arc_swap::ArcSwapOption;
use dripwatch_core::{SensorMetadata, SharedSensorClient};
use dripwatch_types::{Observation, WeightReading};
use log::{debug, error, info, trace, warn};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

/// Callback invoked with every observation
pub type ObservationCallback = Arc<dyn Fn(&Observation) + Send + Sync>;

/// Stable token identifying one registration; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Why a fetch was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchCause {
    Tick,
    Manual,
}

struct ServiceState {
    subscribers: BTreeMap<SubscriptionId, ObservationCallback>,
    next_id: u64,
    /// Generation of the running session, `None` while stopped
    session: Option<u64>,
    generation: u64,
    /// The running session has not issued its first fetch yet
    eager_pending: bool,
    poll_task_alive: bool,
}

struct ServiceInner {
    client: SharedSensorClient,
    poll_interval: Duration,
    runtime: Handle,
    state: Mutex<ServiceState>,
    /// Wakes the poll task when a session starts or stops
    wake: Arc<Notify>,
    /// Last successful reading (lock-free reads)
    last_observation: ArcSwapOption<WeightReading>,
    manual_in_flight: AtomicBool,
    active_poll_tasks: Arc<AtomicUsize>,
}

impl ServiceInner {
    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        // A panicking subscriber never runs under this lock, but recover anyway
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Observation service state mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Begin a new session, reusing the poll task if one is still alive
    fn start_session(self: &Arc<Self>, state: &mut ServiceState) {
        state.generation += 1;
        state.session = Some(state.generation);
        state.eager_pending = true;

        if state.poll_task_alive {
            // The task picks the new session up once any in-flight fetch is done
            self.wake.notify_one();
            info!("Resumed weight poll session (interval: {:?})", self.poll_interval);
            return;
        }

        state.poll_task_alive = true;
        let weak = Arc::downgrade(self);
        let wake = Arc::clone(&self.wake);
        let interval = self.poll_interval;
        let counter = Arc::clone(&self.active_poll_tasks);

        counter.fetch_add(1, Ordering::SeqCst);
        self.runtime.spawn(async move {
            let _guard = TaskGuard(counter);
            poll_loop(weak, wake, interval).await;
        });

        info!("Started weight poll session (interval: {:?})", self.poll_interval);
    }

    /// End the running session. Returns false if none was running.
    fn stop_session(&self, state: &mut ServiceState) -> bool {
        if state.session.take().is_none() {
            return false;
        }
        state.eager_pending = false;
        self.wake.notify_one();
        true
    }

    fn remove_subscriber(&self, id: SubscriptionId) {
        let mut state = self.lock_state();
        if state.subscribers.remove(&id).is_none() {
            return;
        }
        debug!(
            "Removed subscriber {:?} ({} remaining)",
            id,
            state.subscribers.len()
        );

        if state.subscribers.is_empty() && self.stop_session(&mut state) {
            info!("Last subscriber left, stopped weight poll session");
        }
    }

    async fn fetch_and_notify(&self, cause: FetchCause) {
        trace!("Fetching weight ({:?})", cause);
        let observation = self.client.fetch_reading().await;

        match &observation {
            Observation::Reading(reading) => {
                debug!("Weight reading {} at {}", reading.weight, reading.timestamp);
                self.last_observation.store(Some(Arc::new(reading.clone())));
            }
            Observation::Failure(failure) => {
                warn!("Weight fetch failed ({:?}): {}", cause, failure.error);
            }
        }

        self.notify(&observation);
    }

    /// Deliver one observation to a snapshot of the current subscribers
    fn notify(&self, observation: &Observation) {
        let snapshot: Vec<(SubscriptionId, ObservationCallback)> = {
            let state = self.lock_state();
            state
                .subscribers
                .iter()
                .map(|(id, callback)| (*id, Arc::clone(callback)))
                .collect()
        };

        if snapshot.is_empty() {
            debug!("No subscribers, discarding observation");
            return;
        }

        for (id, callback) in snapshot {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(observation))) {
                error!(
                    "Subscriber {:?} panicked during notification: {}",
                    id,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        // Let an idle poll task notice the service is gone
        self.wake.notify_one();
    }
}

/// Decrements the live poll task count when the task ends
struct TaskGuard(Arc<AtomicUsize>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The service's poll task
///
/// Runs one session after another and exits once no session is running. Each
/// session gets a fresh interval whose first tick completes immediately, which
/// is the eager fetch. Fetches run inline, so a slow sensor delays the loop
/// instead of stacking requests; ticks missed meanwhile are skipped.
async fn poll_loop(service: Weak<ServiceInner>, wake: Arc<Notify>, interval: Duration) {
    'sessions: loop {
        let generation = {
            let Some(inner) = service.upgrade() else {
                break;
            };
            let mut state = inner.lock_state();
            let Some(generation) = state.session else {
                state.poll_task_alive = false;
                break;
            };
            generation
        };

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let woken = tokio::select! {
                biased;
                _ = wake.notified() => true,
                _ = ticker.tick() => false,
            };

            let Some(inner) = service.upgrade() else {
                break 'sessions;
            };
            {
                let mut state = inner.lock_state();
                if state.session != Some(generation) {
                    continue 'sessions;
                }
                if woken {
                    continue;
                }
                state.eager_pending = false;
            }
            inner.fetch_and_notify(FetchCause::Tick).await;
        }
    }

    debug!("Weight poll task exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Single authoritative poller for the weight sensor
///
/// Construct one per process and hand clones to consumers; clones share the
/// same session, registry and cache.
#[derive(Clone)]
pub struct WeightObservationService {
    inner: Arc<ServiceInner>,
}

impl WeightObservationService {
    /// Create a stopped service polling `client` every `poll_interval`
    ///
    /// Must be called from within a tokio runtime; the poll task is spawned on
    /// that runtime.
    pub fn new(client: SharedSensorClient, poll_interval: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            bail!("Poll interval must be greater than zero");
        }
        let runtime = Handle::try_current()
            .map_err(|e| anyhow::anyhow!("Observation service needs a tokio runtime: {}", e))?;

        Ok(Self {
            inner: Arc::new(ServiceInner {
                client,
                poll_interval,
                runtime,
                state: Mutex::new(ServiceState {
                    subscribers: BTreeMap::new(),
                    next_id: 0,
                    session: None,
                    generation: 0,
                    eager_pending: false,
                    poll_task_alive: false,
                }),
                wake: Arc::new(Notify::new()),
                last_observation: ArcSwapOption::empty(),
                manual_in_flight: AtomicBool::new(false),
                active_poll_tasks: Arc::new(AtomicUsize::new(0)),
            }),
        })
    }

    /// Register a callback for every future observation
    ///
    /// The first active subscriber starts the poll session, which fetches
    /// immediately instead of waiting a full interval. Later subscribers wait
    /// for the next tick; see [`subscribe_fresh`](Self::subscribe_fresh).
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Observation) + Send + Sync + 'static,
    {
        self.register(Arc::new(callback)).0
    }

    /// Like [`subscribe`](Self::subscribe), but a subscriber joining a running
    /// session also gets a prompt observation
    ///
    /// Triggers a manual fetch unless the session's eager fetch has not been
    /// issued yet, in which case that fetch reaches the new subscriber too.
    pub fn subscribe_fresh<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Observation) + Send + Sync + 'static,
    {
        let (subscription, joined_running) = self.register(Arc::new(callback));
        if joined_running {
            debug!("Subscriber {:?} joined a running session, fetching now", subscription.id);
            self.fetch_now();
        }
        subscription
    }

    /// Insert a callback; also reports whether it joined a session whose
    /// eager fetch is already done
    fn register(&self, callback: ObservationCallback) -> (Subscription, bool) {
        let mut state = self.inner.lock_state();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.subscribers.insert(id, callback);
        debug!("Added subscriber {:?} ({} total)", id, state.subscribers.len());

        let joined_running = if state.session.is_none() {
            self.inner.start_session(&mut state);
            false
        } else {
            !state.eager_pending
        };

        let subscription = Subscription {
            id,
            service: Arc::downgrade(&self.inner),
            active: AtomicBool::new(true),
        };
        (subscription, joined_running)
    }

    /// Fetch once, outside the regular cadence, and notify all subscribers
    ///
    /// Does not touch the poll schedule and works whether or not a session is
    /// running. While a manual fetch is still in flight further requests are
    /// coalesced into it.
    pub fn fetch_now(&self) {
        if self.inner.manual_in_flight.swap(true, Ordering::AcqRel) {
            debug!("Manual fetch already in flight, coalescing");
            return;
        }

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            inner.fetch_and_notify(FetchCause::Manual).await;
            inner.manual_in_flight.store(false, Ordering::Release);
        });
    }

    /// Drop every subscriber and stop the poll session
    pub fn shutdown(&self) {
        let mut state = self.inner.lock_state();
        let dropped = state.subscribers.len();
        state.subscribers.clear();
        if self.inner.stop_session(&mut state) {
            info!("Observation service shut down ({} subscribers dropped)", dropped);
        }
    }

    pub fn is_polling(&self) -> bool {
        self.inner.lock_state().session.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock_state().subscribers.len()
    }

    /// Last successful reading, kept across subscriber churn
    pub fn last_observation(&self) -> Option<Arc<WeightReading>> {
        self.inner.last_observation.load_full()
    }

    /// Number of poll tasks still alive, never more than one
    ///
    /// A stopped session's task finishes any in-flight fetch before exiting.
    pub fn active_poll_tasks(&self) -> usize {
        self.inner.active_poll_tasks.load(Ordering::SeqCst)
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    pub fn sensor_metadata(&self) -> &SensorMetadata {
        self.inner.client.metadata()
    }
}

/// Handle returned by [`WeightObservationService::subscribe`]
///
/// Unsubscribing is idempotent and safe after the service is gone. Dropping
/// the handle unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    service: Weak<ServiceInner>,
    active: AtomicBool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop receiving observations
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.service.upgrade() {
            inner.remove_subscriber(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
