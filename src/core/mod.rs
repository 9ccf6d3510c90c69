//! Weight observation service and consumer bindings

mod observation_binding;
mod observation_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use observation_binding::ObservationBinding;
pub use observation_service::{
    ObservationCallback, Subscription, SubscriptionId, WeightObservationService,
};
