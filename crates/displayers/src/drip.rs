//! Drip displayer
//!
//! Converts the raw sensor weight into a remaining percentage and a status
//! band. Every view carries its own scaling, so two views over the same feed
//! can disagree about what "100%" means.

use dripwatch_core::Displayer;
use dripwatch_types::display_configs::{DripScaling, DripThresholds, DripViewConfig};
use dripwatch_types::ObservationState;
use std::fmt;

/// Status band of a drip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DripStatus {
    Normal,
    Warning,
    Critical,
}

impl DripStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DripStatus::Normal => "Normal",
            DripStatus::Warning => "Warning",
            DripStatus::Critical => "Critical",
        }
    }
}

impl fmt::Display for DripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Remaining percentage for a weight under the given scaling
pub fn remaining_percent(weight: f64, scaling: &DripScaling) -> f64 {
    if scaling.reference_volume <= 0.0 {
        return 0.0;
    }
    (weight / scaling.reference_volume * 100.0).clamp(0.0, scaling.max_percent.max(0.0))
}

/// Derived metric for one weight reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DripMetric {
    pub remaining: f64,
    pub status: DripStatus,
}

impl DripMetric {
    pub fn from_weight(weight: f64, scaling: &DripScaling, thresholds: &DripThresholds) -> Self {
        let remaining = remaining_percent(weight, scaling);
        let status = if remaining <= thresholds.critical {
            DripStatus::Critical
        } else if remaining <= thresholds.warning {
            DripStatus::Warning
        } else {
            DripStatus::Normal
        };
        Self { remaining, status }
    }

    pub fn is_critical(&self) -> bool {
        self.status == DripStatus::Critical
    }
}

/// One dashboard view over the weight feed
pub struct DripView {
    config: DripViewConfig,
    state: ObservationState,
    dirty: bool,
}

impl DripView {
    pub fn new(config: DripViewConfig) -> Self {
        Self {
            config,
            state: ObservationState::default(),
            dirty: true,
        }
    }

    pub fn config(&self) -> &DripViewConfig {
        &self.config
    }

    /// Metric for the current reading, if there is one
    pub fn metric(&self) -> Option<DripMetric> {
        self.state.value.as_ref().map(|reading| {
            DripMetric::from_weight(reading.weight, &self.config.scaling, &self.config.thresholds)
        })
    }
}

impl Displayer for DripView {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn name(&self) -> &str {
        &self.config.title
    }

    fn update_data(&mut self, state: &ObservationState) {
        if &self.state != state {
            self.state = state.clone();
            self.dirty = true;
        }
    }

    fn render(&self) -> String {
        let title = &self.config.title;

        if self.state.loading {
            return format!("{}: Loading...", title);
        }

        if let Some(error) = &self.state.error {
            return format!("{}: Error ({})", title, error);
        }

        match (self.state.value.as_ref(), self.metric()) {
            (Some(reading), Some(metric)) => format!(
                "{}: {:.1}{} remaining [{}] (sensor {:.3} at {})",
                title,
                metric.remaining,
                self.config.unit_label,
                metric.status,
                reading.weight,
                reading.timestamp
            ),
            _ => format!("{}: No data", title),
        }
    }

    fn needs_redraw(&self) -> bool {
        self.dirty
    }

    fn mark_drawn(&mut self) {
        self.dirty = false;
    }
}
