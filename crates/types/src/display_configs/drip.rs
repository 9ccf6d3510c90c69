//! Drip view configuration types

use serde::{Deserialize, Serialize};

/// Maps a raw weight onto a remaining-percentage scale
///
/// `remaining = clamp(0, max_percent, weight / reference_volume * 100)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DripScaling {
    /// Weight that corresponds to 100%
    pub reference_volume: f64,
    /// Upper clamp for the computed percentage
    #[serde(default = "default_max_percent")]
    pub max_percent: f64,
}

fn default_max_percent() -> f64 {
    100.0
}

impl Default for DripScaling {
    fn default() -> Self {
        Self {
            reference_volume: 1.0,
            max_percent: default_max_percent(),
        }
    }
}

/// Status bands, both bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DripThresholds {
    /// At or below this percentage the drip is critical
    pub critical: f64,
    /// At or below this percentage (and above critical) the drip needs attention
    pub warning: f64,
}

impl Default for DripThresholds {
    fn default() -> Self {
        Self {
            critical: 10.0,
            warning: 50.0,
        }
    }
}

fn default_unit_label() -> String {
    "%".to_string()
}

/// Configuration of one dashboard view over the weight feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DripViewConfig {
    /// Stable identifier (e.g. "patient", "staff")
    pub id: String,
    /// Heading printed in front of the rendered line
    pub title: String,
    #[serde(default)]
    pub scaling: DripScaling,
    #[serde(default)]
    pub thresholds: DripThresholds,
    /// Suffix printed after the remaining value
    #[serde(default = "default_unit_label")]
    pub unit_label: String,
}

impl DripViewConfig {
    /// Patient portal: weight * 1000 capped at 500, critical at 200
    pub fn patient() -> Self {
        Self {
            id: "patient".to_string(),
            title: "Patient Drip".to_string(),
            scaling: DripScaling {
                reference_volume: 0.1,
                max_percent: 500.0,
            },
            thresholds: DripThresholds {
                critical: 200.0,
                warning: 300.0,
            },
            unit_label: "ml".to_string(),
        }
    }

    /// Staff overview: weight * 1000 capped at 500, critical at 10
    pub fn staff() -> Self {
        Self {
            id: "staff".to_string(),
            title: "Staff Overview".to_string(),
            scaling: DripScaling {
                reference_volume: 0.1,
                max_percent: 500.0,
            },
            thresholds: DripThresholds::default(),
            unit_label: "ml".to_string(),
        }
    }

    /// Drip management: percentage of a 1 L bag
    pub fn drip_management() -> Self {
        Self {
            id: "drip_management".to_string(),
            title: "Drip Management (1000 ml)".to_string(),
            scaling: DripScaling::default(),
            thresholds: DripThresholds::default(),
            unit_label: default_unit_label(),
        }
    }

    /// The three views shipped by default
    pub fn defaults() -> Vec<Self> {
        vec![Self::patient(), Self::staff(), Self::drip_management()]
    }
}
