//! dripwatch-displayers: Dashboard views for dripwatch.

mod drip;

pub use drip::{remaining_percent, DripMetric, DripStatus, DripView};

use dripwatch_core::BoxedDisplayer;
use dripwatch_types::display_configs::DripViewConfig;

/// Create one displayer per configured view
pub fn create_views(configs: &[DripViewConfig]) -> Vec<BoxedDisplayer> {
    configs
        .iter()
        .cloned()
        .map(|config| Box::new(DripView::new(config)) as BoxedDisplayer)
        .collect()
}
