//! Console dashboard
//!
//! Pairs every configured view with its own observation binding. The views
//! are independent consumers of the same service; each one decides how to
//! present the raw weight.

use crate::core::{ObservationBinding, WeightObservationService};
use dripwatch_core::BoxedDisplayer;
use futures::future::select_all;

struct DashboardPanel {
    binding: ObservationBinding,
    view: BoxedDisplayer,
}

pub struct Dashboard {
    panels: Vec<DashboardPanel>,
}

impl Dashboard {
    /// Bind one consumer per view
    pub fn new(service: &WeightObservationService, views: Vec<BoxedDisplayer>) -> Self {
        let panels = views
            .into_iter()
            .map(|view| DashboardPanel {
                binding: ObservationBinding::bind(service),
                view,
            })
            .collect();
        Self { panels }
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Wait until any panel's state changes
    ///
    /// Returns `false` when there is nothing left to wait for.
    pub async fn next_change(&mut self) -> bool {
        if self.panels.is_empty() {
            return false;
        }

        let waits = self
            .panels
            .iter_mut()
            .map(|panel| Box::pin(panel.binding.changed()));
        let (changed, _, _) = select_all(waits).await;
        changed.is_some()
    }

    /// Pull the latest state into every view and render the ones that changed
    pub fn render_changed(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for panel in &mut self.panels {
            panel.view.update_data(&panel.binding.state());
            if panel.view.needs_redraw() {
                lines.push(panel.view.render());
                panel.view.mark_drawn();
            }
        }
        lines
    }

    /// True once every panel has received at least one notification
    pub fn all_settled(&self) -> bool {
        self.panels.iter().all(|panel| !panel.binding.state().loading)
    }

    /// Manual refresh, as offered by the staff dashboard
    pub fn refresh(&self) {
        if let Some(panel) = self.panels.first() {
            panel.binding.refresh();
        }
    }

    /// Unbind every panel
    pub fn close(&mut self) {
        for panel in &mut self.panels {
            panel.binding.unbind();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{reading, ScriptedSensor};
    use dripwatch_types::display_configs::DripViewConfig;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_renders_each_view() {
        let sensor = ScriptedSensor::new(vec![reading(0.45)]);
        let service = WeightObservationService::new(sensor.clone(), Duration::from_millis(2000)).unwrap();
        let mut dashboard = Dashboard::new(
            &service,
            dripwatch_displayers::create_views(&DripViewConfig::defaults()),
        );
        assert_eq!(dashboard.panel_count(), 3);
        assert_eq!(service.subscriber_count(), 3);

        let initial = dashboard.render_changed();
        assert_eq!(initial.len(), 3);
        assert!(initial.iter().all(|line| line.ends_with("Loading...")));
        assert!(!dashboard.all_settled());

        assert!(dashboard.next_change().await);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(dashboard.all_settled());
        assert_eq!(sensor.fetch_count(), 1);

        let lines = dashboard.render_changed();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Patient Drip: 450.0ml remaining [Normal]"));
        assert!(lines[1].starts_with("Staff Overview: 450.0ml remaining [Normal]"));
        assert!(lines[2].contains("45.0% remaining [Warning]"));
        assert!(dashboard.render_changed().is_empty());

        dashboard.refresh();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sensor.fetch_count(), 2);

        dashboard.close();
        assert!(!service.is_polling());
        assert_eq!(service.subscriber_count(), 0);
    }
}
