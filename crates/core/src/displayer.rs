//! Displayer trait and related types

use dripwatch_types::ObservationState;

/// Trait for all displayers
///
/// Displayers turn the observation state exposed by a binding into
/// something a person can read. Each displayer owns its own interpretation
/// of the raw weight; nothing upstream knows about percentages or thresholds.
pub trait Displayer: Send + Sync {
    /// Unique identifier for this displayer instance
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Update the displayer with the latest state
    fn update_data(&mut self, state: &ObservationState);

    /// Render the current state as a single line
    fn render(&self) -> String;

    /// Check if the displayer needs to be redrawn
    fn needs_redraw(&self) -> bool {
        true
    }

    /// Called after the current state has been drawn
    fn mark_drawn(&mut self) {}
}

/// Type-erased displayer for dynamic dispatch
pub type BoxedDisplayer = Box<dyn Displayer>;
