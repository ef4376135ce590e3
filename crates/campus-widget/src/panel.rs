//! Contextual panel state machine.
//!
//! At most one of the fees, admission, and scholarship panels is visible:
//! - None -> X (show X)
//! - X -> Y (soft-hide X, keeping its selection, then show Y)
//! - X -> None (hide X, optionally resetting its selection)
//!
//! The help-ticket form is tracked separately and may sit next to any panel.
//! Every mutation returns the render events it implies; the caller publishes
//! them.

use std::collections::HashMap;

use campus_core::types::ContextPanel;

use crate::events::WidgetEvent;

#[derive(Debug, Default)]
pub struct PanelController {
    active: Option<ContextPanel>,
    selections: HashMap<ContextPanel, String>,
    help_form_visible: bool,
    admission_prompted: bool,
}

impl PanelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ContextPanel> {
        self.active
    }

    pub fn is_visible(&self, panel: ContextPanel) -> bool {
        self.active == Some(panel)
    }

    /// Show `panel`, soft-hiding whichever panel was visible before.
    ///
    /// Showing admission marks it as prompted.
    pub fn show(&mut self, panel: ContextPanel) -> Vec<WidgetEvent> {
        if panel == ContextPanel::Admission {
            self.admission_prompted = true;
        }
        if self.active == Some(panel) {
            return Vec::new();
        }

        let mut events = Vec::with_capacity(2);
        if let Some(previous) = self.active.replace(panel) {
            events.push(WidgetEvent::PanelHidden {
                panel: previous,
                reset: false,
            });
        }
        tracing::debug!(panel = %panel, "Panel shown");
        events.push(WidgetEvent::PanelShown { panel });
        events
    }

    /// Show the admission panel. The flag is true only the first time since
    /// the last reset, which is when the instructional message should appear.
    pub fn prompt_admission(&mut self) -> (Vec<WidgetEvent>, bool) {
        let first = !self.admission_prompted;
        (self.show(ContextPanel::Admission), first)
    }

    /// Hide `panel`. With `reset`, its selection is cleared as well and, for
    /// admission, the prompted flag is dropped.
    pub fn hide(&mut self, panel: ContextPanel, reset: bool) -> Vec<WidgetEvent> {
        let was_visible = self.active == Some(panel);
        if was_visible {
            self.active = None;
        }

        let mut cleared = false;
        if reset {
            cleared = self.selections.remove(&panel).is_some();
            if panel == ContextPanel::Admission {
                self.admission_prompted = false;
            }
        }

        if was_visible || cleared {
            tracing::debug!(panel = %panel, reset, "Panel hidden");
            vec![WidgetEvent::PanelHidden { panel, reset }]
        } else {
            Vec::new()
        }
    }

    /// Hide all three panels.
    pub fn hide_all(&mut self, reset: bool) -> Vec<WidgetEvent> {
        ContextPanel::ALL
            .into_iter()
            .flat_map(|panel| self.hide(panel, reset))
            .collect()
    }

    /// Record the dropdown value chosen in `panel`. Blank values clear it.
    ///
    /// Returns the trimmed value when there is something to look up.
    pub fn select(&mut self, panel: ContextPanel, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            self.selections.remove(&panel);
            return None;
        }
        self.selections.insert(panel, value.to_string());
        Some(value.to_string())
    }

    pub fn selection(&self, panel: ContextPanel) -> Option<&str> {
        self.selections.get(&panel).map(String::as_str)
    }

    pub fn admission_prompted(&self) -> bool {
        self.admission_prompted
    }

    // ---- Help form ----

    pub fn show_help(&mut self) -> Vec<WidgetEvent> {
        self.set_help(true)
    }

    pub fn hide_help(&mut self) -> Vec<WidgetEvent> {
        self.set_help(false)
    }

    fn set_help(&mut self, visible: bool) -> Vec<WidgetEvent> {
        if self.help_form_visible == visible {
            return Vec::new();
        }
        self.help_form_visible = visible;
        vec![WidgetEvent::HelpFormChanged { visible }]
    }

    pub fn is_help_visible(&self) -> bool {
        self.help_form_visible
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_nothing_visible() {
        let pc = PanelController::new();
        assert_eq!(pc.active(), None);
        assert!(!pc.is_help_visible());
        assert!(!pc.admission_prompted());
    }

    #[test]
    fn test_show_is_exclusive() {
        let mut pc = PanelController::new();
        pc.show(ContextPanel::Fees);
        let events = pc.show(ContextPanel::Scholarship);
        assert_eq!(
            events,
            vec![
                WidgetEvent::PanelHidden {
                    panel: ContextPanel::Fees,
                    reset: false
                },
                WidgetEvent::PanelShown {
                    panel: ContextPanel::Scholarship
                },
            ]
        );
        assert!(pc.is_visible(ContextPanel::Scholarship));
        assert!(!pc.is_visible(ContextPanel::Fees));
    }

    #[test]
    fn test_reshow_is_silent() {
        let mut pc = PanelController::new();
        pc.show(ContextPanel::Fees);
        assert!(pc.show(ContextPanel::Fees).is_empty());
    }

    #[test]
    fn test_switching_keeps_selection() {
        let mut pc = PanelController::new();
        pc.show(ContextPanel::Admission);
        pc.select(ContextPanel::Admission, "first-year");
        pc.show(ContextPanel::Fees);
        assert_eq!(pc.selection(ContextPanel::Admission), Some("first-year"));
    }

    #[test]
    fn test_reset_hide_clears_selection() {
        let mut pc = PanelController::new();
        pc.show(ContextPanel::Admission);
        pc.select(ContextPanel::Admission, "management");
        let events = pc.hide(ContextPanel::Admission, true);
        assert_eq!(
            events,
            vec![WidgetEvent::PanelHidden {
                panel: ContextPanel::Admission,
                reset: true
            }]
        );
        assert_eq!(pc.selection(ContextPanel::Admission), None);
        assert_eq!(pc.active(), None);
    }

    #[test]
    fn test_soft_hide_keeps_selection() {
        let mut pc = PanelController::new();
        pc.show(ContextPanel::Fees);
        pc.select(ContextPanel::Fees, "open");
        pc.hide(ContextPanel::Fees, false);
        assert_eq!(pc.selection(ContextPanel::Fees), Some("open"));
    }

    #[test]
    fn test_hide_hidden_panel_without_selection_is_silent() {
        let mut pc = PanelController::new();
        assert!(pc.hide(ContextPanel::Scholarship, true).is_empty());
        assert!(pc.hide_all(true).is_empty());
    }

    #[test]
    fn test_reset_hide_of_hidden_panel_still_clears() {
        let mut pc = PanelController::new();
        pc.select(ContextPanel::Fees, "sc");
        pc.show(ContextPanel::Admission);
        let events = pc.hide_all(true);
        assert_eq!(events.len(), 2);
        assert_eq!(pc.selection(ContextPanel::Fees), None);
    }

    #[test]
    fn test_admission_prompted_once() {
        let mut pc = PanelController::new();
        let (events, first) = pc.prompt_admission();
        assert!(first);
        assert_eq!(events.len(), 1);

        let (events, first) = pc.prompt_admission();
        assert!(!first);
        assert!(events.is_empty());

        // Switching away and back keeps the flag.
        pc.show(ContextPanel::Fees);
        assert!(!pc.prompt_admission().1);
    }

    #[test]
    fn test_reset_clears_admission_prompt() {
        let mut pc = PanelController::new();
        pc.prompt_admission();
        pc.hide(ContextPanel::Admission, true);
        assert!(!pc.admission_prompted());
        assert!(pc.prompt_admission().1);
    }

    #[test]
    fn test_blank_selection_clears() {
        let mut pc = PanelController::new();
        assert_eq!(pc.select(ContextPanel::Fees, " open "), Some("open".into()));
        assert_eq!(pc.select(ContextPanel::Fees, "  "), None);
        assert_eq!(pc.selection(ContextPanel::Fees), None);
    }

    // ---- Help form ----

    #[test]
    fn test_help_form_independent_of_panels() {
        let mut pc = PanelController::new();
        pc.show(ContextPanel::Fees);
        assert_eq!(
            pc.show_help(),
            vec![WidgetEvent::HelpFormChanged { visible: true }]
        );
        assert!(pc.is_visible(ContextPanel::Fees));
        assert!(pc.show_help().is_empty());

        pc.hide_all(true);
        assert!(pc.is_help_visible());
        assert_eq!(pc.hide_help().len(), 1);
    }
}
