//! Render events published by the widget engine.
//!
//! Rendering adapters (a DOM bridge, a terminal UI, a test harness) subscribe
//! to the broadcast channel and redraw from these events. The engine never
//! calls into a concrete UI.

use serde::Serialize;
use tokio::sync::broadcast;

use campus_core::types::{CategoryTopic, ContextPanel, Sender};

use crate::category::DropdownView;

const EVENT_CAPACITY: usize = 256;

/// Every visible state change of the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetEvent {
    Opened,
    Closed,
    ExpandedChanged {
        expanded: bool,
    },
    QuickActionsToggled {
        visible: bool,
    },
    /// A message was appended. `html` is the initial body: the full formatted
    /// text for user messages, empty for bot messages that will be revealed.
    MessageAppended {
        id: u64,
        sender: Sender,
        html: String,
        time: String,
    },
    /// A new snapshot of a revealing bot message. Adapters replace the body
    /// and scroll to the latest content.
    RevealFrame {
        id: u64,
        html: String,
        done: bool,
    },
    TypingChanged {
        visible: bool,
    },
    TranscriptCleared,
    PanelShown {
        panel: ContextPanel,
    },
    PanelHidden {
        panel: ContextPanel,
        reset: bool,
    },
    DropdownChanged {
        topic: CategoryTopic,
        view: DropdownView,
    },
    HelpFormChanged {
        visible: bool,
    },
    ComposeChanged {
        text: String,
    },
    RecordingChanged {
        recording: bool,
    },
}

impl WidgetEvent {
    /// Returns a short event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            WidgetEvent::Opened => "opened",
            WidgetEvent::Closed => "closed",
            WidgetEvent::ExpandedChanged { .. } => "expanded_changed",
            WidgetEvent::QuickActionsToggled { .. } => "quick_actions_toggled",
            WidgetEvent::MessageAppended { .. } => "message_appended",
            WidgetEvent::RevealFrame { .. } => "reveal_frame",
            WidgetEvent::TypingChanged { .. } => "typing_changed",
            WidgetEvent::TranscriptCleared => "transcript_cleared",
            WidgetEvent::PanelShown { .. } => "panel_shown",
            WidgetEvent::PanelHidden { .. } => "panel_hidden",
            WidgetEvent::DropdownChanged { .. } => "dropdown_changed",
            WidgetEvent::HelpFormChanged { .. } => "help_form_changed",
            WidgetEvent::ComposeChanged { .. } => "compose_changed",
            WidgetEvent::RecordingChanged { .. } => "recording_changed",
        }
    }
}

/// Cloneable publisher side of the render-event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<WidgetEvent>,
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: WidgetEvent) {
        tracing::trace!(event = event.event_name(), "Widget event");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let sink = EventSink::new();
        sink.publish(WidgetEvent::Opened);
    }

    #[test]
    fn test_subscriber_receives_in_order() {
        let sink = EventSink::new();
        let mut rx = sink.subscribe();
        sink.publish(WidgetEvent::Opened);
        sink.publish(WidgetEvent::TypingChanged { visible: true });
        assert_eq!(rx.try_recv().unwrap(), WidgetEvent::Opened);
        assert_eq!(
            rx.try_recv().unwrap(),
            WidgetEvent::TypingChanged { visible: true }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_channel() {
        let sink = EventSink::new();
        let mut rx = sink.subscribe();
        sink.clone().publish(WidgetEvent::Closed);
        assert_eq!(rx.try_recv().unwrap(), WidgetEvent::Closed);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(WidgetEvent::PanelHidden {
            panel: ContextPanel::Admission,
            reset: true,
        })
        .unwrap();
        assert_eq!(json["type"], "panel_hidden");
        assert_eq!(json["panel"], "admission");
        assert_eq!(json["reset"], true);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(WidgetEvent::TranscriptCleared.event_name(), "transcript_cleared");
        assert_eq!(
            WidgetEvent::RecordingChanged { recording: false }.event_name(),
            "recording_changed"
        );
    }
}
