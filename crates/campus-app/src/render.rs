//! Terminal rendering of widget events.
//!
//! Bot replies are printed once their reveal finishes; user messages are
//! already on screen because the user typed them.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use campus_core::types::Sender;
use campus_widget::format::{format_blocks, Block};
use campus_widget::{ChatWidget, DropdownView, WidgetEvent};

/// Plain-text rendering of a message: paragraphs as lines, list items as
/// indented bullets.
pub fn plain_text(text: &str) -> String {
    let mut lines = Vec::new();
    for block in format_blocks(text) {
        match block {
            Block::Paragraph(p) => lines.push(p),
            Block::List(items) => lines.extend(items.into_iter().map(|i| format!("  • {}", i))),
        }
    }
    lines.join("\n")
}

/// One-line status for events that are not message bodies.
pub fn describe(event: &WidgetEvent) -> Option<String> {
    let line = match event {
        WidgetEvent::Opened => "[panel opened]".to_string(),
        WidgetEvent::Closed => "[panel closed]".to_string(),
        WidgetEvent::ExpandedChanged { expanded } => {
            format!("[layout {}]", if *expanded { "expanded" } else { "collapsed" })
        }
        WidgetEvent::QuickActionsToggled { visible } => {
            format!("[quick actions {}]", if *visible { "shown" } else { "hidden" })
        }
        WidgetEvent::TranscriptCleared => "[conversation cleared]".to_string(),
        WidgetEvent::PanelShown { panel } => format!("[{} panel shown]", panel),
        WidgetEvent::PanelHidden { panel, reset } => {
            if *reset {
                format!("[{} panel closed]", panel)
            } else {
                format!("[{} panel hidden]", panel)
            }
        }
        WidgetEvent::DropdownChanged { topic, view } => match view {
            DropdownView::Ready(options) => {
                let values: Vec<String> = options
                    .iter()
                    .map(|o| format!("{} ({})", o.label, o.value))
                    .collect();
                format!("[{} categories: {}]", topic, values.join(", "))
            }
            other => format!("[{}: {}]", topic, other.placeholder(*topic)),
        },
        WidgetEvent::HelpFormChanged { visible: true } => {
            "[help form open: /ticket name | contact | query [| topic [| pdf path]]]".to_string()
        }
        WidgetEvent::HelpFormChanged { visible: false } => "[help form closed]".to_string(),
        WidgetEvent::ComposeChanged { text } if !text.is_empty() => {
            format!("[heard: {}]", text)
        }
        WidgetEvent::RecordingChanged { recording } => {
            format!("[microphone {}]", if *recording { "on" } else { "off" })
        }
        WidgetEvent::TypingChanged { visible: true } => "…".to_string(),
        _ => return None,
    };
    Some(line)
}

fn print_bot(widget: &ChatWidget, id: u64) -> bool {
    let text = widget
        .snapshot()
        .messages
        .into_iter()
        .find(|m| m.id == id)
        .map(|m| m.text);
    match text {
        Some(text) => {
            println!("bot> {}", plain_text(&text).replace('\n', "\n     "));
            true
        }
        None => false,
    }
}

/// Print events until the channel closes or `shutdown` turns true.
///
/// Events already queued when shutdown is signalled are still printed.
/// Returns the number of lines printed.
pub async fn run(
    widget: Arc<ChatWidget>,
    rx: broadcast::Receiver<WidgetEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    let mut stream = BroadcastStream::new(rx);
    let mut printed = 0;
    loop {
        let item = tokio::select! {
            biased;
            item = stream.next() => item,
            _ = shutdown.wait_for(|stop| *stop) => break,
        };
        let Some(item) = item else { break };
        let event = match item {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Renderer lagged behind widget events");
                continue;
            }
        };
        tracing::trace!(event = event.event_name(), "Widget event");

        match &event {
            WidgetEvent::MessageAppended {
                id,
                sender: Sender::Bot,
                html,
                ..
            } if !html.is_empty() => {
                if print_bot(&widget, *id) {
                    printed += 1;
                }
            }
            WidgetEvent::RevealFrame { id, done: true, .. } => {
                if print_bot(&widget, *id) {
                    printed += 1;
                }
            }
            _ => {
                if let Some(line) = describe(&event) {
                    println!("{}", line);
                    printed += 1;
                }
            }
        }
    }
    printed
}
