//! Append-only transcript and animated reveal of assistant replies.
//!
//! [`Transcript`] is the pure model: entries, per-entry reveal progress, and
//! the typing indicator. [`TranscriptRenderer`] wraps it with the render-event
//! channel and schedules one reveal task per bot message on the tokio timer.
//!
//! Reveal tasks are independent. Two replies appended back to back reveal
//! concurrently; each frame carries a full formatted snapshot of its own
//! message, so interleaving never corrupts a body.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use campus_core::types::{Message, Sender};

use crate::events::{EventSink, WidgetEvent};
use crate::format::{format_message, reveal_tokens};
use crate::lock_or_recover;

/// How assistant replies appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealMode {
    /// Word-by-word, one token per interval.
    Animated(Duration),
    /// Fully rendered on append.
    Immediate,
}

impl RevealMode {
    pub fn from_interval_ms(ms: u64) -> Self {
        if ms == 0 {
            RevealMode::Immediate
        } else {
            RevealMode::Animated(Duration::from_millis(ms))
        }
    }
}

impl Default for RevealMode {
    fn default() -> Self {
        RevealMode::Animated(Duration::from_millis(150))
    }
}

// =============================================================================
// Transcript model
// =============================================================================

#[derive(Debug, Clone)]
struct RevealProgress {
    tokens: Vec<String>,
    shown: usize,
    buffer: String,
}

/// One displayed message plus its current rendered body.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub id: u64,
    pub message: Message,
    /// Current HTML body. Grows frame by frame while revealing.
    pub html: String,
    reveal: Option<RevealProgress>,
}

impl TranscriptEntry {
    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }
}

/// A rendered snapshot of a revealing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealFrame {
    pub id: u64,
    pub html: String,
    pub done: bool,
}

/// Ordered, append-only list of messages.
///
/// Entry ids keep increasing across [`Transcript::clear`], so a reveal task
/// that outlives a clear finds nothing to advance and stops.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
    /// Requests awaiting a response; the indicator shows while non-zero.
    in_flight: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    ///
    /// User messages and token-less bot messages are fully rendered at once;
    /// other bot messages start empty and are filled in by [`advance`].
    ///
    /// [`advance`]: Transcript::advance
    pub fn append(&mut self, text: &str, sender: Sender) -> &TranscriptEntry {
        let id = self.next_id;
        self.next_id += 1;

        let (html, reveal) = match sender {
            Sender::User => (format_message(text), None),
            Sender::Bot => {
                let tokens = reveal_tokens(text);
                if tokens.is_empty() {
                    (format_message(text), None)
                } else {
                    (
                        String::new(),
                        Some(RevealProgress {
                            tokens,
                            shown: 0,
                            buffer: String::new(),
                        }),
                    )
                }
            }
        };

        self.entries.push(TranscriptEntry {
            id,
            message: Message::new(text, sender),
            html,
            reveal,
        });
        &self.entries[self.entries.len() - 1]
    }

    fn entry_mut(&mut self, id: u64) -> Option<&mut TranscriptEntry> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|idx| &mut self.entries[idx])
    }

    /// Reveal one more token of message `id`.
    ///
    /// Returns `None` when the message is gone or already fully shown.
    pub fn advance(&mut self, id: u64) -> Option<RevealFrame> {
        let entry = self.entry_mut(id)?;
        let progress = entry.reveal.as_mut()?;

        progress.buffer.push_str(&progress.tokens[progress.shown]);
        progress.shown += 1;
        let done = progress.shown >= progress.tokens.len();
        entry.html = format_message(&progress.buffer);
        if done {
            entry.reveal = None;
        }

        Some(RevealFrame {
            id,
            html: entry.html.clone(),
            done,
        })
    }

    /// Jump message `id` straight to its final rendering.
    pub fn finish(&mut self, id: u64) -> Option<RevealFrame> {
        let entry = self.entry_mut(id)?;
        entry.reveal.take()?;
        entry.html = format_message(&entry.message.text);
        Some(RevealFrame {
            id,
            html: entry.html.clone(),
            done: true,
        })
    }

    /// Finish every pending reveal, returning the final frames.
    pub fn finish_all(&mut self) -> Vec<RevealFrame> {
        let pending: Vec<u64> = self
            .entries
            .iter()
            .filter(|e| e.is_revealing())
            .map(|e| e.id)
            .collect();
        pending.into_iter().filter_map(|id| self.finish(id)).collect()
    }

    /// Remove every entry and hide the typing indicator. The only way
    /// messages ever leave the transcript.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.in_flight = 0;
        removed
    }

    /// Count a request starting (`true`) or finishing (`false`).
    ///
    /// Returns whether the indicator's visibility changed. A finish with
    /// nothing in flight (after a clear) is ignored.
    pub fn set_typing(&mut self, visible: bool) -> bool {
        let was = self.is_typing();
        if visible {
            self.in_flight += 1;
        } else {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        was != self.is_typing()
    }

    pub fn is_typing(&self) -> bool {
        self.in_flight > 0
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Handle to a scheduled reveal. Dropping it does not cancel the task.
#[derive(Debug)]
pub struct RevealHandle {
    pub id: u64,
    task: JoinHandle<()>,
}

impl RevealHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Transcript plus event publishing and reveal scheduling.
#[derive(Debug)]
pub struct TranscriptRenderer {
    transcript: Arc<Mutex<Transcript>>,
    events: EventSink,
    mode: RevealMode,
    reveals: Mutex<Vec<RevealHandle>>,
}

impl TranscriptRenderer {
    pub fn new(events: EventSink, mode: RevealMode) -> Self {
        Self {
            transcript: Arc::new(Mutex::new(Transcript::new())),
            events,
            mode,
            reveals: Mutex::new(Vec::new()),
        }
    }

    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    /// Append a message and start its reveal if it is an animated bot reply.
    pub fn append(&self, text: &str, sender: Sender) -> u64 {
        let (id, html, time, revealing) = {
            let mut transcript = lock_or_recover(&self.transcript);
            let entry = transcript.append(text, sender);
            (
                entry.id,
                entry.html.clone(),
                entry.message.display_time(),
                entry.is_revealing(),
            )
        };

        tracing::debug!(id, sender = %sender, len = text.len(), "Message appended");
        self.events.publish(WidgetEvent::MessageAppended {
            id,
            sender,
            html,
            time,
        });

        if revealing {
            match self.mode {
                RevealMode::Animated(interval) => self.schedule(id, interval),
                RevealMode::Immediate => self.finish_one(id),
            }
        }
        id
    }

    fn schedule(&self, id: u64, interval: Duration) {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::debug!(id, "No async runtime; rendering reply without animation");
            self.finish_one(id);
            return;
        }

        let transcript = Arc::clone(&self.transcript);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                ticker.tick().await;
                let frame = lock_or_recover(&transcript).advance(id);
                let Some(frame) = frame else { break };
                let done = frame.done;
                events.publish(WidgetEvent::RevealFrame {
                    id: frame.id,
                    html: frame.html,
                    done,
                });
                if done {
                    break;
                }
            }
        });

        let mut reveals = lock_or_recover(&self.reveals);
        reveals.retain(|h| !h.is_finished());
        reveals.push(RevealHandle { id, task });
    }

    fn finish_one(&self, id: u64) {
        let frame = lock_or_recover(&self.transcript).finish(id);
        if let Some(frame) = frame {
            self.publish_frame(frame);
        }
    }

    fn publish_frame(&self, frame: RevealFrame) {
        self.events.publish(WidgetEvent::RevealFrame {
            id: frame.id,
            html: frame.html,
            done: frame.done,
        });
    }

    /// Stop every reveal task and render all pending replies in full.
    pub fn finish_reveals(&self) {
        self.cancel_reveals();
        let frames = lock_or_recover(&self.transcript).finish_all();
        for frame in frames {
            self.publish_frame(frame);
        }
    }

    /// Abort reveal tasks, leaving partially revealed bodies as they are.
    pub fn cancel_reveals(&self) {
        let mut reveals = lock_or_recover(&self.reveals);
        for handle in reveals.drain(..) {
            handle.cancel();
        }
    }

    /// Number of reveal tasks still running.
    pub fn active_reveals(&self) -> usize {
        let mut reveals = lock_or_recover(&self.reveals);
        reveals.retain(|h| !h.is_finished());
        reveals.len()
    }

    pub fn show_typing(&self) {
        if lock_or_recover(&self.transcript).set_typing(true) {
            self.events.publish(WidgetEvent::TypingChanged { visible: true });
        }
    }

    pub fn hide_typing(&self) {
        if lock_or_recover(&self.transcript).set_typing(false) {
            self.events.publish(WidgetEvent::TypingChanged { visible: false });
        }
    }

    pub fn is_typing(&self) -> bool {
        lock_or_recover(&self.transcript).is_typing()
    }

    /// Empty the transcript. Pending reveals stop on their next tick.
    pub fn clear(&self) {
        self.cancel_reveals();
        let (removed, was_typing) = {
            let mut transcript = lock_or_recover(&self.transcript);
            let was_typing = transcript.is_typing();
            (transcript.clear(), was_typing)
        };
        tracing::debug!(removed, "Transcript cleared");
        if was_typing {
            self.events.publish(WidgetEvent::TypingChanged { visible: false });
        }
        self.events.publish(WidgetEvent::TranscriptCleared);
    }

    /// Run `f` against the transcript model.
    pub fn with_transcript<R>(&self, f: impl FnOnce(&Transcript) -> R) -> R {
        f(&lock_or_recover(&self.transcript))
    }
}

// =============================================================================
// Tests
// =============================================================================
