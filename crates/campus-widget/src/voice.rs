//! Optional microphone-to-text bridge.
//!
//! The host injects a [`SpeechRecognizer`] when speech recognition exists and
//! forwards its callbacks as [`VoiceEvent`]s. Without a recognizer every
//! toggle reports that voice input is unsupported.

use std::sync::Arc;

use crate::error::WidgetError;

pub const UNSUPPORTED_MESSAGE: &str =
    "Voice input is not supported here. Please use a browser with speech recognition, such as Chrome or Edge.";
pub const NO_SPEECH_MESSAGE: &str = "No speech detected. Please try again.";
pub const NOT_ALLOWED_MESSAGE: &str =
    "Microphone permission denied. Please enable microphone access.";

/// Host speech-recognition capability.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin listening. Results arrive later as [`VoiceEvent`]s.
    fn start(&self, language: &str) -> Result<(), WidgetError>;

    /// Stop listening. The recognizer still reports [`VoiceEvent::Ended`].
    fn stop(&self);
}

/// Recognition failure categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceErrorKind {
    NoSpeech,
    NotAllowed,
    Other(String),
}

impl VoiceErrorKind {
    /// Map a recognizer error code such as `no-speech` or `not-allowed`.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "no-speech" => VoiceErrorKind::NoSpeech,
            "not-allowed" | "service-not-allowed" => VoiceErrorKind::NotAllowed,
            other => VoiceErrorKind::Other(other.to_string()),
        }
    }

    /// Message shown to the user. Other errors are only logged.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            VoiceErrorKind::NoSpeech => Some(NO_SPEECH_MESSAGE),
            VoiceErrorKind::NotAllowed => Some(NOT_ALLOWED_MESSAGE),
            VoiceErrorKind::Other(_) => None,
        }
    }
}

/// Recognizer callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Started,
    Result(String),
    Error(VoiceErrorKind),
    Ended,
}

/// Result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Unsupported,
    Started,
    Stopped,
    StartFailed(String),
}

/// What a recognizer event means for the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEffect {
    RecordingChanged(bool),
    /// Replace the compose text. Never sent automatically.
    Transcribed(String),
    Notify(&'static str),
}

/// Recording state around an optional recognizer.
pub struct VoiceCapture {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    language: String,
    recording: bool,
}

impl std::fmt::Debug for VoiceCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCapture")
            .field("available", &self.recognizer.is_some())
            .field("language", &self.language)
            .field("recording", &self.recording)
            .finish()
    }
}

impl VoiceCapture {
    pub fn new(recognizer: Option<Arc<dyn SpeechRecognizer>>, language: impl Into<String>) -> Self {
        Self {
            recognizer,
            language: language.into(),
            recording: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Start or stop recognition.
    pub fn toggle(&mut self) -> ToggleOutcome {
        let Some(recognizer) = &self.recognizer else {
            return ToggleOutcome::Unsupported;
        };

        if self.recording {
            recognizer.stop();
            return ToggleOutcome::Stopped;
        }

        match recognizer.start(&self.language) {
            Ok(()) => {
                self.recording = true;
                tracing::debug!(language = %self.language, "Voice capture started");
                ToggleOutcome::Started
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start voice capture");
                self.recording = false;
                ToggleOutcome::StartFailed(e.to_string())
            }
        }
    }

    /// Apply a recognizer callback.
    pub fn handle(&mut self, event: VoiceEvent) -> Vec<VoiceEffect> {
        match event {
            VoiceEvent::Started => self.set_recording(true),
            VoiceEvent::Result(text) => vec![VoiceEffect::Transcribed(text)],
            VoiceEvent::Error(kind) => {
                let mut effects = Vec::new();
                match kind.user_message() {
                    Some(message) => effects.push(VoiceEffect::Notify(message)),
                    None => tracing::warn!(error = ?kind, "Speech recognition error"),
                }
                effects.extend(self.set_recording(false));
                effects
            }
            VoiceEvent::Ended => self.set_recording(false),
        }
    }

    fn set_recording(&mut self, recording: bool) -> Vec<VoiceEffect> {
        if self.recording == recording {
            return Vec::new();
        }
        self.recording = recording;
        vec![VoiceEffect::RecordingChanged(recording)]
    }
}

// =============================================================================
// Tests
// =============================================================================
