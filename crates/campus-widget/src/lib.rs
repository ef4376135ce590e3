//! Conversational widget orchestration engine.
//!
//! Owns widget and session state for the campus assistant: mutually exclusive
//! contextual panels, lazily cached category dropdowns, quick-action routing,
//! an append-only transcript with word-by-word reveal, and an optional voice
//! capture bridge. Rendering adapters observe the engine through
//! [`events::WidgetEvent`]s and never share state with it.

pub mod admission;
pub mod backend;
pub mod category;
pub mod error;
pub mod events;
pub mod format;
pub mod help;
pub mod intent;
pub mod panel;
pub mod router;
pub mod session;
pub mod transcript;
pub mod voice;
pub mod widget;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use admission::{AdmissionRoute, ADMISSION_ROUTES};
pub use backend::{ChatBackend, HttpBackend};
pub use category::{CategoryCache, DropdownStatus, DropdownView, LoadOutcome};
pub use error::{BackendError, WidgetError};
pub use events::{EventSink, WidgetEvent};
pub use help::{Attachment, HelpTicket, HelpTicketDraft};
pub use panel::PanelController;
pub use router::{QuickAction, RouteDecision};
pub use session::SessionIdentity;
pub use transcript::{RevealMode, Transcript, TranscriptRenderer};
pub use voice::{
    SpeechRecognizer, ToggleOutcome, VoiceCapture, VoiceEffect, VoiceErrorKind, VoiceEvent,
};
pub use widget::{ChatWidget, PanelGeometry, SendOutcome, WelcomeHeader, WidgetSnapshot};

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Widget state stays usable after a panic elsewhere; a stuck widget is worse
/// than one that redraws from slightly stale state.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        tracing::error!("Widget lock poisoned; recovering");
        poisoned.into_inner()
    })
}
