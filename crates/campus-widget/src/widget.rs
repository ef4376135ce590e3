//! Widget shell: the top-level object composing every widget component.
//!
//! [`ChatWidget`] owns one instance of each component and coordinates them.
//! All methods take `&self`; state lives behind short-lived locks that are
//! never held across a backend call, so an `Arc<ChatWidget>` can be driven
//! from several tasks at once.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::broadcast;

use campus_core::config::{CampusConfig, WidgetConfig};
use campus_core::types::{CategoryTopic, ContextPanel, Sender};

use crate::admission::{admission_guide, admission_reply};
use crate::backend::{ChatBackend, HttpBackend, MessageRequest};
use crate::category::{CategoryCache, DropdownStatus, DropdownView, LoadOutcome};
use crate::error::{BackendError, WidgetError};
use crate::events::{EventSink, WidgetEvent};
use crate::help::HelpTicketDraft;
use crate::intent::{is_admission_intent, is_help_request};
use crate::lock_or_recover;
use crate::panel::PanelController;
use crate::router::{self, RouteDecision, ADMISSION_INSTRUCTIONS};
use crate::session::SessionIdentity;
use crate::transcript::{RevealMode, TranscriptRenderer};
use crate::voice::{
    SpeechRecognizer, ToggleOutcome, VoiceCapture, VoiceEffect, VoiceEvent, UNSUPPORTED_MESSAGE,
};

pub const CHAT_FALLBACK_REPLY: &str = "I apologize, but I could not process your request.";
pub const CHAT_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";
pub const LOOKUP_ERROR_MESSAGE: &str = "Unable to fetch latest information.";
pub const TICKET_ERROR_MESSAGE: &str = "Unable to submit ticket.";
pub const FEES_FALLBACK: &str =
    "Fee details are not available for this category right now. Please check again later.";
pub const SCHOLARSHIP_FALLBACK: &str =
    "No scholarships are configured for this category right now. Please check again later.";

// =============================================================================
// Geometry and header
// =============================================================================

/// Panel size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PanelGeometry {
    pub width: u32,
    pub height: u32,
}

impl PanelGeometry {
    pub const COLLAPSED: PanelGeometry = PanelGeometry {
        width: 436,
        height: 600,
    };
    pub const EXPANDED: PanelGeometry = PanelGeometry {
        width: 556,
        height: 630,
    };

    pub fn for_state(expanded: bool) -> Self {
        if expanded {
            Self::EXPANDED
        } else {
            Self::COLLAPSED
        }
    }

    /// Bottom offset that keeps the panel inside a viewport of the given
    /// height, leaving 20px above it and at least 16px below.
    pub fn safe_bottom(&self, viewport_height: u32) -> u32 {
        viewport_height
            .saturating_sub(self.height)
            .saturating_sub(20)
            .max(16)
    }
}

/// Greeting shown above an empty transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WelcomeHeader {
    pub title: String,
    pub subtitle: &'static str,
}

// =============================================================================
// Outcomes and snapshot
// =============================================================================

/// Result of a free-text send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input.
    Ignored,
    /// A previous send is still waiting for its reply.
    Busy,
    Sent,
    /// The backend failed; the message shown to the user is included.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptLine {
    pub id: u64,
    pub sender: Sender,
    pub text: String,
    pub html: String,
    pub time: String,
    pub revealing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownSnapshot {
    pub status: DropdownStatus,
    pub view: DropdownView,
    pub placeholder: &'static str,
    pub enabled: bool,
    pub selection: Option<String>,
}

/// Complete visible state of the widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetSnapshot {
    pub is_open: bool,
    pub is_expanded: bool,
    pub is_typing: bool,
    pub sending: bool,
    pub quick_actions_visible: bool,
    pub geometry: PanelGeometry,
    pub messages: Vec<TranscriptLine>,
    pub active_panel: Option<ContextPanel>,
    pub admission_selection: Option<String>,
    pub admission_prompted: bool,
    pub fees: DropdownSnapshot,
    pub scholarships: DropdownSnapshot,
    pub help_form_visible: bool,
    pub compose: String,
    pub recording: bool,
    pub voice_available: bool,
    pub session_id: Option<String>,
}

#[derive(Debug)]
struct ShellState {
    is_open: bool,
    is_expanded: bool,
    quick_actions_visible: bool,
    welcome_shown: bool,
    /// Gates duplicate sends while a chat reply is pending.
    sending: bool,
    compose: String,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            is_open: false,
            is_expanded: false,
            quick_actions_visible: true,
            welcome_shown: false,
            sending: false,
            compose: String::new(),
        }
    }
}

// =============================================================================
// ChatWidget
// =============================================================================

/// One embeddable assistant widget. Instances share nothing.
pub struct ChatWidget {
    config: WidgetConfig,
    backend: Arc<dyn ChatBackend>,
    events: EventSink,
    session: SessionIdentity,
    transcript: TranscriptRenderer,
    fees: CategoryCache,
    scholarships: CategoryCache,
    panels: Mutex<PanelController>,
    voice: Mutex<VoiceCapture>,
    state: Mutex<ShellState>,
}

impl std::fmt::Debug for ChatWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("college_name", &self.config.college_name)
            .field("session_id", &self.session.peek())
            .finish_non_exhaustive()
    }
}

impl ChatWidget {
    /// Assemble a widget around an existing backend.
    ///
    /// The recognizer is dropped when voice is disabled in the config.
    pub fn new(
        config: &CampusConfig,
        backend: Arc<dyn ChatBackend>,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
    ) -> Self {
        let events = EventSink::new();
        let recognizer = recognizer.filter(|_| config.voice.enabled);
        let mode = RevealMode::from_interval_ms(config.widget.reveal_interval_ms);

        Self {
            config: config.widget.clone(),
            backend,
            transcript: TranscriptRenderer::new(events.clone(), mode),
            events,
            session: SessionIdentity::new(),
            fees: CategoryCache::new(CategoryTopic::Fees),
            scholarships: CategoryCache::new(CategoryTopic::Scholarships),
            panels: Mutex::new(PanelController::new()),
            voice: Mutex::new(VoiceCapture::new(recognizer, config.voice.language.clone())),
            state: Mutex::new(ShellState::default()),
        }
    }

    /// Validate the config and build a widget talking HTTP to the backend.
    pub fn from_config(
        config: &CampusConfig,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
    ) -> Result<Self, WidgetError> {
        config.validate()?;
        let backend = HttpBackend::new(&config.backend)?;
        Ok(Self::new(config, Arc::new(backend), recognizer))
    }

    /// Replace the reveal mode. Intended for construction time.
    pub fn with_reveal_mode(mut self, mode: RevealMode) -> Self {
        self.transcript = TranscriptRenderer::new(self.events.clone(), mode);
        self
    }

    /// Subscribe to render events.
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events.subscribe()
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.peek()
    }

    fn publish_all(&self, events: Vec<WidgetEvent>) {
        for event in events {
            self.events.publish(event);
        }
    }

    fn with_panels<R>(&self, f: impl FnOnce(&mut PanelController) -> R) -> R {
        f(&mut lock_or_recover(&self.panels))
    }

    fn bot(&self, text: &str) {
        self.transcript.append(text, Sender::Bot);
    }

    fn cache(&self, topic: CategoryTopic) -> &CategoryCache {
        match topic {
            CategoryTopic::Fees => &self.fees,
            CategoryTopic::Scholarships => &self.scholarships,
        }
    }

    // ---- Lifecycle ----

    /// Pre-populate both category dropdowns.
    pub async fn init(&self) {
        let (fees, scholarships) = tokio::join!(
            self.fees.load(self.backend.as_ref(), &self.events, false),
            self.scholarships
                .load(self.backend.as_ref(), &self.events, false),
        );
        tracing::info!(fees = ?fees, scholarships = ?scholarships, "Widget initialized");
    }

    /// Open the panel. The automated welcome appears once per open session.
    pub fn open(&self) {
        let show_welcome = {
            let mut state = lock_or_recover(&self.state);
            if state.is_open {
                return;
            }
            state.is_open = true;
            let show = self.config.welcome_enabled && !state.welcome_shown;
            if show {
                state.welcome_shown = true;
            }
            show
        };
        tracing::debug!("Widget opened");
        self.events.publish(WidgetEvent::Opened);
        if show_welcome {
            self.bot(&self.welcome_message());
        }
    }

    /// Close the panel and reset it to its initial layout.
    ///
    /// The transcript is kept; the help form and every panel are hidden and
    /// reset.
    pub fn close(&self) {
        let was_expanded = {
            let mut state = lock_or_recover(&self.state);
            let was_expanded = state.is_expanded;
            state.is_open = false;
            state.is_expanded = false;
            state.welcome_shown = false;
            was_expanded
        };

        self.events.publish(WidgetEvent::Closed);
        if was_expanded {
            self.events
                .publish(WidgetEvent::ExpandedChanged { expanded: false });
        }
        let events = self.with_panels(|p| {
            let mut events = p.hide_help();
            events.extend(p.hide_all(true));
            events
        });
        self.publish_all(events);
        tracing::debug!("Widget closed");
    }

    pub fn toggle_open(&self) -> bool {
        if self.is_open() {
            self.close();
            false
        } else {
            self.open();
            true
        }
    }

    pub fn is_open(&self) -> bool {
        lock_or_recover(&self.state).is_open
    }

    /// Switch between the collapsed and expanded sizes.
    pub fn toggle_expand(&self) -> bool {
        let expanded = {
            let mut state = lock_or_recover(&self.state);
            state.is_expanded = !state.is_expanded;
            state.is_expanded
        };
        self.events.publish(WidgetEvent::ExpandedChanged { expanded });
        expanded
    }

    pub fn geometry(&self) -> PanelGeometry {
        PanelGeometry::for_state(lock_or_recover(&self.state).is_expanded)
    }

    pub fn toggle_quick_actions(&self) -> bool {
        let visible = {
            let mut state = lock_or_recover(&self.state);
            state.quick_actions_visible = !state.quick_actions_visible;
            state.quick_actions_visible
        };
        self.events
            .publish(WidgetEvent::QuickActionsToggled { visible });
        visible
    }

    pub fn welcome_header(&self) -> WelcomeHeader {
        let name = self
            .config
            .username
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("there");
        WelcomeHeader {
            title: format!("Hi {} 👋", name),
            subtitle: "How can we help?",
        }
    }

    pub fn welcome_message(&self) -> String {
        format!(
            "Hello! I am your AI assistant for {}. Ask me anything about fees, admissions, \
             scholarships, library, hostel, or say 'I need help'.",
            self.config.college_name
        )
    }

    // ---- Compose and send ----

    /// Replace the compose input.
    pub fn set_compose(&self, text: impl Into<String>) {
        let text = text.into();
        lock_or_recover(&self.state).compose = text.clone();
        self.events.publish(WidgetEvent::ComposeChanged { text });
    }

    pub fn compose(&self) -> String {
        lock_or_recover(&self.state).compose.clone()
    }

    /// Send whatever is in the compose input.
    pub async fn send_compose(&self) -> SendOutcome {
        let text = self.compose();
        self.send_message(&text).await
    }

    /// Run the free-text send pipeline.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SendOutcome::Ignored;
        }

        let clear_compose = {
            let mut state = lock_or_recover(&self.state);
            if state.sending {
                tracing::debug!("Send ignored; reply still pending");
                return SendOutcome::Busy;
            }
            state.sending = true;
            !std::mem::take(&mut state.compose).is_empty()
        };
        if clear_compose {
            self.events.publish(WidgetEvent::ComposeChanged {
                text: String::new(),
            });
        }

        let (panel_events, prompt_admission) = self.with_panels(|p| {
            let mut events = Vec::new();
            if is_help_request(message) {
                events.extend(p.show_help());
            }
            let mut prompt = false;
            if is_admission_intent(message) {
                let (shown, first) = p.prompt_admission();
                events.extend(shown);
                prompt = first;
            } else if p.is_visible(ContextPanel::Admission) {
                events.extend(p.hide(ContextPanel::Admission, true));
            }
            (events, prompt)
        });
        self.publish_all(panel_events);

        self.transcript.append(message, Sender::User);
        if prompt_admission {
            self.bot(ADMISSION_INSTRUCTIONS);
        }
        self.transcript.show_typing();

        let request = MessageRequest {
            message: message.to_string(),
            session_id: self.session.get_or_create(),
        };
        tracing::debug!(session_id = %request.session_id, len = message.len(), "Sending chat message");
        let result = self.backend.send_message(&request).await;

        self.transcript.hide_typing();
        let outcome = match result {
            Ok(reply) => {
                if let Some(id) = &reply.session_id {
                    self.session.adopt_server_id(id);
                }
                let text = reply
                    .response
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| CHAT_FALLBACK_REPLY.to_string());
                self.bot(&text);
                SendOutcome::Sent
            }
            Err(e) if e.is_decode() => {
                tracing::warn!(error = %e, "Chat reply unreadable; using fallback");
                self.bot(CHAT_FALLBACK_REPLY);
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat message failed");
                let shown = e.user_message(CHAT_ERROR_MESSAGE);
                self.bot(&shown);
                SendOutcome::Failed(shown)
            }
        };

        lock_or_recover(&self.state).sending = false;
        outcome
    }

    // ---- Quick actions ----

    /// Handle a quick-action key. Unknown keys do nothing.
    pub async fn handle_quick_action(&self, key: &str) -> RouteDecision {
        let decision = router::route(key);
        tracing::debug!(key, decision = ?decision, "Quick action");
        match decision {
            RouteDecision::OpenHelp { message } => {
                let events = self.with_panels(|p| p.show_help());
                self.publish_all(events);
                self.bot(message);
            }
            RouteDecision::OpenPanel { panel, message } => {
                self.show_panel_now(panel);
                self.bot(message);
                if let Some(topic) = panel.topic() {
                    self.refresh_categories(topic).await;
                }
            }
            RouteDecision::PromptAdmission => self.prompt_admission(),
            RouteDecision::SendCanned { question } => {
                let events = self.with_panels(|p| p.hide_all(true));
                self.publish_all(events);
                self.send_message(question).await;
            }
            RouteDecision::Ignore => {}
        }
        decision
    }

    // ---- Panels ----

    fn show_panel_now(&self, panel: ContextPanel) {
        let events = self.with_panels(|p| p.show(panel));
        self.publish_all(events);
    }

    async fn refresh_categories(&self, topic: CategoryTopic) -> LoadOutcome {
        self.cache(topic)
            .load(self.backend.as_ref(), &self.events, true)
            .await
    }

    /// Show the fees panel and refresh its categories.
    pub async fn show_fees(&self) -> LoadOutcome {
        self.show_panel_now(ContextPanel::Fees);
        self.refresh_categories(CategoryTopic::Fees).await
    }

    /// Show the scholarship panel and refresh its categories.
    pub async fn show_scholarship(&self) -> LoadOutcome {
        self.show_panel_now(ContextPanel::Scholarship);
        self.refresh_categories(CategoryTopic::Scholarships).await
    }

    /// Show the admission panel without any message.
    pub fn show_admission(&self) {
        self.show_panel_now(ContextPanel::Admission);
    }

    /// Show the admission panel, explaining it the first time.
    pub fn prompt_admission(&self) {
        let (events, first) = self.with_panels(|p| p.prompt_admission());
        self.publish_all(events);
        if first {
            self.bot(ADMISSION_INSTRUCTIONS);
        }
    }

    pub fn hide_panel(&self, panel: ContextPanel, reset: bool) {
        let events = self.with_panels(|p| p.hide(panel, reset));
        self.publish_all(events);
    }

    /// Load categories for a topic without forcing a refetch.
    pub async fn load_categories(&self, topic: CategoryTopic, force: bool) -> LoadOutcome {
        self.cache(topic)
            .load(self.backend.as_ref(), &self.events, force)
            .await
    }

    /// React to a dropdown change in `panel`.
    ///
    /// A blank value only clears the selection. Otherwise exactly one lookup
    /// is made and its text appended as a bot message, which is returned.
    pub async fn select_category(&self, panel: ContextPanel, value: &str) -> Option<String> {
        let value = self.with_panels(|p| p.select(panel, value))?;
        tracing::debug!(panel = %panel, value = %value, "Category selected");

        self.transcript.show_typing();
        let reply = match panel {
            ContextPanel::Fees => match self.backend.fees(Some(&value)).await {
                Ok(payload) => non_blank(payload.formatted_text)
                    .unwrap_or_else(|| FEES_FALLBACK.to_string()),
                Err(e) => lookup_failure(panel, &e, FEES_FALLBACK),
            },
            ContextPanel::Scholarship => match self.backend.scholarships(Some(&value)).await {
                Ok(payload) => non_blank(payload.formatted_text)
                    .unwrap_or_else(|| SCHOLARSHIP_FALLBACK.to_string()),
                Err(e) => lookup_failure(panel, &e, SCHOLARSHIP_FALLBACK),
            },
            ContextPanel::Admission => match self.backend.admission_documents(&value).await {
                Ok(payload) => admission_reply(&value, &payload),
                Err(e) => lookup_failure(panel, &e, admission_guide(&value)),
            },
        };
        self.transcript.hide_typing();
        self.bot(&reply);
        Some(reply)
    }

    // ---- Help ticket ----

    pub fn show_help(&self) {
        let events = self.with_panels(|p| p.show_help());
        self.publish_all(events);
    }

    pub fn cancel_help(&self) {
        let events = self.with_panels(|p| p.hide_help());
        self.publish_all(events);
    }

    /// Validate and submit the help form.
    ///
    /// Validation failures never reach the backend. On success the form is
    /// hidden and the draft cleared; every outcome is reported in the
    /// transcript.
    pub async fn submit_help_ticket(&self, draft: &mut HelpTicketDraft) -> Result<i64, WidgetError> {
        let ticket = match draft.validate() {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::debug!(error = %e, "Help ticket rejected locally");
                self.bot(&e.to_string());
                return Err(e);
            }
        };

        match self.backend.submit_help_ticket(&ticket).await {
            Ok(receipt) => {
                let id = receipt.ticket.id;
                tracing::info!(ticket_id = id, multipart = ticket.needs_multipart(), "Help ticket created");
                self.bot(&ticket.confirmation(id));
                self.cancel_help();
                *draft = HelpTicketDraft::default();
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Help ticket submission failed");
                self.bot(&e.user_message(TICKET_ERROR_MESSAGE));
                Err(e.into())
            }
        }
    }

    // ---- Transcript ----

    /// Empty the transcript, reset every panel, and greet again.
    pub fn clear_chat(&self) {
        self.transcript.clear();
        let events = self.with_panels(|p| p.hide_all(true));
        self.publish_all(events);
        if self.config.welcome_enabled {
            self.bot(&self.welcome_message());
        }
    }

    /// Render every pending reply in full.
    pub fn finish_reveals(&self) {
        self.transcript.finish_reveals();
    }

    // ---- Voice ----

    pub fn toggle_voice(&self) -> ToggleOutcome {
        let outcome = lock_or_recover(&self.voice).toggle();
        match &outcome {
            ToggleOutcome::Unsupported => self.bot(UNSUPPORTED_MESSAGE),
            ToggleOutcome::Started => self
                .events
                .publish(WidgetEvent::RecordingChanged { recording: true }),
            ToggleOutcome::Stopped | ToggleOutcome::StartFailed(_) => {}
        }
        outcome
    }

    /// Deliver a recognizer callback.
    pub fn handle_voice_event(&self, event: VoiceEvent) {
        let effects = lock_or_recover(&self.voice).handle(event);
        for effect in effects {
            match effect {
                VoiceEffect::RecordingChanged(recording) => self
                    .events
                    .publish(WidgetEvent::RecordingChanged { recording }),
                VoiceEffect::Transcribed(text) => self.set_compose(text),
                VoiceEffect::Notify(message) => self.bot(message),
            }
        }
    }

    // ---- Snapshot ----

    pub fn snapshot(&self) -> WidgetSnapshot {
        let (is_open, is_expanded, quick_actions_visible, sending, compose) = {
            let state = lock_or_recover(&self.state);
            (
                state.is_open,
                state.is_expanded,
                state.quick_actions_visible,
                state.sending,
                state.compose.clone(),
            )
        };
        let panels = self.with_panels(|p| PanelsView {
            active: p.active(),
            fees: p.selection(ContextPanel::Fees).map(str::to_string),
            scholarship: p.selection(ContextPanel::Scholarship).map(str::to_string),
            admission: p.selection(ContextPanel::Admission).map(str::to_string),
            help_form_visible: p.is_help_visible(),
            admission_prompted: p.admission_prompted(),
        });
        let (recording, voice_available) = {
            let voice = lock_or_recover(&self.voice);
            (voice.is_recording(), voice.is_available())
        };
        let messages = self.transcript.with_transcript(|t| {
            t.entries()
                .iter()
                .map(|e| TranscriptLine {
                    id: e.id,
                    sender: e.message.sender,
                    text: e.message.text.clone(),
                    html: e.html.clone(),
                    time: e.message.display_time(),
                    revealing: e.is_revealing(),
                })
                .collect()
        });

        WidgetSnapshot {
            is_open,
            is_expanded,
            is_typing: self.transcript.is_typing(),
            sending,
            quick_actions_visible,
            geometry: PanelGeometry::for_state(is_expanded),
            messages,
            active_panel: panels.active,
            admission_selection: panels.admission,
            admission_prompted: panels.admission_prompted,
            fees: dropdown_snapshot(&self.fees, panels.fees),
            scholarships: dropdown_snapshot(&self.scholarships, panels.scholarship),
            help_form_visible: panels.help_form_visible,
            compose,
            recording,
            voice_available,
            session_id: self.session.peek(),
        }
    }
}

struct PanelsView {
    active: Option<ContextPanel>,
    fees: Option<String>,
    scholarship: Option<String>,
    admission: Option<String>,
    help_form_visible: bool,
    admission_prompted: bool,
}

fn dropdown_snapshot(cache: &CategoryCache, selection: Option<String>) -> DropdownSnapshot {
    let view = cache.view();
    DropdownSnapshot {
        status: cache.status(),
        placeholder: view.placeholder(cache.topic()),
        enabled: view.is_enabled(),
        view,
        selection,
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// Text for a failed lookup. Unreadable payloads count as "no data".
fn lookup_failure(panel: ContextPanel, err: &BackendError, no_data: &str) -> String {
    tracing::warn!(panel = %panel, error = %err, "Lookup failed");
    if err.is_decode() {
        no_data.to_string()
    } else {
        err.user_message(LOOKUP_ERROR_MESSAGE)
    }
}

// =============================================================================
// Tests
// =============================================================================
