//! Scripted in-memory collaborators for tests.
//!
//! [`MockBackend`] records every request, answers from configurable payloads,
//! and can hold requests in flight until released. [`MockRecognizer`] records
//! start/stop calls.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::backend::{
    AdmissionDocumentsPayload, ChatBackend, FeesPayload, MessageReply, MessageRequest,
    ScholarshipsPayload, TicketReceipt, TicketRef,
};
use crate::error::{BackendError, WidgetError};
use crate::help::HelpTicket;
use crate::lock_or_recover;
use crate::voice::SpeechRecognizer;

/// A request seen by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Message(MessageRequest),
    Fees(Option<String>),
    Scholarships(Option<String>),
    AdmissionDocuments(String),
    HelpTicket(HelpTicket),
}

pub const DEFAULT_REPLY: &str = "OK";

#[derive(Debug)]
pub struct MockBackend {
    requests: Mutex<Vec<Recorded>>,
    replies: Mutex<VecDeque<Result<MessageReply, BackendError>>>,
    fees: Mutex<Result<FeesPayload, BackendError>>,
    scholarships: Mutex<Result<ScholarshipsPayload, BackendError>>,
    admission: Mutex<Result<AdmissionDocumentsPayload, BackendError>>,
    ticket: Mutex<Result<TicketReceipt, BackendError>>,
    gate: watch::Sender<bool>,
    message_gate: watch::Sender<bool>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        let (message_gate, _) = watch::channel(true);
        Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            fees: Mutex::new(Ok(FeesPayload::default())),
            scholarships: Mutex::new(Ok(ScholarshipsPayload::default())),
            admission: Mutex::new(Ok(AdmissionDocumentsPayload::default())),
            ticket: Mutex::new(Ok(TicketReceipt {
                ticket: TicketRef { id: 1 },
            })),
            gate,
            message_gate,
        }
    }

    // ---- Scripting ----

    /// Queue a chat reply. With the queue empty, replies are [`DEFAULT_REPLY`].
    pub fn push_reply(&self, reply: Result<MessageReply, BackendError>) {
        lock_or_recover(&self.replies).push_back(reply);
    }

    pub fn push_text_reply(&self, text: &str) {
        self.push_reply(Ok(MessageReply {
            response: Some(text.to_string()),
            session_id: None,
        }));
    }

    pub fn set_fees(&self, response: Result<FeesPayload, BackendError>) {
        *lock_or_recover(&self.fees) = response;
    }

    pub fn set_scholarships(&self, response: Result<ScholarshipsPayload, BackendError>) {
        *lock_or_recover(&self.scholarships) = response;
    }

    pub fn set_admission(&self, response: Result<AdmissionDocumentsPayload, BackendError>) {
        *lock_or_recover(&self.admission) = response;
    }

    pub fn set_ticket(&self, response: Result<TicketReceipt, BackendError>) {
        *lock_or_recover(&self.ticket) = response;
    }

    /// Hold every subsequent request until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Hold only chat messages; lookups and tickets still answer.
    pub fn hold_messages(&self) {
        self.message_gate.send_replace(false);
    }

    pub fn release_messages(&self) {
        self.message_gate.send_replace(true);
    }

    // ---- Inspection ----

    pub fn requests(&self) -> Vec<Recorded> {
        lock_or_recover(&self.requests).clone()
    }

    pub fn messages(&self) -> Vec<MessageRequest> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn tickets(&self) -> Vec<HelpTicket> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::HelpTicket(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn fees_calls(&self) -> usize {
        self.count(|r| matches!(r, Recorded::Fees(_)))
    }

    pub fn scholarships_calls(&self) -> usize {
        self.count(|r| matches!(r, Recorded::Scholarships(_)))
    }

    pub fn admission_calls(&self) -> usize {
        self.count(|r| matches!(r, Recorded::AdmissionDocuments(_)))
    }

    pub fn total_calls(&self) -> usize {
        lock_or_recover(&self.requests).len()
    }

    fn count(&self, pred: impl Fn(&Recorded) -> bool) -> usize {
        lock_or_recover(&self.requests)
            .iter()
            .filter(|r| pred(r))
            .count()
    }

    async fn enter(&self, request: Recorded) {
        lock_or_recover(&self.requests).push(request);
        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, BackendError> {
        self.enter(Recorded::Message(request.clone())).await;
        let mut gate = self.message_gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        lock_or_recover(&self.replies).pop_front().unwrap_or_else(|| {
            Ok(MessageReply {
                response: Some(DEFAULT_REPLY.to_string()),
                session_id: None,
            })
        })
    }

    async fn fees(&self, category: Option<&str>) -> Result<FeesPayload, BackendError> {
        self.enter(Recorded::Fees(category.map(str::to_string))).await;
        lock_or_recover(&self.fees).clone()
    }

    async fn scholarships(
        &self,
        category: Option<&str>,
    ) -> Result<ScholarshipsPayload, BackendError> {
        self.enter(Recorded::Scholarships(category.map(str::to_string)))
            .await;
        lock_or_recover(&self.scholarships).clone()
    }

    async fn admission_documents(
        &self,
        route: &str,
    ) -> Result<AdmissionDocumentsPayload, BackendError> {
        self.enter(Recorded::AdmissionDocuments(route.to_string()))
            .await;
        lock_or_recover(&self.admission).clone()
    }

    async fn submit_help_ticket(&self, ticket: &HelpTicket) -> Result<TicketReceipt, BackendError> {
        self.enter(Recorded::HelpTicket(ticket.clone())).await;
        lock_or_recover(&self.ticket).clone()
    }
}

/// Speech recognizer that records calls.
#[derive(Debug, Default)]
pub struct MockRecognizer {
    started: Mutex<Vec<String>>,
    stops: Mutex<usize>,
    fail_next: Mutex<Option<String>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_start(&self, reason: &str) {
        *lock_or_recover(&self.fail_next) = Some(reason.to_string());
    }

    pub fn started_with(&self) -> Vec<String> {
        lock_or_recover(&self.started).clone()
    }

    pub fn stop_count(&self) -> usize {
        *lock_or_recover(&self.stops)
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn start(&self, language: &str) -> Result<(), WidgetError> {
        if let Some(reason) = lock_or_recover(&self.fail_next).take() {
            return Err(WidgetError::Voice(reason));
        }
        lock_or_recover(&self.started).push(language.to_string());
        Ok(())
    }

    fn stop(&self) {
        *lock_or_recover(&self.stops) += 1;
    }
}
