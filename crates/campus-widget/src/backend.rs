//! Backend REST client.
//!
//! [`ChatBackend`] is the seam between the widget engine and the campus API.
//! [`HttpBackend`] is the production implementation over `reqwest`; tests use
//! the scripted backend in `testing`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use campus_core::config::BackendConfig;

use crate::error::{BackendError, WidgetError};
use crate::help::HelpTicket;

pub const FEES_PATH: &str = "/api/chatbot/fees";
pub const SCHOLARSHIPS_PATH: &str = "/api/chatbot/scholarships";
pub const ADMISSION_DOCUMENTS_PATH: &str = "/api/chatbot/admission-documents";
pub const HELP_TICKET_PATH: &str = "/api/chatbot/help-ticket";

const LOOKUP_ERROR: &str = "Unable to fetch latest information.";
const CHAT_ERROR: &str = "Failed to get response";
const TICKET_ERROR: &str = "Unable to submit ticket.";

// =============================================================================
// Wire types
// =============================================================================

/// Body of `POST /api/chatbot/message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Reply to a chat message. A returned `sessionId` supersedes the local one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// One fee row. Only `category` matters to the widget; the rest is kept for
/// adapters that want to show it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeRecord {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeesPayload {
    #[serde(default)]
    pub fees: Vec<FeeRecord>,
    #[serde(default)]
    pub formatted_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipRecord {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipsPayload {
    #[serde(default)]
    pub scholarships: Vec<ScholarshipRecord>,
    #[serde(default)]
    pub formatted_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDocumentsPayload {
    #[serde(default)]
    pub formatted_text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRef {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketReceipt {
    pub ticket: TicketRef,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

// =============================================================================
// ChatBackend trait
// =============================================================================

/// The campus REST API as seen by the widget.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST` the chat endpoint.
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, BackendError>;

    /// `GET /api/chatbot/fees`. `None` returns every row for dropdown population.
    async fn fees(&self, category: Option<&str>) -> Result<FeesPayload, BackendError>;

    /// `GET /api/chatbot/scholarships`.
    async fn scholarships(&self, category: Option<&str>)
        -> Result<ScholarshipsPayload, BackendError>;

    /// `GET /api/chatbot/admission-documents?type=<route>`.
    async fn admission_documents(
        &self,
        route: &str,
    ) -> Result<AdmissionDocumentsPayload, BackendError>;

    /// `POST /api/chatbot/help-ticket`.
    async fn submit_help_ticket(&self, ticket: &HelpTicket) -> Result<TicketReceipt, BackendError>;
}

// =============================================================================
// HttpBackend
// =============================================================================

/// `reqwest`-based client for the campus API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    message_url: Url,
}

impl HttpBackend {
    /// Build a client from backend settings.
    ///
    /// Relative endpoint paths are resolved against `base_url`; an absolute
    /// `api_endpoint` is used as-is.
    pub fn new(config: &BackendConfig) -> Result<Self, WidgetError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| WidgetError::Config(format!("invalid base_url: {}", e)))?;
        let message_url = resolve_endpoint(&base_url, &config.api_endpoint)
            .map_err(|e| WidgetError::Config(format!("invalid api_endpoint: {}", e)))?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| WidgetError::Config(format!("failed to build HTTP client: {}", e)))?;

        tracing::debug!(base_url = %base_url, message_url = %message_url, "HTTP backend ready");
        Ok(Self {
            client,
            base_url,
            message_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, params: &[(&str, Option<&str>)]) -> Result<Url, BackendError> {
        let mut url = resolve_endpoint(&self.base_url, path)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint {}: {}", path, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                    pairs.append_pair(key, value);
                }
            }
        }
        // An empty query_pairs_mut scope still leaves a trailing '?'.
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, Option<&str>)],
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path, params)?;
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        read_json(response, LOOKUP_ERROR).await
    }
}

/// Resolve `endpoint` against `base`, leaving absolute URLs untouched.
fn resolve_endpoint(base: &Url, endpoint: &str) -> Result<Url, String> {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return Url::parse(endpoint).map_err(|e| e.to_string());
    }
    base.join(endpoint).map_err(|e| e.to_string())
}

/// Decode a JSON body, turning non-2xx statuses into [`BackendError::Api`].
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback_error: &str,
) -> Result<T, BackendError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.error)
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| fallback_error.to_string());
        return Err(BackendError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, BackendError> {
        tracing::debug!(url = %self.message_url, "POST chat message");
        let response = self
            .client
            .post(self.message_url.clone())
            .json(request)
            .send()
            .await?;
        read_json(response, CHAT_ERROR).await
    }

    async fn fees(&self, category: Option<&str>) -> Result<FeesPayload, BackendError> {
        self.get_json(FEES_PATH, &[("category", category)]).await
    }

    async fn scholarships(
        &self,
        category: Option<&str>,
    ) -> Result<ScholarshipsPayload, BackendError> {
        self.get_json(SCHOLARSHIPS_PATH, &[("category", category)])
            .await
    }

    async fn admission_documents(
        &self,
        route: &str,
    ) -> Result<AdmissionDocumentsPayload, BackendError> {
        self.get_json(ADMISSION_DOCUMENTS_PATH, &[("type", Some(route))])
            .await
    }

    async fn submit_help_ticket(&self, ticket: &HelpTicket) -> Result<TicketReceipt, BackendError> {
        let url = self.endpoint(HELP_TICKET_PATH, &[])?;
        let request = if ticket.needs_multipart() {
            let mut form = Form::new()
                .text("student_name", ticket.student_name.clone())
                .text("contact", ticket.contact.clone())
                .text("query", ticket.query.clone());
            if let Some(topic) = &ticket.topic {
                form = form.text("topic", topic.clone());
            }
            if let Some(attachment) = &ticket.attachment {
                let part = Part::bytes(attachment.bytes.clone())
                    .file_name(attachment.file_name.clone())
                    .mime_str("application/pdf")?;
                form = form.part("pdf_file", part);
            }
            self.client.post(url).multipart(form)
        } else {
            self.client.post(url).json(ticket)
        };

        tracing::debug!(
            multipart = ticket.needs_multipart(),
            "POST help ticket"
        );
        let response = request.send().await?;
        read_json(response, TICKET_ERROR).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> HttpBackend {
        HttpBackend::new(&BackendConfig::default()).unwrap()
    }

    #[test]
    fn test_new_resolves_relative_endpoint() {
        let b = backend();
        assert_eq!(
            b.message_url.as_str(),
            "http://localhost:5000/api/chatbot/message"
        );
    }

    #[test]
    fn test_new_keeps_absolute_endpoint() {
        let config = BackendConfig {
            api_endpoint: "https://chat.example.edu/v2/message".to_string(),
            ..BackendConfig::default()
        };
        let b = HttpBackend::new(&config).unwrap();
        assert_eq!(b.message_url.as_str(), "https://chat.example.edu/v2/message");
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let config = BackendConfig {
            base_url: "not a url".to_string(),
            ..BackendConfig::default()
        };
        assert!(matches!(
            HttpBackend::new(&config),
            Err(WidgetError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_skips_blank_params() {
        let b = backend();
        let url = b.endpoint(FEES_PATH, &[("category", None)]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/chatbot/fees");

        let url = b.endpoint(FEES_PATH, &[("category", Some("  "))]).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_endpoint_encodes_params() {
        let b = backend();
        let url = b
            .endpoint(ADMISSION_DOCUMENTS_PATH, &[("type", Some("first year&more"))])
            .unwrap();
        assert_eq!(url.query(), Some("type=first+year%26more"));
    }

    // ---- Wire formats ----

    #[test]
    fn test_message_request_uses_camel_case_session_id() {
        let req = MessageRequest {
            message: "hi".to_string(),
            session_id: "abc".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"message": "hi", "sessionId": "abc"}));
    }

    #[test]
    fn test_message_reply_tolerates_missing_fields() {
        let reply: MessageReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply, MessageReply::default());

        let reply: MessageReply =
            serde_json::from_str(r#"{"response":"ok","sessionId":"srv-1"}"#).unwrap();
        assert_eq!(reply.session_id.as_deref(), Some("srv-1"));
    }

    #[test]
    fn test_fees_payload_keeps_extra_fields() {
        let payload: FeesPayload = serde_json::from_str(
            r#"{"fees":[{"category":"open","amount":42000},{"amount":1}]}"#,
        )
        .unwrap();
        assert_eq!(payload.fees.len(), 2);
        assert_eq!(payload.fees[0].category.as_deref(), Some("open"));
        assert_eq!(payload.fees[0].details["amount"], 42000);
        assert!(payload.fees[1].category.is_none());
        assert!(payload.formatted_text.is_none());
    }

    #[test]
    fn test_scholarship_is_active_defaults_false() {
        let payload: ScholarshipsPayload =
            serde_json::from_str(r#"{"scholarships":[{"category":"sc"}]}"#).unwrap();
        assert!(!payload.scholarships[0].is_active);
    }
}
