//! Error types for the widget engine.

use campus_core::error::CampusError;

/// Failures talking to the backend REST API.
///
/// Each variant maps to one row of the widget's error taxonomy: the request
/// never completed, the server answered with a structured error, or the body
/// could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Text shown to the user as an assistant message.
    ///
    /// Server-reported errors are surfaced verbatim. Transport failures carry
    /// their own description; decode failures fall back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            BackendError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            BackendError::Transport(detail) if !detail.trim().is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Whether the server answered but the payload was unusable.
    pub fn is_decode(&self) -> bool {
        matches!(self, BackendError::Decode(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Errors from the widget engine.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Validation(String),
    #[error("voice error: {0}")]
    Voice(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<CampusError> for WidgetError {
    fn from(err: CampusError) -> Self {
        WidgetError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Api {
            status: 400,
            message: "Message is required.".to_string(),
        };
        assert_eq!(err.to_string(), "Message is required.");

        let err = BackendError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");

        let err = BackendError::Decode("expected value".to_string());
        assert_eq!(err.to_string(), "invalid response: expected value");
    }

    #[test]
    fn test_user_message_surfaces_server_error_verbatim() {
        let err = BackendError::Api {
            status: 500,
            message: "Database unavailable".to_string(),
        };
        assert_eq!(err.user_message("fallback"), "Database unavailable");
    }

    #[test]
    fn test_user_message_falls_back_for_blank_and_decode() {
        let err = BackendError::Api {
            status: 502,
            message: "  ".to_string(),
        };
        assert_eq!(err.user_message("Unable to fetch"), "Unable to fetch");

        let err = BackendError::Decode("eof".to_string());
        assert_eq!(err.user_message("Unable to fetch"), "Unable to fetch");
        assert!(err.is_decode());
    }

    #[test]
    fn test_widget_error_from_backend() {
        let err: WidgetError = BackendError::Transport("timed out".to_string()).into();
        assert!(matches!(err, WidgetError::Backend(_)));
        assert_eq!(err.to_string(), "backend error: timed out");
    }

    #[test]
    fn test_widget_error_from_campus_error() {
        let err: WidgetError = CampusError::Config("bad".to_string()).into();
        assert!(matches!(err, WidgetError::Config(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_validation_error_is_plain_text() {
        let err = WidgetError::Validation("Only PDF files are allowed.".to_string());
        assert_eq!(err.to_string(), "Only PDF files are allowed.");
    }
}
