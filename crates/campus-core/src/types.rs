//! Shared domain types for the campus assistant.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Local wall-clock time; messages show it as `HH:MM`.
pub type Timestamp = DateTime<Local>;

// =============================================================================
// Transcript messages
// =============================================================================

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// A single transcript message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: Timestamp,
}

impl Message {
    /// Create a message stamped with the current local time.
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: Local::now(),
        }
    }

    /// Hour and minute shown under the bubble, e.g. `09:41`.
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

// =============================================================================
// Contextual panels and category topics
// =============================================================================

/// The three mutually exclusive dropdown-driven panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextPanel {
    Fees,
    Admission,
    Scholarship,
}

impl ContextPanel {
    pub const ALL: [ContextPanel; 3] = [
        ContextPanel::Fees,
        ContextPanel::Admission,
        ContextPanel::Scholarship,
    ];

    /// The backend-populated category topic behind this panel, if any.
    /// Admission routes are a fixed list.
    pub fn topic(self) -> Option<CategoryTopic> {
        match self {
            ContextPanel::Fees => Some(CategoryTopic::Fees),
            ContextPanel::Scholarship => Some(CategoryTopic::Scholarships),
            ContextPanel::Admission => None,
        }
    }
}

impl fmt::Display for ContextPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextPanel::Fees => write!(f, "fees"),
            ContextPanel::Admission => write!(f, "admission"),
            ContextPanel::Scholarship => write!(f, "scholarship"),
        }
    }
}

/// Topics whose dropdown options are fetched from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTopic {
    Fees,
    Scholarships,
}

impl CategoryTopic {
    pub fn panel(self) -> ContextPanel {
        match self {
            CategoryTopic::Fees => ContextPanel::Fees,
            CategoryTopic::Scholarships => ContextPanel::Scholarship,
        }
    }
}

impl fmt::Display for CategoryTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryTopic::Fees => write!(f, "fees"),
            CategoryTopic::Scholarships => write!(f, "scholarships"),
        }
    }
}

/// One dropdown entry: the raw backend key plus its human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

impl CategoryOption {
    /// Build an option from a raw category key, deriving its label.
    pub fn from_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let label = category_label(&value);
        Self { value, label }
    }
}

/// Turn a raw category key into a display label.
///
/// Underscores become spaces and every word is title-cased:
/// `"open_category"` -> `"Open Category"`, `"SC"` -> `"Sc"`.
/// A key with no visible characters becomes `"General"`.
pub fn category_label(raw: &str) -> String {
    let cleaned = raw.replace('_', " ");
    let words: Vec<String> = cleaned
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        return "General".to_string();
    }
    words.join(" ")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Sender::Bot).unwrap(), "\"bot\"");
        assert_eq!(Sender::Bot.to_string(), "bot");
    }

    #[test]
    fn test_message_display_time_format() {
        let msg = Message::new("hello", Sender::User);
        let time = msg.display_time();
        assert_eq!(time.len(), 5);
        assert_eq!(&time[2..3], ":");
    }

    #[test]
    fn test_panel_topics() {
        assert_eq!(ContextPanel::Fees.topic(), Some(CategoryTopic::Fees));
        assert_eq!(
            ContextPanel::Scholarship.topic(),
            Some(CategoryTopic::Scholarships)
        );
        assert_eq!(ContextPanel::Admission.topic(), None);
        assert_eq!(CategoryTopic::Scholarships.panel(), ContextPanel::Scholarship);
    }

    // ---- Category labels ----

    #[test]
    fn test_category_label_underscores() {
        assert_eq!(category_label("open_category"), "Open Category");
        assert_eq!(category_label("nt_b"), "Nt B");
    }

    #[test]
    fn test_category_label_case() {
        assert_eq!(category_label("SC"), "Sc");
        assert_eq!(category_label("sc"), "Sc");
        assert_eq!(category_label("EWS students"), "Ews Students");
    }

    #[test]
    fn test_category_label_blank() {
        assert_eq!(category_label(""), "General");
        assert_eq!(category_label("__"), "General");
        assert_eq!(category_label("   "), "General");
    }

    #[test]
    fn test_category_label_collapses_whitespace() {
        assert_eq!(category_label("  first__year  "), "First Year");
    }

    #[test]
    fn test_category_option_from_value() {
        let option = CategoryOption::from_value("minority");
        assert_eq!(option.value, "minority");
        assert_eq!(option.label, "Minority");
    }
}
