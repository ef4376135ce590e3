//! Free-text intent checks run before a message is sent.
//!
//! These only decide which panel or form to surface next to the reply; the
//! message itself is always interpreted by the backend.

use regex::Regex;
use std::sync::LazyLock;

// Substring match, so "documents" and "enrollment" count.
static ADMISSION_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(admission|admit|enroll|enquiry|document|requirement)")
        .expect("Invalid admission intent regex")
});

static HELP_INTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)i\s+need\s+help").expect("Invalid help intent regex"));

/// Whether the message is about admissions.
pub fn is_admission_intent(text: &str) -> bool {
    ADMISSION_INTENT.is_match(text)
}

/// Whether the message asks for a human ("I need help").
pub fn is_help_request(text: &str) -> bool {
    HELP_INTENT.is_match(text)
}
