//! Help-ticket form: draft, local validation, and the submitted ticket.

use std::path::Path;

use serde::Serialize;

use crate::error::WidgetError;

pub const MISSING_FIELDS_MESSAGE: &str =
    "Please fill all required fields to submit the help ticket.";
pub const NOT_PDF_MESSAGE: &str = "Only PDF files are allowed.";

const PDF_MAGIC: &[u8] = b"%PDF";

/// A file attached to a help ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an attachment from disk, keeping only the file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment.pdf".to_string());
        Ok(Self { file_name, bytes })
    }

    /// PDF by extension or by content signature.
    pub fn is_pdf(&self) -> bool {
        let by_extension = Path::new(&self.file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        by_extension || self.bytes.starts_with(PDF_MAGIC)
    }
}

/// Form contents as typed. Nothing is trimmed or checked until
/// [`HelpTicketDraft::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpTicketDraft {
    pub student_name: String,
    pub contact: String,
    pub query: String,
    pub topic: Option<String>,
    pub attachment: Option<Attachment>,
}

impl HelpTicketDraft {
    pub fn new(
        student_name: impl Into<String>,
        contact: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            contact: contact.into(),
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Trim every field and check it locally, before any network call.
    pub fn validate(&self) -> Result<HelpTicket, WidgetError> {
        let student_name = self.student_name.trim();
        let contact = self.contact.trim();
        let query = self.query.trim();
        if student_name.is_empty() || contact.is_empty() || query.is_empty() {
            return Err(WidgetError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
        }

        if let Some(attachment) = &self.attachment {
            if !attachment.is_pdf() {
                return Err(WidgetError::Validation(NOT_PDF_MESSAGE.to_string()));
            }
        }

        let topic = self
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(HelpTicket {
            student_name: student_name.to_string(),
            contact: contact.to_string(),
            query: query.to_string(),
            topic,
            attachment: self.attachment.clone(),
        })
    }
}

/// A validated ticket ready to submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpTicket {
    pub student_name: String,
    pub contact: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip)]
    pub attachment: Option<Attachment>,
}

impl HelpTicket {
    /// Tickets with a topic or attachment go out as multipart form data.
    pub fn needs_multipart(&self) -> bool {
        self.topic.is_some() || self.attachment.is_some()
    }

    /// Confirmation shown once the backend has created the ticket.
    pub fn confirmation(&self, ticket_id: i64) -> String {
        format!(
            "Thanks {}! Your ticket (#{}) has been created. We'll reach out soon.",
            self.student_name, ticket_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_fields() {
        let ticket = HelpTicketDraft::new("  Asha ", " 98200 ", " Lost ID card  ")
            .validate()
            .unwrap();
        assert_eq!(ticket.student_name, "Asha");
        assert_eq!(ticket.contact, "98200");
        assert_eq!(ticket.query, "Lost ID card");
        assert!(!ticket.needs_multipart());
    }

    #[test]
    fn test_missing_query_rejected() {
        let err = HelpTicketDraft::new("Asha", "98200", "   ")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), MISSING_FIELDS_MESSAGE);
    }

    #[test]
    fn test_missing_name_or_contact_rejected() {
        assert!(HelpTicketDraft::new("", "1", "q").validate().is_err());
        assert!(HelpTicketDraft::new("a", "", "q").validate().is_err());
    }

    #[test]
    fn test_non_pdf_attachment_rejected() {
        let draft = HelpTicketDraft::new("Asha", "98200", "Fee receipt")
            .with_attachment(Attachment::new("receipt.png", vec![0x89, b'P', b'N', b'G']));
        assert_eq!(draft.validate().unwrap_err().to_string(), NOT_PDF_MESSAGE);
    }

    #[test]
    fn test_pdf_detection() {
        assert!(Attachment::new("receipt.PDF", vec![]).is_pdf());
        assert!(Attachment::new("scan", b"%PDF-1.7\n".to_vec()).is_pdf());
        assert!(!Attachment::new("notes.txt", b"hello".to_vec()).is_pdf());
    }

    #[test]
    fn test_topic_or_attachment_needs_multipart() {
        let ticket = HelpTicketDraft::new("A", "1", "q")
            .with_topic("fees")
            .validate()
            .unwrap();
        assert!(ticket.needs_multipart());

        let ticket = HelpTicketDraft::new("A", "1", "q")
            .with_topic("   ")
            .validate()
            .unwrap();
        assert_eq!(ticket.topic, None);
        assert!(!ticket.needs_multipart());

        let ticket = HelpTicketDraft::new("A", "1", "q")
            .with_attachment(Attachment::new("a.pdf", b"%PDF".to_vec()))
            .validate()
            .unwrap();
        assert!(ticket.needs_multipart());
    }

    #[test]
    fn test_json_body_shape() {
        let ticket = HelpTicketDraft::new("Asha", "98200", "Lost ID")
            .validate()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&ticket).unwrap(),
            serde_json::json!({"student_name": "Asha", "contact": "98200", "query": "Lost ID"})
        );
    }

    #[test]
    fn test_confirmation_text() {
        let ticket = HelpTicketDraft::new("Asha", "98200", "Lost ID")
            .validate()
            .unwrap();
        assert_eq!(
            ticket.confirmation(17),
            "Thanks Asha! Your ticket (#17) has been created. We'll reach out soon."
        );
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marksheet.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.file_name, "marksheet.pdf");
        assert!(attachment.is_pdf());
    }
}
