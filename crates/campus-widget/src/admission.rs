//! Admission routes and the bundled document guide.
//!
//! The route dropdown is fixed. The guide is shown when the backend has no
//! document checklist for a route.

use serde::Serialize;

use crate::backend::AdmissionDocumentsPayload;

/// One entry of the admission route dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdmissionRoute {
    pub value: &'static str,
    pub label: &'static str,
}

pub const ADMISSION_ROUTES: [AdmissionRoute; 4] = [
    AdmissionRoute {
        value: "first-year",
        label: "First Year (MH-CET)",
    },
    AdmissionRoute {
        value: "direct-second-year",
        label: "Direct Second Year (Diploma)",
    },
    AdmissionRoute {
        value: "management",
        label: "Management Quota",
    },
    AdmissionRoute {
        value: "bsc",
        label: "B.Sc.-based Lateral Entry",
    },
];

const FIRST_YEAR_GUIDE: &str = "First Year Admission:
- Documents: SSC mark sheet, leaving certificate, domicile, income certificate, Aadhaar, caste certificate if applicable.
- Process: register on the DTE portal, fill the CAP form, confirm at a facilitation centre, lock choices, then report to the institute with originals.
- Fees: paid at the college counter after seat confirmation.";

const DIRECT_SECOND_YEAR_GUIDE: &str = "Direct Second Year Admission:
- Documents: HSC/MCVC/ITI mark sheet, SSC certificate, equivalence certificate, caste/income certificate if applicable.
- Process: apply in the CAP DSE round, upload scanned documents, confirm at a facilitation centre, report to the allotted institute.
- Bridge courses may be scheduled for math and physics gaps.";

const MANAGEMENT_GUIDE: &str = "Management Quota Admission:
- Documents: SSC mark sheet, qualifying exam mark sheet, domicile/nationality, Aadhaar, passport photo, caste/income certificate for reservation.
- Process: collect the institute form, submit documents for verification, attend counselling, pay the seat confirmation fee.
- Seats are limited and merit is still considered.";

const INTERNATIONAL_GUIDE: &str = "International / NRI Admission:
- Documents: passport, visa, AIU equivalence certificate, transcripts, proof of residence abroad, sponsorship letter, medical fitness.
- Process: apply through the DTE international cell, obtain provisional eligibility, then pay fees as instructed.
- Register with the FRRO within 14 days of arrival.";

const BSC_GUIDE: &str = "B.Sc.-based Lateral Entry:
- Documents: B.Sc. mark sheets, degree or provisional certificate, transfer certificate, migration certificate if from another university.
- Process: apply under the lateral entry notification, attend counselling (may include an aptitude test), verify originals, pay fees.
- Carry syllabus copies for credit transfer evaluation.";

const DEFAULT_GUIDE: &str =
    "Please contact the admission cell for your document checklist and schedule.";

pub fn find_route(value: &str) -> Option<AdmissionRoute> {
    ADMISSION_ROUTES.into_iter().find(|r| r.value == value)
}

/// Bundled guide text for a route key. Unknown keys get the generic pointer
/// to the admission cell.
pub fn admission_guide(route: &str) -> &'static str {
    match route {
        "first-year" => FIRST_YEAR_GUIDE,
        "direct-second-year" => DIRECT_SECOND_YEAR_GUIDE,
        "management" => MANAGEMENT_GUIDE,
        "international" => INTERNATIONAL_GUIDE,
        "bsc" => BSC_GUIDE,
        _ => DEFAULT_GUIDE,
    }
}

/// Text to show for a documents lookup: the formatted checklist, then the
/// server's message, then the bundled guide.
pub fn admission_reply(route: &str, payload: &AdmissionDocumentsPayload) -> String {
    [&payload.formatted_text, &payload.message]
        .into_iter()
        .flatten()
        .find(|t| !t.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| admission_guide(route).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_have_guides() {
        for route in ADMISSION_ROUTES {
            assert_ne!(admission_guide(route.value), DEFAULT_GUIDE, "{}", route.value);
        }
        assert_ne!(admission_guide("international"), DEFAULT_GUIDE);
        assert_eq!(admission_guide("lateral"), DEFAULT_GUIDE);
    }

    #[test]
    fn test_find_route() {
        assert_eq!(find_route("bsc").unwrap().label, "B.Sc.-based Lateral Entry");
        assert!(find_route("international").is_none());
    }

    #[test]
    fn test_reply_prefers_formatted_text() {
        let payload = AdmissionDocumentsPayload {
            formatted_text: Some("Checklist".into()),
            message: Some("ignored".into()),
        };
        assert_eq!(admission_reply("management", &payload), "Checklist");
    }

    #[test]
    fn test_reply_falls_back_to_message() {
        let payload = AdmissionDocumentsPayload {
            formatted_text: Some("  ".into()),
            message: Some("No documents configured for this route.".into()),
        };
        assert_eq!(
            admission_reply("management", &payload),
            "No documents configured for this route."
        );
    }

    #[test]
    fn test_reply_falls_back_to_guide() {
        let reply = admission_reply("first-year", &AdmissionDocumentsPayload::default());
        assert!(reply.starts_with("First Year Admission:"));
        assert!(reply.contains("\n- Documents:"));
    }
}
