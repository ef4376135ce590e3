//! Quick-action routing.
//!
//! Maps the fixed set of shortcut keys to what the widget should do. Routing
//! is a pure lookup; the widget shell carries the decision out.

use std::fmt;
use std::str::FromStr;

use campus_core::types::ContextPanel;

pub const HELP_INSTRUCTIONS: &str =
    "I'll create a help ticket for you. Please provide your name and contact number.";
pub const FEES_INSTRUCTIONS: &str =
    "Please choose your category from the dropdown to view the fee structure for your category.";
pub const SCHOLARSHIP_INSTRUCTIONS: &str =
    "Please choose your category from the dropdown to view scholarships tailored for you.";
pub const ADMISSION_INSTRUCTIONS: &str =
    "Select your admission route from the dropdown to view required documents and process.";

/// A quick-action shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickAction {
    Fees,
    Admission,
    Scholarships,
    Library,
    Hostel,
    Faculty,
    Events,
    Help,
}

impl QuickAction {
    pub const ALL: [QuickAction; 8] = [
        QuickAction::Fees,
        QuickAction::Admission,
        QuickAction::Scholarships,
        QuickAction::Library,
        QuickAction::Hostel,
        QuickAction::Faculty,
        QuickAction::Events,
        QuickAction::Help,
    ];

    pub fn key(self) -> &'static str {
        match self {
            QuickAction::Fees => "fees",
            QuickAction::Admission => "admission",
            QuickAction::Scholarships => "scholarships",
            QuickAction::Library => "library",
            QuickAction::Hostel => "hostel",
            QuickAction::Faculty => "faculty",
            QuickAction::Events => "events",
            QuickAction::Help => "help",
        }
    }

    /// Button label in the quick-action strip.
    pub fn label(self) -> &'static str {
        match self {
            QuickAction::Fees => "Fees",
            QuickAction::Admission => "Admission",
            QuickAction::Scholarships => "Scholarships",
            QuickAction::Library => "Library",
            QuickAction::Hostel => "Hostel",
            QuickAction::Faculty => "Faculty",
            QuickAction::Events => "Events",
            QuickAction::Help => "Help",
        }
    }

    /// The question sent on the user's behalf, for actions that just ask.
    pub fn canned_question(self) -> Option<&'static str> {
        match self {
            QuickAction::Library => Some("What are the library timings and facilities?"),
            QuickAction::Hostel => Some("Tell me about the hostel facilities."),
            QuickAction::Faculty => Some("How can I contact the faculty?"),
            QuickAction::Events => Some("What events are happening on campus?"),
            _ => None,
        }
    }

    pub fn route(self) -> RouteDecision {
        match self {
            QuickAction::Help => RouteDecision::OpenHelp {
                message: HELP_INSTRUCTIONS,
            },
            QuickAction::Fees => RouteDecision::OpenPanel {
                panel: ContextPanel::Fees,
                message: FEES_INSTRUCTIONS,
            },
            QuickAction::Scholarships => RouteDecision::OpenPanel {
                panel: ContextPanel::Scholarship,
                message: SCHOLARSHIP_INSTRUCTIONS,
            },
            QuickAction::Admission => RouteDecision::PromptAdmission,
            QuickAction::Library
            | QuickAction::Hostel
            | QuickAction::Faculty
            | QuickAction::Events => match self.canned_question() {
                Some(question) => RouteDecision::SendCanned { question },
                None => RouteDecision::Ignore,
            },
        }
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for QuickAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        QuickAction::ALL
            .into_iter()
            .find(|a| a.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| format!("unknown quick action: {}", key))
    }
}

/// What handling a quick action amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Open the help form and explain it. Panels are left alone.
    OpenHelp { message: &'static str },
    /// Open a category panel and explain it. Nothing is sent.
    OpenPanel {
        panel: ContextPanel,
        message: &'static str,
    },
    /// Open the admission panel, explaining it only the first time.
    PromptAdmission,
    /// Close all panels and send the question through the normal pipeline.
    SendCanned { question: &'static str },
    /// Unknown key.
    Ignore,
}

/// Route a raw action key. Unknown keys are ignored.
pub fn route(key: &str) -> RouteDecision {
    match key.parse::<QuickAction>() {
        Ok(action) => action.route(),
        Err(_) => {
            tracing::debug!(key, "Unknown quick action ignored");
            RouteDecision::Ignore
        }
    }
}
