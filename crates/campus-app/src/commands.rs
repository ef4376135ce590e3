//! Terminal command parsing.
//!
//! Lines starting with `/` are widget controls; anything else is chat text.

use std::path::PathBuf;

use campus_core::types::ContextPanel;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Open,
    Close,
    Expand,
    QuickActions,
    Quick(String),
    Show(ContextPanel),
    Select { panel: ContextPanel, value: String },
    Help,
    Cancel,
    Ticket(TicketArgs),
    Clear,
    Voice,
    Status,
    Usage,
    Quit,
}

/// Fields of `/ticket name | contact | query [| topic [| pdf path]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketArgs {
    pub student_name: String,
    pub contact: String,
    pub query: String,
    pub topic: Option<String>,
    pub attachment: Option<PathBuf>,
}

pub const USAGE: &str = "\
Commands:
  <text>                         send a chat message
  /open, /close                  open or close the panel
  /expand                        toggle the expanded layout
  /actions                       show or hide the quick actions
  /quick <key>                   run a quick action (fees, admission, scholarships,
                                 library, hostel, faculty, events, help)
  /fees, /scholarship, /admission  show a panel
  /select <panel> <value>        choose a dropdown value (blank value clears)
  /help, /cancel                 show or hide the help form
  /ticket name | contact | query [| topic [| pdf path]]
  /clear                         clear the conversation
  /voice                         toggle voice input
  /status                        print the widget state as JSON
  /quit";

pub fn parse_panel(name: &str) -> Option<ContextPanel> {
    match name.trim().to_ascii_lowercase().as_str() {
        "fees" | "fee" => Some(ContextPanel::Fees),
        "scholarship" | "scholarships" => Some(ContextPanel::Scholarship),
        "admission" | "admissions" => Some(ContextPanel::Admission),
        _ => None,
    }
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Send(line.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let command = match name.to_ascii_lowercase().as_str() {
        "open" => Command::Open,
        "close" => Command::Close,
        "expand" => Command::Expand,
        "actions" => Command::QuickActions,
        "quick" | "q" => {
            if args.is_empty() {
                return Err("usage: /quick <key>".into());
            }
            Command::Quick(args.to_string())
        }
        "fees" => Command::Show(ContextPanel::Fees),
        "scholarship" | "scholarships" => Command::Show(ContextPanel::Scholarship),
        "admission" => Command::Show(ContextPanel::Admission),
        "select" => {
            let (panel, value) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
            let panel =
                parse_panel(panel).ok_or_else(|| format!("unknown panel '{}'", panel))?;
            Command::Select {
                panel,
                value: value.trim().to_string(),
            }
        }
        "help" => Command::Help,
        "cancel" => Command::Cancel,
        "ticket" => Command::Ticket(parse_ticket(args)?),
        "clear" => Command::Clear,
        "voice" | "mic" => Command::Voice,
        "status" => Command::Status,
        "usage" | "?" => Command::Usage,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '/{}'; try /usage", other)),
    };
    Ok(Some(command))
}

fn parse_ticket(args: &str) -> Result<TicketArgs, String> {
    let fields: Vec<&str> = args.split('|').map(str::trim).collect();
    if fields.len() < 3 || fields.len() > 5 {
        return Err("usage: /ticket name | contact | query [| topic [| pdf path]]".into());
    }
    let optional = |idx: usize| {
        fields
            .get(idx)
            .filter(|f| !f.is_empty())
            .map(|f| f.to_string())
    };
    // Empty required fields pass through; the widget reports them.
    Ok(TicketArgs {
        student_name: fields[0].to_string(),
        contact: fields[1].to_string(),
        query: fields[2].to_string(),
        topic: optional(3),
        attachment: optional(4).map(PathBuf::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(
            parse("  hostel timings? ").unwrap(),
            Some(Command::Send("hostel timings?".into()))
        );
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("/open").unwrap(), Some(Command::Open));
        assert_eq!(parse("/CLEAR").unwrap(), Some(Command::Clear));
        assert_eq!(
            parse("/scholarships").unwrap(),
            Some(Command::Show(ContextPanel::Scholarship))
        );
        assert!(parse("/launch").is_err());
    }

    #[test]
    fn test_quick_requires_key() {
        assert_eq!(
            parse("/quick library").unwrap(),
            Some(Command::Quick("library".into()))
        );
        assert!(parse("/quick").is_err());
    }

    #[test]
    fn test_select() {
        assert_eq!(
            parse("/select fees nt_b").unwrap(),
            Some(Command::Select {
                panel: ContextPanel::Fees,
                value: "nt_b".into()
            })
        );
        assert_eq!(
            parse("/select admission").unwrap(),
            Some(Command::Select {
                panel: ContextPanel::Admission,
                value: String::new()
            })
        );
        assert!(parse("/select library x").is_err());
    }

    #[test]
    fn test_ticket_fields() {
        let Some(Command::Ticket(ticket)) =
            parse("/ticket Asha | 9820012345 | Lost ID | | /tmp/id.pdf").unwrap()
        else {
            panic!("expected ticket");
        };
        assert_eq!(ticket.student_name, "Asha");
        assert_eq!(ticket.query, "Lost ID");
        assert_eq!(ticket.topic, None);
        assert_eq!(ticket.attachment, Some(PathBuf::from("/tmp/id.pdf")));

        assert!(parse("/ticket Asha | 98200").is_err());
    }
}
