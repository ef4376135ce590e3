//! Campus assistant binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing (logs on stderr, conversation on stdout)
//! 3. Build the widget over the HTTP backend and pre-load category dropdowns
//! 4. Render widget events in a background task
//! 5. Read commands and chat text from stdin until EOF or /quit

mod cli;
mod commands;
mod render;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use campus_core::CampusConfig;
use campus_widget::{Attachment, ChatWidget, HelpTicketDraft, RevealMode};

use cli::CliArgs;
use commands::{Command, TicketArgs, USAGE};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing so its log level can seed the filter.
    let config_file = args.resolve_config_path();
    let loaded = if config_file.exists() {
        Some(CampusConfig::load(&config_file))
    } else {
        None
    };
    let file_level = match &loaded {
        Some(Ok(config)) => config.general.log_level.clone(),
        _ => CampusConfig::default().general.log_level,
    };

    // Tracing. RUST_LOG wins over --log-level, which wins over the file.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(args.resolve_log_level(&file_level))
            }),
        )
        .init();

    tracing::info!("Starting campus assistant v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Some(Ok(config)) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Some(Err(e)) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Invalid config; using defaults");
            CampusConfig::default()
        }
        None => {
            tracing::info!(path = %config_file.display(), "No config file; using defaults");
            CampusConfig::default()
        }
    };
    args.apply(&mut config);

    // Terminals have no speech recognizer; /voice reports that.
    let mut widget = match ChatWidget::from_config(&config, None) {
        Ok(widget) => widget,
        Err(e) => {
            tracing::error!(error = %e, base_url = %config.backend.base_url, "Failed to build widget");
            return Err(e.into());
        }
    };
    if args.no_animation {
        widget = widget.with_reveal_mode(RevealMode::Immediate);
    }
    let widget = Arc::new(widget);

    let (stop_renderer, renderer_shutdown) = watch::channel(false);
    let renderer = tokio::spawn(render::run(
        Arc::clone(&widget),
        widget.subscribe(),
        renderer_shutdown,
    ));

    let header = widget.welcome_header();
    println!("{} - {}", config.widget.college_name, header.title);
    println!("{}", header.subtitle);
    println!("Type /usage for commands.");

    widget.init().await;
    widget.open();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        dispatch(&widget, command).await;
    }

    // Final frames are queued before the stop signal, so the renderer
    // prints them before it returns.
    widget.finish_reveals();
    stop_renderer.send_replace(true);
    match tokio::time::timeout(Duration::from_secs(2), renderer).await {
        Ok(Ok(printed)) => tracing::debug!(printed, "Renderer stopped"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Renderer task failed"),
        Err(_) => tracing::warn!("Renderer did not stop in time"),
    }
    tracing::info!("Campus assistant stopped");
    Ok(())
}

async fn dispatch(widget: &ChatWidget, command: Command) {
    match command {
        Command::Send(text) => {
            widget.send_message(&text).await;
        }
        Command::Open => widget.open(),
        Command::Close => widget.close(),
        Command::Expand => {
            widget.toggle_expand();
        }
        Command::QuickActions => {
            widget.toggle_quick_actions();
        }
        Command::Quick(key) => {
            widget.handle_quick_action(&key).await;
        }
        Command::Show(panel) => match panel {
            campus_core::ContextPanel::Fees => {
                widget.show_fees().await;
            }
            campus_core::ContextPanel::Scholarship => {
                widget.show_scholarship().await;
            }
            campus_core::ContextPanel::Admission => {
                widget.show_admission();
                for route in campus_widget::ADMISSION_ROUTES {
                    println!("  {} ({})", route.label, route.value);
                }
            }
        },
        Command::Select { panel, value } => {
            widget.select_category(panel, &value).await;
        }
        Command::Help => widget.show_help(),
        Command::Cancel => widget.cancel_help(),
        Command::Ticket(ticket) => submit_ticket(widget, ticket).await,
        Command::Clear => widget.clear_chat(),
        Command::Voice => {
            widget.toggle_voice();
        }
        Command::Status => match serde_json::to_string_pretty(&widget.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize widget state"),
        },
        Command::Usage => println!("{}", USAGE),
        Command::Quit => {}
    }
}

async fn submit_ticket(widget: &ChatWidget, args: TicketArgs) {
    let mut draft = HelpTicketDraft::new(args.student_name, args.contact, args.query);
    if let Some(topic) = args.topic {
        draft = draft.with_topic(topic);
    }
    if let Some(path) = args.attachment {
        match Attachment::from_path(&path) {
            Ok(attachment) => draft = draft.with_attachment(attachment),
            Err(e) => {
                println!("Could not read {}: {}", path.display(), e);
                return;
            }
        }
    }
    // Outcomes are reported in the transcript.
    let _ = widget.submit_help_ticket(&mut draft).await;
}
