//! CLI argument definitions for the campus assistant terminal client.
//!
//! Uses `clap` with derive macros for argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use campus_core::CampusConfig;

/// Campus assistant: chat with the college support backend from a terminal.
#[derive(Parser, Debug)]
#[command(name = "campus", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Backend origin, e.g. http://localhost:5000.
    #[arg(short = 'b', long = "base-url")]
    pub base_url: Option<String>,

    /// Name used in the welcome header.
    #[arg(short = 'u', long = "username")]
    pub username: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Print replies at once instead of word by word.
    #[arg(long = "no-animation")]
    pub no_animation: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CAMPUS_CONFIG env var > ~/.campus/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CAMPUS_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the backend origin.
    ///
    /// Priority: --base-url flag > CAMPUS_API_BASE env var.
    /// Returns `None` if neither is set (use config value).
    pub fn resolve_base_url(&self) -> Option<String> {
        if let Some(ref url) = self.base_url {
            return Some(url.clone());
        }
        std::env::var("CAMPUS_API_BASE")
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Apply every command-line override to a loaded config.
    pub fn apply(&self, config: &mut CampusConfig) {
        if let Some(url) = self.resolve_base_url() {
            config.backend.base_url = url;
        }
        if let Some(ref name) = self.username {
            config.widget.username = Some(name.clone());
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".campus").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".campus").join("config.toml");
    }
    PathBuf::from("config.toml")
}
