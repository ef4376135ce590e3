use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CampusError, Result};

/// Top-level configuration for the campus assistant.
///
/// Loaded from `~/.campus/config.toml` by default. Each section corresponds
/// to one concern of the widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampusConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl CampusConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CampusConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(CampusError::Config("backend.base_url must not be empty".into()));
        }
        let endpoint = self.backend.api_endpoint.as_str();
        if !(endpoint.starts_with('/')
            || endpoint.starts_with("http://")
            || endpoint.starts_with("https://"))
        {
            return Err(CampusError::Config(format!(
                "backend.api_endpoint must be rooted or absolute, got '{}'",
                endpoint
            )));
        }
        if self.widget.reveal_interval_ms == 0 {
            return Err(CampusError::Config(
                "widget.reveal_interval_ms must be greater than zero".into(),
            ));
        }
        if !is_hex_color(&self.widget.primary_color) {
            return Err(CampusError::Config(format!(
                "widget.primary_color must look like #rrggbb, got '{}'",
                self.widget.primary_color
            )));
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Presentation settings for the chat widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Header label shown at the top of the panel.
    #[serde(alias = "collegeName")]
    pub college_name: String,
    /// Theme color for the header, button, and user bubbles.
    #[serde(alias = "primaryColor")]
    pub primary_color: String,
    /// Personalizes the welcome text when set.
    pub username: Option<String>,
    /// Delay between revealed words of an assistant reply.
    pub reveal_interval_ms: u64,
    /// Whether the automated welcome message is posted when the panel opens.
    pub welcome_enabled: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            college_name: "COLLEGE SUPPORT".to_string(),
            primary_color: "#00D26A".to_string(),
            username: None,
            reveal_interval_ms: 150,
            welcome_enabled: true,
        }
    }
}

/// Backend REST API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Origin that relative endpoint paths are resolved against.
    pub base_url: String,
    /// Chat POST target, rooted (`/api/...`) or absolute.
    #[serde(alias = "apiEndpoint")]
    pub api_endpoint: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            api_endpoint: "/api/chatbot/message".to_string(),
            request_timeout_secs: Some(30),
        }
    }
}

/// Speech-recognition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether a recognizer should be wired up at all.
    pub enabled: bool,
    /// BCP-47 recognition language.
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en-US".to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
