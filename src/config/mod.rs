//! Configuration (layered: defaults < TOML file < environment).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::agent::{AgentSettings, DEFAULT_MAX_TOOL_ROUNDS};
use crate::error::TwinError;
use crate::provider::openai::DEFAULT_MODEL;
use crate::util::retry::RetryPolicy;

/// Environment variables consulted for the provider API key, in order.
const API_KEY_VARS: [&str; 3] = ["GOOGLE_API_KEY", "GEMINI_API_KEY", "OPENAI_API_KEY"];

/// Top-level configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TwinConfig {
    pub model: String,
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub persona: PersonaConfig,
    pub notifications: NotificationConfig,
    pub academics: AcademicsConfig,
    pub limits: LimitsConfig,
}

/// Who the agent speaks for, and where their material lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonaConfig {
    pub name: String,
    /// Free-text summary (markdown).
    pub summary: PathBuf,
    /// Pre-extracted resume / profile text, concatenated in order.
    pub details: Vec<PathBuf>,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            summary: PathBuf::from("me/summary.md"),
            details: vec![PathBuf::from("me/resume.txt"), PathBuf::from("me/linkedin.txt")],
        }
    }
}

/// Operator notifications via Pushover.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    /// When false, notifications are only logged.
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub pushover_token: Option<String>,
    #[serde(skip_serializing)]
    pub pushover_user: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pushover_token: None,
            pushover_user: None,
        }
    }
}

impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("enabled", &self.enabled)
            .field("pushover_token", &self.pushover_token.as_ref().map(|_| ".."))
            .field("pushover_user", &self.pushover_user.as_ref().map(|_| ".."))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcademicsConfig {
    pub database: PathBuf,
}

impl Default for AcademicsConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("me/academics.db"),
        }
    }
}

/// Loop limits, timeouts and pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_tool_rounds: usize,
    pub request_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    pub stream_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            request_timeout_secs: 60,
            tool_timeout_secs: 30,
            stream_delay_ms: 30,
            max_attempts: 3,
        }
    }
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            persona: PersonaConfig::default(),
            notifications: NotificationConfig::default(),
            academics: AcademicsConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl std::fmt::Debug for TwinConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwinConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("persona", &self.persona)
            .field("notifications", &self.notifications)
            .field("academics", &self.academics)
            .field("limits", &self.limits)
            .finish()
    }
}

impl TwinConfig {
    /// Load configuration: the given TOML file (or the default one if it
    /// exists), then `.env` and process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self, TwinError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Platform config location: `<config_dir>/twin.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "twin").map(|dirs| dirs.config_dir().join("twin.toml"))
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, TwinError> {
        debug!(path = %path.display(), "Loading config file");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, TwinError> {
        toml::from_str(text).map_err(|e| TwinError::Configuration(format!("invalid config: {e}")))
    }

    /// Overlay environment values. `lookup` returns a variable's value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = API_KEY_VARS.iter().find_map(|var| lookup(var)) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("TWIN_MODEL") {
            self.model = model;
        }
        if let Some(url) = lookup("TWIN_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(name) = lookup("TWIN_PERSONA_NAME") {
            self.persona.name = name;
        }
        if let Some(token) = lookup("PUSHOVER_TOKEN") {
            self.notifications.pushover_token = Some(token);
        }
        if let Some(user) = lookup("PUSHOVER_USER") {
            self.notifications.pushover_user = Some(user);
        }
        if let Some(db) = lookup("TWIN_ACADEMICS_DB") {
            self.academics.database = PathBuf::from(db);
        }
        if let Some(rounds) = lookup("TWIN_MAX_TOOL_ROUNDS").and_then(|v| v.trim().parse().ok()) {
            self.limits.max_tool_rounds = rounds;
        }
    }

    /// Check that everything needed at runtime is present.
    pub fn validate(&self) -> Result<(), TwinError> {
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(TwinError::Configuration(format!(
                "missing provider API key (set one of {})",
                API_KEY_VARS.join(", ")
            )));
        }
        if self.persona.name.trim().is_empty() {
            return Err(TwinError::Configuration(
                "persona.name is empty (set it in the config file or TWIN_PERSONA_NAME)".into(),
            ));
        }
        if self.notifications.enabled && self.pushover_credentials().is_none() {
            return Err(TwinError::Configuration(
                "notifications are enabled but PUSHOVER_TOKEN / PUSHOVER_USER are missing".into(),
            ));
        }
        if self.limits.max_tool_rounds == 0 {
            return Err(TwinError::Configuration("limits.max_tool_rounds must be at least 1".into()));
        }
        Ok(())
    }

    /// `(token, user)` when both are set.
    pub fn pushover_credentials(&self) -> Option<(&str, &str)> {
        match (&self.notifications.pushover_token, &self.notifications.pushover_user) {
            (Some(token), Some(user)) => Some((token.as_str(), user.as_str())),
            _ => None,
        }
    }

    /// Loop settings derived from `limits`.
    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings::builder()
            .max_tool_rounds(self.limits.max_tool_rounds)
            .request_timeout(Duration::from_secs(self.limits.request_timeout_secs))
            .tool_timeout(Duration::from_secs(self.limits.tool_timeout_secs))
            .stream_delay(Duration::from_millis(self.limits.stream_delay_ms))
            .retry(RetryPolicy {
                max_attempts: self.limits.max_attempts,
                ..RetryPolicy::default()
            })
            .build()
    }
}
