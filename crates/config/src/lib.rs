//! Configuration loading and validation for memclaw.
//!
//! Loads configuration from `~/.memclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use memclaw_core::identity::Identity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.memclaw/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Memory service settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// The fixed user this deployment remembers things about
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Conversation loop settings
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_anthropic_url")]
    pub base_url: String,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_anthropic_url() -> String {
    "https://api.anthropic.com".into()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            base_url: default_anthropic_url(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Zep API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_zep_url")]
    pub base_url: String,
}

fn default_zep_url() -> String {
    "https://api.getzep.com/api/v2".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_zep_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_first_name")]
    pub first_name: String,

    #[serde(default = "default_last_name")]
    pub last_name: String,
}

fn default_user_id() -> String {
    "john.doe".into()
}
fn default_email() -> String {
    "example@example.com".into()
}
fn default_first_name() -> String {
    "John".into()
}
fn default_last_name() -> String {
    "Doe".into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            email: default_email(),
            first_name: default_first_name(),
            last_name: default_last_name(),
        }
    }
}

impl IdentityConfig {
    pub fn to_identity(&self) -> Identity {
        Identity::new(&self.user_id)
            .with_email(&self.email)
            .with_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum completion rounds per user turn (safety limit)
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_max_rounds() -> u32 {
    25
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("completion", &self.completion)
            .field("memory", &self.memory)
            .field("identity", &self.identity)
            .field("agent", &self.agent)
            .finish()
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default location with env overrides.
    ///
    /// Credentials come from `ANTHROPIC_API_KEY` and `ZEP_API_KEY` when set;
    /// `MEMCLAW_MODEL` and `MEMCLAW_USER_ID` override the file values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(key) = lookup("ZEP_API_KEY") {
            self.memory.api_key = Some(key);
        }
        if let Some(model) = lookup("MEMCLAW_MODEL") {
            self.completion.model = model;
        }
        if let Some(user_id) = lookup("MEMCLAW_USER_ID") {
            self.identity.user_id = user_id;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".memclaw")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.temperature < 0.0 || self.completion.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.completion.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "completion.max_tokens must be > 0".into(),
            ));
        }

        if self.identity.user_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "identity.user_id must not be empty".into(),
            ));
        }

        if self.agent.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_rounds must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Names of the credentials that are still missing.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.completion.api_key.is_none() {
            missing.push("ANTHROPIC_API_KEY");
        }
        if self.memory.api_key.is_none() {
            missing.push("ZEP_API_KEY");
        }
        missing
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for memclaw_core::Error {
    fn from(e: ConfigError) -> Self {
        memclaw_core::Error::Config {
            message: e.to_string(),
        }
    }
}
