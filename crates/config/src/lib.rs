//! Configuration loading, validation, and management for chatrelay.
//!
//! Loads configuration from `~/.chatrelay/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.chatrelay/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used for every completion
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional cap on generated tokens per completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Overall deadline for processing one inbound message, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many past messages to fetch before trimming to the context budget
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Telegram bot settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Context window settings
    #[serde(default)]
    pub context: ContextConfig,

    /// History storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Keep-alive heartbeat settings
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Link summarization queue; `/summary_url` is disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_queue: Option<SummaryQueueConfig>,
}

fn default_model() -> String {
    "gpt-3.5-turbo-16k".into()
}
fn default_timeout_ms() -> u64 {
    20_000
}
fn default_history_limit() -> usize {
    100
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .field("history_limit", &self.history_limit)
            .field("telegram", &self.telegram)
            .field("provider", &self.provider)
            .field("context", &self.context)
            .field("storage", &self.storage)
            .field("heartbeat", &self.heartbeat)
            .field("gateway", &self.gateway)
            .field("summary_queue", &self.summary_queue)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Expected value of the `X-Telegram-Bot-Api-Secret-Token` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            webhook_secret: None,
            api_url: default_telegram_api_url(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, used in logs
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_provider_url")]
    pub api_url: String,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_provider_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_key: None,
            api_url: default_provider_url(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Explicit character budget; bypasses the model size table when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_chars: Option<usize>,

    /// Extra model size limits (model name → context size), merged over the built-ins
    #[serde(default)]
    pub model_limits: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// SQLite connection string
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_storage_backend() -> String {
    "sqlite".into()
}
fn default_database_url() -> String {
    "sqlite://chatrelay.db".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            database_url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_heartbeat_interval")]
    pub interval_minutes: u32,
}

fn default_heartbeat_interval() -> u32 {
    30
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: default_heartbeat_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SummaryQueueConfig {
    /// Endpoint that accepts `{url, chat_id}` jobs
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for SummaryQueueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryQueueConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatrelay/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides:
    /// - `TELEGRAM_TOKEN`, `X_TELEGRAM_BOT_HEADER`
    /// - `OPENAI_API_KEY`, `MODEL`, `TIMEOUT` (ms)
    /// - `DATABASE_URL`
    /// - `SUMMARY_QUEUE_URL`, `YA_API`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides through `lookup` (highest priority).
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(token) = lookup("TELEGRAM_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(secret) = lookup("X_TELEGRAM_BOT_HEADER") {
            self.telegram.webhook_secret = Some(secret);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(model) = lookup("MODEL").filter(|m| !m.is_empty()) {
            self.model = model;
        }
        if let Some(timeout) = lookup("TIMEOUT") {
            self.timeout_ms = timeout.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("TIMEOUT must be milliseconds, got '{timeout}'"))
            })?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = url;
        }
        if let Some(url) = lookup("SUMMARY_QUEUE_URL") {
            let api_key = self.summary_queue.take().and_then(|q| q.api_key);
            self.summary_queue = Some(SummaryQueueConfig { url, api_key });
        }
        if let Some(key) = lookup("YA_API") {
            if let Some(queue) = self.summary_queue.as_mut() {
                queue.api_key = Some(key);
            }
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatrelay")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ValidationError("timeout_ms must be > 0".into()));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ValidationError("history_limit must be > 0".into()));
        }
        if self.context.budget_chars == Some(0) {
            return Err(ConfigError::ValidationError(
                "context.budget_chars must be > 0".into(),
            ));
        }
        if let Some((model, _)) = self.context.model_limits.iter().find(|(_, limit)| **limit == 0) {
            return Err(ConfigError::ValidationError(format!(
                "context.model_limits.{model} must be > 0"
            )));
        }
        if self.heartbeat.enabled && self.heartbeat.interval_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "heartbeat.interval_minutes must be > 0".into(),
            ));
        }
        if !matches!(self.storage.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "storage.backend must be 'sqlite' or 'memory', got '{}'",
                self.storage.backend
            )));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: None,
            timeout_ms: default_timeout_ms(),
            history_limit: default_history_limit(),
            telegram: TelegramConfig::default(),
            provider: ProviderConfig::default(),
            context: ContextConfig::default(),
            storage: StorageConfig::default(),
            heartbeat: HeartbeatConfig::default(),
            gateway: GatewayConfig::default(),
            summary_queue: None,
        }
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
