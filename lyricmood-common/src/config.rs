//! Configuration loading and config file resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every section and every
//! field is optional: a missing file or a missing key falls back to the
//! compiled defaults below, so a fresh install only needs the two secrets
//! (which may also come from the environment).
//!
//! # Config file location priority
//! 1. Explicit path (command-line `--config`)
//! 2. `LYRICMOOD_CONFIG` environment variable
//! 3. `<config_dir>/lyricmood/config.toml`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "LYRICMOOD_CONFIG";

/// Complete TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Lyrics catalog service
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// AI inference service
    #[serde(default)]
    pub inference: InferenceSettings,

    /// Batch processing
    #[serde(default)]
    pub batch: BatchSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Lyrics catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub base_url: String,
    /// Bearer token (environment variable takes priority)
    pub access_token: Option<String>,
    /// Requests admitted per window
    pub rate_limit_requests: usize,
    pub rate_limit_window_secs: u64,
    pub timeout_secs: u64,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub user_agent: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.genius.com".to_string(),
            access_token: None,
            rate_limit_requests: 60,
            rate_limit_window_secs: 60,
            timeout_secs: 30,
            cache_capacity: 100,
            cache_ttl_secs: 3600,
            user_agent: default_user_agent(),
        }
    }
}

impl CatalogSettings {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// AI inference settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub base_url: String,
    /// Bearer API key (environment variable takes priority)
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
    /// Lyrics longer than this (in characters) are truncated before prompting
    pub max_lyrics_chars: usize,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub user_agent: String,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            max_tokens: 1000,
            temperature: 0.3,
            top_p: 0.9,
            timeout_secs: 60,
            max_lyrics_chars: 10_000,
            cache_capacity: 100,
            cache_ttl_secs: 3600,
            user_agent: default_user_agent(),
        }
    }
}

impl InferenceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Batch processing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Pause between songs of a batch
    pub delay_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { delay_ms: 1000 }
    }
}

impl BatchSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Standard user-agent for outgoing HTTP requests
pub fn default_user_agent() -> String {
    format!("LyricMood/{}", env!("CARGO_PKG_VERSION"))
}

/// Default config file path for the platform, if a config directory exists
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lyricmood").join("config.toml"))
}

/// Resolve which config file to read
///
/// Returns `None` when neither an explicit path, the environment variable nor
/// a platform config directory is available.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Parse a TOML config file
///
/// Unlike [`load_or_default`], a missing or malformed file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load configuration, degrading to compiled defaults
///
/// A missing file logs a warning and yields defaults. A file that exists but
/// cannot be parsed is still an error, since silently ignoring a typo in a
/// secret would be confusing.
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("No configuration directory available, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} not found, using compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}
