//! Credential resolution for lyricmood-ai
//!
//! Provides two-tier secret resolution with ENV → TOML priority.

use lyricmood_common::config::TomlConfig;
use lyricmood_common::{Error, Result};
use tracing::{info, warn};

/// Environment variable holding the catalog bearer token
pub const CATALOG_TOKEN_ENV: &str = "LYRICMOOD_CATALOG_TOKEN";

/// Environment variable holding the inference API key
pub const INFERENCE_API_KEY_ENV: &str = "LYRICMOOD_INFERENCE_API_KEY";

/// Resolve the catalog access token
///
/// **Priority:** ENV → TOML
pub fn resolve_catalog_token(toml_config: &TomlConfig) -> Result<String> {
    resolve_secret(
        "Catalog access token",
        CATALOG_TOKEN_ENV,
        toml_config.catalog.access_token.as_deref(),
        "[catalog] access_token",
    )
}

/// Resolve the inference API key
///
/// **Priority:** ENV → TOML
pub fn resolve_inference_api_key(toml_config: &TomlConfig) -> Result<String> {
    resolve_secret(
        "Inference API key",
        INFERENCE_API_KEY_ENV,
        toml_config.inference.api_key.as_deref(),
        "[inference] api_key",
    )
}

fn resolve_secret(
    label: &str,
    env_var: &str,
    toml_value: Option<&str>,
    toml_field: &str,
) -> Result<String> {
    let mut sources = Vec::new();

    // Tier 1: Environment variable
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    if env_key.is_some() {
        sources.push("environment");
    }

    // Tier 2: TOML config
    let toml_key = toml_value.filter(|k| is_valid_key(k));
    if toml_key.is_some() {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using environment (highest priority).",
            label,
            sources.join(", ")
        );
    }

    if let Some(key) = env_key {
        info!("{} loaded from environment variable", label);
        return Ok(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("{} loaded from TOML config", label);
        return Ok(key.trim().to_string());
    }

    Err(Error::Config(format!(
        "{} not configured. Please configure using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: {} = \"your-key\"",
        label, env_var, toml_field
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
