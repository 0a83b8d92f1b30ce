//! Credential resolution tests
//!
//! Uses serial_test because the tests set and clear the credential
//! environment variables.

use lyricmood_ai::config::{
    resolve_catalog_token, resolve_inference_api_key, CATALOG_TOKEN_ENV, INFERENCE_API_KEY_ENV,
};
use lyricmood_common::config::TomlConfig;
use lyricmood_common::Error;
use serial_test::serial;
use std::env;

fn config_from(toml_text: &str) -> TomlConfig {
    toml::from_str(toml_text).unwrap()
}

// ============================================================================
// Priority
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_toml() {
    env::set_var(CATALOG_TOKEN_ENV, "env-token");
    let config = config_from("[catalog]\naccess_token = \"toml-token\"\n");

    let token = resolve_catalog_token(&config).unwrap();

    env::remove_var(CATALOG_TOKEN_ENV);
    assert_eq!(token, "env-token");
}

#[test]
#[serial]
fn test_toml_used_when_env_missing() {
    env::remove_var(INFERENCE_API_KEY_ENV);
    let config = config_from("[inference]\napi_key = \"  toml-key \"\n");

    assert_eq!(resolve_inference_api_key(&config).unwrap(), "toml-key");
}

#[test]
#[serial]
fn test_blank_env_value_is_ignored() {
    env::set_var(CATALOG_TOKEN_ENV, "   ");
    let config = config_from("[catalog]\naccess_token = \"toml-token\"\n");

    let token = resolve_catalog_token(&config).unwrap();

    env::remove_var(CATALOG_TOKEN_ENV);
    assert_eq!(token, "toml-token");
}

// ============================================================================
// Missing credentials
// ============================================================================

#[test]
#[serial]
fn test_missing_key_is_config_error_with_guidance() {
    env::remove_var(INFERENCE_API_KEY_ENV);
    let config = TomlConfig::default();

    match resolve_inference_api_key(&config) {
        Err(Error::Config(message)) => {
            assert!(message.contains(INFERENCE_API_KEY_ENV));
            assert!(message.contains("[inference] api_key"));
        }
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_blank_toml_key_counts_as_missing() {
    env::remove_var(CATALOG_TOKEN_ENV);
    let config = config_from("[catalog]\naccess_token = \"\"\n");

    assert!(matches!(
        resolve_catalog_token(&config),
        Err(Error::Config(_))
    ));
}
