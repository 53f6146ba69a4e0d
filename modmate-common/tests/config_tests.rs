//! Configuration resolution and loading tests
//!
//! Note: Uses the serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MODMATE_CONFIG are marked with #[serial] so they
//! run sequentially, not in parallel.

use modmate_common::config::{resolve_config_path, BotConfig, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::Path;

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    env::set_var(CONFIG_ENV_VAR, "/from/env/config.toml");
    let path = resolve_config_path(Some(Path::new("/from/cli/config.toml"))).unwrap();
    assert_eq!(path, Path::new("/from/cli/config.toml"));
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_variable_is_second_priority() {
    env::set_var(CONFIG_ENV_VAR, "/from/env/config.toml");
    let path = resolve_config_path(None).unwrap();
    assert_eq!(path, Path::new("/from/env/config.toml"));
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_fallback_is_platform_config_dir() {
    env::remove_var(CONFIG_ENV_VAR);
    let path = resolve_config_path(None).unwrap();
    let text = path.to_string_lossy();
    assert!(text.contains("modmate"), "expected modmate dir in {text}");
    assert!(text.ends_with("config.toml"));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [bot]
        username = "modmate"
        subreddits = ["gadgets", "gadgetshelp"]
        aliases_path = "/data/aliases.json"
        leaderboard_document = "helper-leaderboard"
        backoff_secs = 45
        send_responses = false
        brand_word = "acme"

        [responses]
        footer = "^I am a bot."
        "#
    )
    .unwrap();

    let config = BotConfig::load(file.path()).unwrap();
    assert_eq!(config.bot.subreddits.len(), 2);
    assert_eq!(config.bot.backoff_secs, 45);
    assert!(!config.bot.send_responses);
    assert_eq!(config.bot.brand_word.as_deref(), Some("acme"));
    assert_eq!(config.responses["footer"], "^I am a bot.");
}

#[test]
fn test_missing_file_is_a_config_error() {
    let err = BotConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, modmate_common::Error::Config(_)));
}
