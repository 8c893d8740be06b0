//! Configuration CLI command handlers

use std::path::PathBuf;

use crate::cli::api::{effective_config, ClientOptions};
use crate::cli::commands::{ConfigCommand, ConfigKey};
use crate::core::config::Config;
use crate::error::{GhApiError, Result};
use crate::github::request::RequestBuilder;

/// Handle configuration commands
pub fn handle_config(options: &ClientOptions, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Set { key, value } => handle_set(key, value),
        ConfigCommand::Get { key } => handle_get(options, key),
        ConfigCommand::Remove { key } => handle_remove(key),
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

/// Handle setting a configuration value
fn handle_set(key: ConfigKey, value: String) -> Result<()> {
    let mut config = Config::load()?;
    apply(&mut config, key, &value)?;
    config.save()?;
    println!("{} set to: {}", key_name(key), display_value(&config, key)?);
    Ok(())
}

/// Handle getting a configuration value, with command-line overrides applied
fn handle_get(options: &ClientOptions, key: ConfigKey) -> Result<()> {
    let config = effective_config(options)?;
    println!("{}: {}", key_name(key), display_value(&config, key)?);
    Ok(())
}

/// Handle resetting a configuration value
fn handle_remove(key: ConfigKey) -> Result<()> {
    let mut config = Config::load()?;
    let defaults = Config::default();
    match key {
        ConfigKey::ApiUrl => config.api_url = defaults.api_url,
        ConfigKey::RepoStorage => config.repo_storage = None,
        ConfigKey::HttpTimeout => config.http_timeout_secs = defaults.http_timeout_secs,
        ConfigKey::HelperTimeout => {
            config.credential_helper_timeout_secs = defaults.credential_helper_timeout_secs
        }
    }
    config.save()?;
    println!(
        "{} reset to default: {}",
        key_name(key),
        display_value(&config, key)?
    );
    Ok(())
}

/// Validate `value` and store it under `key`
fn apply(config: &mut Config, key: ConfigKey, value: &str) -> Result<()> {
    match key {
        ConfigKey::ApiUrl => {
            RequestBuilder::new(value)?;
            config.api_url = value.to_string();
        }
        ConfigKey::RepoStorage => config.repo_storage = Some(PathBuf::from(value)),
        ConfigKey::HttpTimeout => config.http_timeout_secs = parse_seconds(value)?,
        ConfigKey::HelperTimeout => config.credential_helper_timeout_secs = parse_seconds(value)?,
    }
    Ok(())
}

fn parse_seconds(value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(GhApiError::InvalidInput(format!(
            "Invalid timeout '{}'. Expected a positive number of seconds.",
            value
        ))),
    }
}

fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::ApiUrl => "API URL",
        ConfigKey::RepoStorage => "Repository storage",
        ConfigKey::HttpTimeout => "HTTP timeout",
        ConfigKey::HelperTimeout => "Credential helper timeout",
    }
}

fn display_value(config: &Config, key: ConfigKey) -> Result<String> {
    Ok(match key {
        ConfigKey::ApiUrl => config.api_url.clone(),
        ConfigKey::RepoStorage => config.repo_storage()?.display().to_string(),
        ConfigKey::HttpTimeout => format!("{}s", config.http_timeout_secs),
        ConfigKey::HelperTimeout => format!("{}s", config.credential_helper_timeout_secs),
    })
}
