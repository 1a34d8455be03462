//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    base_url = %config.api.base_url,
    prefer_push = config.feed.prefer_push,
    polling_interval_ms = config.feed.polling_interval_ms,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // API validation
  anyhow::ensure!(
    !config.api.base_url.is_empty(),
    "API base URL must not be empty"
  );
  anyhow::ensure!(
    config.api.base_url.starts_with("http://") || config.api.base_url.starts_with("https://"),
    "API base URL must be http(s), got {}",
    config.api.base_url
  );
  anyhow::ensure!(
    config.api.status_path.starts_with('/'),
    "status_path must start with '/', got {}",
    config.api.status_path
  );
  anyhow::ensure!(
    config.api.ws_path.starts_with('/'),
    "ws_path must start with '/', got {}",
    config.api.ws_path
  );
  anyhow::ensure!(
    config.api.timeout_seconds > 0,
    "timeout_seconds must be positive"
  );
  anyhow::ensure!(
    !config.api.token_env.is_empty(),
    "token_env must name an environment variable"
  );

  // Feed validation
  config
    .feed
    .to_feed_config()
    .validate()
    .context("Invalid [feed] section")?;

  Ok(())
}
