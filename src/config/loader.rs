//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use super::CloakConfig;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CLOAKLINE_CONFIG";

/// Environment variable overriding the slack ratio.
pub const SLACK_RATIO_ENV: &str = "CLOAKLINE_SLACK_RATIO";

/// Environment variable overriding the debounce window in milliseconds.
pub const DEBOUNCE_MS_ENV: &str = "CLOAKLINE_DEBOUNCE_MS";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (permission issues, not a file, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, defaults are used.
/// Corresponds to `~/.config/cloakline/config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// View identifier mounted for uncloaked items.
    #[serde(default)]
    pub cloak_view: Option<String>,

    /// Per-item controller name.
    #[serde(default)]
    pub item_controller: Option<String>,

    /// Bind render targets as `content` rather than `context`.
    #[serde(default)]
    pub preserves_context: Option<bool>,

    /// Placeholder width for unmeasured slots.
    #[serde(default)]
    pub default_width: Option<f64>,

    /// Slack as a multiple of the viewport width.
    #[serde(default)]
    pub slack_ratio: Option<f64>,

    /// Uncloak items on creation.
    #[serde(default)]
    pub uncloak_default: Option<bool>,

    /// Selector of a fixed element occluding the viewport's left edge.
    #[serde(default)]
    pub offset_fixed: Option<String>,

    /// Loading indicator markup.
    #[serde(default)]
    pub loading_html: Option<String>,

    /// Content property used to derive element ids.
    #[serde(default)]
    pub id_property: Option<String>,

    /// Debounce window in milliseconds.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Engine configuration.
    pub cloak: CloakConfig,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            cloak: CloakConfig::default(),
            log_file_path: default_log_path(),
        }
    }
}

/// Overrides taken from command-line flags. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    /// `--slack-ratio`
    pub slack_ratio: Option<f64>,
    /// `--uncloak-default`
    pub uncloak_default: Option<bool>,
    /// `--debounce-ms`
    pub debounce_ms: Option<u64>,
    /// `--log-file`
    pub log_file_path: Option<PathBuf>,
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/cloakline/cloakline.log` on Unix-like systems,
/// or the platform equivalent. Falls back to the current directory when no
/// state directory is known.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("cloakline").join("cloakline.log")
    } else {
        PathBuf::from("cloakline.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/cloakline/config.toml` on Unix, the platform equivalent
/// elsewhere, or `None` if no config directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cloakline").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `CLOAKLINE_CONFIG` environment variable
/// 3. Default path `~/.config/cloakline/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(file) = config_file else {
        return defaults;
    };

    let base = defaults.cloak;
    let cloak = CloakConfig {
        cloak_view: file.cloak_view.unwrap_or(base.cloak_view),
        item_controller: file.item_controller.or(base.item_controller),
        preserves_context: file.preserves_context.unwrap_or(base.preserves_context),
        default_width: file.default_width.unwrap_or(base.default_width),
        slack_ratio: file.slack_ratio.unwrap_or(base.slack_ratio),
        uncloak_default: file.uncloak_default.unwrap_or(base.uncloak_default),
        offset_fixed: file.offset_fixed.or(base.offset_fixed),
        loading_html: file.loading_html.or(base.loading_html),
        id_property: file.id_property.or(base.id_property),
        debounce: file
            .debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(base.debounce),
    };

    ResolvedConfig {
        cloak,
        log_file_path: file.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `CLOAKLINE_SLACK_RATIO` and `CLOAKLINE_DEBOUNCE_MS`. Unparseable
/// values are logged and ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(raw) = std::env::var(SLACK_RATIO_ENV) {
        match raw.trim().parse::<f64>() {
            Ok(ratio) => config.cloak.slack_ratio = ratio,
            Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid {}", SLACK_RATIO_ENV),
        }
    }

    if let Ok(raw) = std::env::var(DEBOUNCE_MS_ENV) {
        match raw.trim().parse::<u64>() {
            Ok(ms) => config.cloak.debounce = Duration::from_millis(ms),
            Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid {}", DEBOUNCE_MS_ENV),
        }
    }

    config
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence; only flags that were given apply.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, overrides: CliOverrides) -> ResolvedConfig {
    if let Some(ratio) = overrides.slack_ratio {
        config.cloak.slack_ratio = ratio;
    }

    if let Some(uncloak) = overrides.uncloak_default {
        config.cloak.uncloak_default = uncloak;
    }

    if let Some(ms) = overrides.debounce_ms {
        config.cloak.debounce = Duration::from_millis(ms);
    }

    if let Some(path) = overrides.log_file_path {
        config.log_file_path = path;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
