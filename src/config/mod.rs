//! Configuration module.
//!
//! [`CloakConfig`] is the engine-facing configuration surface. The `loader`
//! submodule resolves it from defaults, a TOML file, environment variables and
//! CLI arguments.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, CliOverrides, ConfigError,
    ConfigFile, ResolvedConfig,
};

use std::time::Duration;

/// Slack ratio used when none (or an unusable one) is configured.
pub const DEFAULT_SLACK_RATIO: f64 = 1.0;

/// Placeholder width for slots that have never been measured.
pub const DEFAULT_PLACEHOLDER_WIDTH: f64 = 100.0;

/// Debounce window for raw scroll signals.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);

/// Markup shown in the next slot waiting to be rendered.
pub const DEFAULT_LOADING_MARKUP: &str = "Loading...";

/// View identifier used when none is configured.
pub const DEFAULT_CLOAK_VIEW: &str = "item";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CloakConfig {
    /// Identifier of the view mounted for each uncloaked item.
    pub cloak_view: String,
    /// Per-item controller name; when set, items render through a controller.
    pub item_controller: Option<String>,
    /// Bind the render target as `content` instead of `context`.
    pub preserves_context: bool,
    /// Placeholder width for slots that measure zero on insertion.
    pub default_width: f64,
    /// Slack as a multiple of the viewport width.
    pub slack_ratio: f64,
    /// Uncloak items as soon as they are created.
    pub uncloak_default: bool,
    /// Selector of a fixed element occluding the left edge of the viewport.
    pub offset_fixed: Option<String>,
    /// Custom loading markup.
    pub loading_html: Option<String>,
    /// Content property used to derive element ids.
    pub id_property: Option<String>,
    /// Debounce window for raw signals.
    pub debounce: Duration,
}

impl Default for CloakConfig {
    fn default() -> Self {
        Self {
            cloak_view: DEFAULT_CLOAK_VIEW.to_string(),
            item_controller: None,
            preserves_context: false,
            default_width: DEFAULT_PLACEHOLDER_WIDTH,
            slack_ratio: DEFAULT_SLACK_RATIO,
            uncloak_default: false,
            offset_fixed: None,
            loading_html: None,
            id_property: None,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl CloakConfig {
    /// Default configuration for the given view.
    pub fn new(cloak_view: impl Into<String>) -> Self {
        Self {
            cloak_view: cloak_view.into(),
            ..Self::default()
        }
    }

    /// Slack ratio actually used by the engine.
    ///
    /// Zero, negative and non-finite ratios fall back to [`DEFAULT_SLACK_RATIO`].
    pub fn effective_slack_ratio(&self) -> f64 {
        sanitize_slack_ratio(self.slack_ratio)
    }

    /// Loading markup actually used by the engine.
    pub fn loading_markup(&self) -> &str {
        self.loading_html.as_deref().unwrap_or(DEFAULT_LOADING_MARKUP)
    }

    /// Element id for an item whose id property has the given value.
    pub fn element_id(&self, value: &str) -> String {
        format!("{}-cloak-{}", self.cloak_view, value)
    }
}

/// Replace an unusable slack ratio with the default.
pub fn sanitize_slack_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        DEFAULT_SLACK_RATIO
    }
}
