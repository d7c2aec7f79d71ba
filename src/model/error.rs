//! Error types for cloakline.
//!
//! The cloaking engine itself never fails: every detectable problem during a
//! recomputation pass degrades to a safe fallback. Errors only exist at the
//! fallible edges of the crate (configuration, scenario input, logging setup),
//! and non-fatal engine problems are surfaced as [`Diagnostic`] values.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error for the `cloakline` binary
//!   - [`ConfigError`] - Config file read/parse failures
//!   - [`ScenarioError`] - Scenario file read/parse failures
//!   - [`LoggingError`] - Tracing subscriber setup failures
//! - [`Diagnostic`] - Non-fatal engine conditions (recorded, logged, never raised)

use std::path::PathBuf;
use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::logging::LoggingError;

/// Top-level application error encompassing all failure modes of the binary.
///
/// Domain-specific errors convert via `From`, so the `?` operator composes
/// config loading, scenario loading and logging setup in `main`.
///
/// # Examples
///
/// ```no_run
/// use cloakline::model::error::{AppError, ScenarioError};
///
/// fn run() -> Result<(), AppError> {
///     load()?;
///     Ok(())
/// }
/// # fn load() -> Result<(), ScenarioError> { Ok(()) }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Scenario input could not be loaded.
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// Tracing subscriber could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// Writing pass records to stdout failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Errors encountered when loading a replay scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("Failed to read scenario at {path:?}: {source}")]
    Read {
        /// Path that failed to read (`-` for stdin).
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The scenario is not valid JSON or does not match the scenario schema.
    #[error("Invalid scenario in {path:?}: {source}")]
    Parse {
        /// Path with invalid contents.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The scenario declares a non-positive viewport width.
    #[error("Scenario viewport width must be positive (got {0})")]
    EmptyViewport(u32),
}

/// Non-fatal condition observed by the cloaking engine.
///
/// Diagnostics are logged with `tracing::warn!` and retained on the strip so
/// callers can inspect them; rendering always proceeds with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A configured per-item controller name was not registered with the host.
    #[error("can't look up controller by name \"controller:{name}\"; using a generated default")]
    ControllerFallback {
        /// The controller name that failed to resolve.
        name: String,
    },
}
