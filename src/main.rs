//! cloakline - Entry Point

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use cloakline::config::CliOverrides;
use cloakline::model::AppError;

/// cloakline - replay viewport scenarios against the cloaking engine
#[derive(Parser, Debug)]
#[command(name = "cloakline")]
#[command(version)]
#[command(about = "Replay a horizontal viewport scenario and print one JSON line per pass")]
pub struct Args {
    /// Path to a JSON scenario (reads from stdin if not provided or `-`)
    pub scenario: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Slack on each side of the viewport, as a multiple of its width
    #[arg(long)]
    pub slack_ratio: Option<f64>,

    /// Uncloak items as soon as they are created
    #[arg(long)]
    pub uncloak_default: bool,

    /// Debounce window for scroll signals, in milliseconds
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Write logs to this file instead of the default location
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            slack_ratio: self.slack_ratio,
            uncloak_default: self.uncloak_default.then_some(true),
            debounce_ms: self.debounce_ms,
            log_file_path: self.log_file.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    run(args)?;
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = cloakline::config::load_config_with_precedence(args.config.clone())?;
        let merged = cloakline::config::merge_config(config_file);
        let with_env = cloakline::config::apply_env_overrides(merged);
        cloakline::config::apply_cli_overrides(with_env, args.overrides())
    };

    cloakline::logging::init(&config.log_file_path)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let path = args.scenario.unwrap_or_else(|| PathBuf::from("-"));
    let scenario = cloakline::sim::load_scenario(&path)?;
    let outcome = cloakline::sim::run_scenario(&scenario, config.cloak);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for pass in &outcome.passes {
        let line = serde_json::to_string(pass).map_err(std::io::Error::from)?;
        writeln!(out, "{line}")?;
    }
    out.flush()?;

    for diagnostic in &outcome.diagnostics {
        warn!(%diagnostic, "engine diagnostic");
        eprintln!("warning: {diagnostic}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["cloakline", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["cloakline", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_args_defaults() {
        let args = Args::parse_from(["cloakline"]);
        assert_eq!(args.scenario, None);
        assert_eq!(args.config, None);
        assert_eq!(args.slack_ratio, None);
        assert!(!args.uncloak_default);
        assert_eq!(args.debounce_ms, None);
        assert_eq!(args.log_file, None);
    }

    #[test]
    fn test_scenario_path_populates_field() {
        let args = Args::parse_from(["cloakline", "scroll.json"]);
        assert_eq!(args.scenario, Some(PathBuf::from("scroll.json")));
    }

    #[test]
    fn test_slack_ratio_flag() {
        let args = Args::parse_from(["cloakline", "--slack-ratio", "0.5"]);
        assert_eq!(args.slack_ratio, Some(0.5));
    }

    #[test]
    fn test_slack_ratio_rejects_text() {
        let result = Args::try_parse_from(["cloakline", "--slack-ratio", "wide"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let args = Args::parse_from(["cloakline"]);
        assert_eq!(args.overrides(), CliOverrides::default());
    }

    #[test]
    fn test_combined_flags_become_overrides() {
        let args = Args::parse_from([
            "cloakline",
            "scenario.json",
            "--config",
            "/custom/config.toml",
            "--slack-ratio",
            "2",
            "--uncloak-default",
            "--debounce-ms",
            "25",
            "--log-file",
            "/tmp/cloakline.log",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(
            args.overrides(),
            CliOverrides {
                slack_ratio: Some(2.0),
                uncloak_default: Some(true),
                debounce_ms: Some(25),
                log_file_path: Some(PathBuf::from("/tmp/cloakline.log")),
            }
        );
    }

    #[test]
    fn test_cli_slack_ratio_flows_through_precedence_chain() {
        use cloakline::config::{apply_cli_overrides, apply_env_overrides, merge_config, ConfigFile};

        let config_file = ConfigFile {
            slack_ratio: Some(0.5),
            ..ConfigFile::default()
        };

        let merged = merge_config(Some(config_file));
        assert_eq!(merged.cloak.slack_ratio, 0.5);

        let args = Args::parse_from(["cloakline", "--slack-ratio", "3"]);
        let with_cli = apply_cli_overrides(apply_env_overrides(merged), args.overrides());
        assert_eq!(with_cli.cloak.slack_ratio, 3.0);
    }
}
