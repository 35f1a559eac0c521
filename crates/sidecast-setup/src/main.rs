//! Sidecast setup orchestrator — entry point.
//!
//! Provisions the environment for the phone-as-second-monitor rig and
//! launches the streaming server, or tears the virtual-display driver back
//! out.  All of the work happens in ordered, blocking stages; see
//! `application::bootstrap` for the stage table.
//!
//! # Usage
//!
//! ```text
//! sidecast-setup [OPTIONS] [COMMAND]
//!
//! Commands:
//!   run      Provision the environment and launch the streaming server (default)
//!   cleanup  Remove the virtual display driver's hardware nodes
//!
//! Options:
//!   --config <FILE>    TOML configuration file [default: sidecast.toml]
//!   --wireless         Direct LAN connection instead of USB reverse tunnels
//!   --fps <N>          Target frame rate [default: 60]
//!   --display <N>      Index of the captured display [default: 2]
//!   --quality <N>      JPEG encoding quality 1-100 [default: 100]
//!   --adaptive         Let the server adapt quality to measured bandwidth
//!   --bandwidth <N>    Bandwidth ceiling in KB/s [default: 500000]
//! ```
//!
//! # Environment variable overrides
//!
//! Every option can also be set through an environment variable; CLI args
//! take precedence when both are present.
//!
//! | Variable             | Option        |
//! |----------------------|---------------|
//! | `SIDECAST_CONFIG`    | `--config`    |
//! | `SIDECAST_WIRELESS`  | `--wireless`  |
//! | `SIDECAST_FPS`       | `--fps`       |
//! | `SIDECAST_DISPLAY`   | `--display`   |
//! | `SIDECAST_QUALITY`   | `--quality`   |
//! | `SIDECAST_ADAPTIVE`  | `--adaptive`  |
//! | `SIDECAST_BANDWIDTH` | `--bandwidth` |
//!
//! # Exit code
//!
//! `0` on full success or warning-only completion, `1` on any fatal stage.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sidecast_core::RunReport;
use sidecast_setup::application::BootstrapPipeline;
use sidecast_setup::infrastructure::display::current_process_is_elevated;
use sidecast_setup::infrastructure::process::{SystemCommandRunner, ToolSearchPath};
use sidecast_setup::infrastructure::storage::config::{load_config, SetupConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Sidecast setup orchestrator.
///
/// Installs/verifies dependencies, clears stale virtual display nodes, sets
/// up USB reverse tunnels, deploys the client app, and launches the
/// streaming server.
#[derive(Debug, Parser)]
#[command(
    name = "sidecast-setup",
    about = "Bootstrap and teardown for the Sidecast phone-as-second-monitor rig",
    version
)]
struct Cli {
    /// TOML configuration file, resolved against the working directory.
    #[arg(long, default_value = "sidecast.toml", env = "SIDECAST_CONFIG")]
    config: PathBuf,

    /// Use a direct LAN connection instead of USB reverse tunnels.
    #[arg(long, env = "SIDECAST_WIRELESS")]
    wireless: bool,

    /// Target frame rate passed to the streaming server.
    #[arg(long, env = "SIDECAST_FPS")]
    fps: Option<u32>,

    /// Index of the display the server captures.
    #[arg(long, env = "SIDECAST_DISPLAY")]
    display: Option<u32>,

    /// JPEG encoding quality, 1–100.
    #[arg(long, env = "SIDECAST_QUALITY")]
    quality: Option<u8>,

    /// Let the server adapt quality to the measured bandwidth.
    #[arg(long, env = "SIDECAST_ADAPTIVE")]
    adaptive: bool,

    /// Bandwidth ceiling in KB/s.
    #[arg(long, env = "SIDECAST_BANDWIDTH")]
    bandwidth: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Provision the environment and launch the streaming server (default).
    Run,
    /// Tear down: remove the virtual display driver's hardware nodes.
    Cleanup,
}

impl Cli {
    /// Applies the CLI overrides on top of the loaded configuration file.
    ///
    /// Only options the user actually passed are applied; everything else
    /// keeps the file's (or default) value.
    fn apply_overrides(&self, config: &mut SetupConfig) {
        if self.wireless {
            config.server.wireless = true;
        }
        if self.adaptive {
            config.server.adaptive = true;
        }
        if let Some(fps) = self.fps {
            config.server.fps = fps;
        }
        if let Some(display) = self.display {
            config.server.display_index = display;
        }
        if let Some(quality) = self.quality {
            config.server.quality = quality;
        }
        if let Some(bandwidth) = self.bandwidth {
            config.server.bandwidth_kbps = bandwidth;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let workdir = std::env::current_dir().context("cannot determine the working directory")?;
    let config_path = workdir.join(&cli.config);
    let mut config = load_config(&config_path)
        .with_context(|| format!("cannot load configuration from {}", config_path.display()))?;
    cli.apply_overrides(&mut config);

    // The tool-search list and elevation state are computed once per run and
    // passed into the pipeline explicitly.
    let search = ToolSearchPath::from_environment(&workdir);
    let elevated = current_process_is_elevated();
    let runner = SystemCommandRunner;

    info!(workdir = %workdir.display(), elevated, "sidecast-setup starting");

    let mut pipeline = BootstrapPipeline::new(&runner, config, workdir, search, elevated);
    let report = match cli.command.unwrap_or(Command::Run) {
        Command::Run => pipeline.run().await,
        Command::Cleanup => pipeline.cleanup().await,
    };

    summarize(&report);
    std::process::exit(report.exit_code());
}

/// Final recap so the outcome is visible even after a long server session.
fn summarize(report: &RunReport) {
    for stage in report.warnings() {
        if let Some(detail) = stage.status.message() {
            warn!(stage = %stage.name, detail, "completed with warning");
        }
    }
    match report.fatal() {
        Some(stage) => {
            if let Some(detail) = stage.status.message() {
                error!(stage = %stage.name, detail, "run aborted");
            }
        }
        None => info!("run complete"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_leave_profile_untouched() {
        // Arrange: parse with no arguments (all defaults apply).
        let cli = Cli::parse_from(["sidecast-setup"]);

        // Act
        let mut config = SetupConfig::default();
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config, SetupConfig::default());
    }

    #[test]
    fn test_cli_default_config_file_name() {
        let cli = Cli::parse_from(["sidecast-setup"]);
        assert_eq!(cli.config, PathBuf::from("sidecast.toml"));
    }

    #[test]
    fn test_cli_default_command_is_none() {
        let cli = Cli::parse_from(["sidecast-setup"]);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_cleanup_subcommand_parses() {
        let cli = Cli::parse_from(["sidecast-setup", "cleanup"]);
        assert_eq!(cli.command, Some(Command::Cleanup));
    }

    #[test]
    fn test_cli_fps_override_applies() {
        let cli = Cli::parse_from(["sidecast-setup", "--fps", "30"]);
        let mut config = SetupConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.fps, 30);
        // Untouched siblings keep their defaults.
        assert_eq!(config.server.quality, 100);
    }

    #[test]
    fn test_cli_display_override_applies() {
        let cli = Cli::parse_from(["sidecast-setup", "--display", "1"]);
        let mut config = SetupConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.display_index, 1);
    }

    #[test]
    fn test_cli_wireless_and_adaptive_flags_apply() {
        let cli = Cli::parse_from(["sidecast-setup", "--wireless", "--adaptive"]);
        let mut config = SetupConfig::default();
        cli.apply_overrides(&mut config);
        assert!(config.server.wireless);
        assert!(config.server.adaptive);
    }

    #[test]
    fn test_cli_bandwidth_and_quality_overrides_apply() {
        let cli = Cli::parse_from([
            "sidecast-setup",
            "--quality",
            "70",
            "--bandwidth",
            "3000",
        ]);
        let mut config = SetupConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.quality, 70);
        assert_eq!(config.server.bandwidth_kbps, 3000);
    }

    #[test]
    fn test_cli_options_compose_with_subcommand() {
        let cli = Cli::parse_from(["sidecast-setup", "--fps", "30", "run"]);
        assert_eq!(cli.fps, Some(30));
        assert_eq!(cli.command, Some(Command::Run));
    }
}
