//! runlayout CLI — lay out output directories for training runs.
//!
//! Loads a run config, derives the run name, creates the directory tree and
//! writes the metadata snapshot.

mod commands;

use clap::Parser;
use runlayout_core::Override;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// runlayout: deterministic output directories for ML training runs
#[derive(Parser, Debug)]
#[command(name = "runlayout", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (relative run paths and `debug` runs land here)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create the run directory tree and write the metadata snapshot
    Build {
        /// Run config file (.yaml, .yml, .toml or .json)
        config: PathBuf,
        /// Project directory name (defaults to `layout.default_project`)
        #[arg(short, long)]
        project: Option<String>,
        /// Override a config value, e.g. `--set model.optimizer.lr=0.1`
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<Override>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the derived run name without touching the filesystem
    Name {
        /// Run config file (.yaml, .yml, .toml or .json)
        config: PathBuf,
        /// Override a config value, e.g. `--set trainer.max_epochs=20`
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<Override>,
    },
    /// Print the source revision of the workspace
    Revision,
    /// Print a metadata snapshot
    Show {
        /// Path to a metadata.json file or the run directory holding it
        path: PathBuf,
    },
    /// Manage runlayout settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default settings file in the workspace
    Init,
    /// Show the effective settings
    Show,
}

fn init_tracing(verbose: u8, quiet: bool, json_log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer on stderr; stdout carries command output
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    // Optional JSON file layer for structured logs
    let mut guard = None;
    let json_layer = json_log_dir.and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Cannot create log directory {}: {e}", dir.display());
            return None;
        }
        let file_appender = tracing_appender::rolling::daily(dir, "runlayout.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug")),
        )
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| cli.workspace.clone());

    let settings = runlayout_core::load_settings(Some(&workspace))
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let _guard = init_tracing(
        cli.verbose,
        cli.quiet,
        settings.logging.json_log_dir.as_deref(),
    );

    commands::handle_command(cli.command, &workspace, &settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_with_overrides() {
        let cli = Cli::try_parse_from([
            "runlayout",
            "build",
            "run.yaml",
            "--project",
            "mnist",
            "--set",
            "model.optimizer.lr=0.1",
            "-s",
            "trainer.max_epochs=20",
        ])
        .unwrap();

        match cli.command {
            Commands::Build {
                config,
                project,
                overrides,
                json,
            } => {
                assert_eq!(config, PathBuf::from("run.yaml"));
                assert_eq!(project.as_deref(), Some("mnist"));
                assert_eq!(overrides.len(), 2);
                assert_eq!(overrides[0].key, "model.optimizer.lr");
                assert_eq!(overrides[1].key, "trainer.max_epochs");
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_override() {
        let result = Cli::try_parse_from(["runlayout", "name", "run.yaml", "--set", "novalue"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["runlayout", "revision", "-vv", "-w", "/tmp"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.workspace, PathBuf::from("/tmp"));
        assert!(matches!(cli.command, Commands::Revision));
    }
}
