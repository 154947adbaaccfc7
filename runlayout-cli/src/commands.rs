//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use anyhow::Context;
use runlayout_core::{
    DerivedConfig, ExperimentLayoutBuilder, LayoutSettings, METADATA_FILE, Override, RunConfig,
    RunLayout,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    settings: &LayoutSettings,
) -> anyhow::Result<()> {
    match command {
        Commands::Build {
            config,
            project,
            overrides,
            json,
        } => handle_build(&config, project, &overrides, json, workspace, settings),
        Commands::Name { config, overrides } => handle_name(&config, &overrides),
        Commands::Revision => {
            let cfg = RunConfig::default();
            let builder = ExperimentLayoutBuilder::new(&cfg)
                .with_working_dir(workspace)
                .with_revision_probe(settings.revision.probe());
            println!("{}", builder.get_revision_identifier());
            Ok(())
        }
        Commands::Show { path } => handle_show(&path),
        Commands::Config { action } => handle_config(action, workspace),
    }
}

/// Summary of a `build` run.
#[derive(Debug, Serialize)]
struct BuildReport {
    #[serde(flatten)]
    layout: RunLayout,
    run_name: String,
    revision: String,
}

fn load(config: &Path, overrides: &[Override]) -> anyhow::Result<RunConfig> {
    runlayout_core::load_run_config(config, overrides)
        .with_context(|| format!("Failed to load run config {}", config.display()))
}

fn build(
    config: &Path,
    project: Option<String>,
    overrides: &[Override],
    workspace: &Path,
    settings: &LayoutSettings,
) -> anyhow::Result<BuildReport> {
    let cfg = load(config, overrides)?;
    let project = project.unwrap_or_else(|| settings.layout.default_project.clone());

    let builder = ExperimentLayoutBuilder::new(&cfg)
        .with_working_dir(workspace)
        .with_revision_probe(settings.revision.probe());

    let layout = builder
        .build_layout(&project)
        .context("Failed to build run layout")?;
    let run_name = builder.derive_run_name().dir_name;
    let revision = builder.get_revision_identifier();

    Ok(BuildReport {
        layout,
        run_name,
        revision,
    })
}

fn handle_build(
    config: &Path,
    project: Option<String>,
    overrides: &[Override],
    json: bool,
    workspace: &Path,
    settings: &LayoutSettings,
) -> anyhow::Result<()> {
    let report = build(config, project, overrides, workspace, settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Run directory: {}", report.layout.main_dir.display());
    for (name, path) in &report.layout.subdirs {
        println!("  {name:<8} {}", path.display());
    }
    println!("  metadata {}", report.layout.metadata_path.display());
    println!("Revision: {}", report.revision);
    Ok(())
}

fn derive(config: &Path, overrides: &[Override]) -> anyhow::Result<DerivedConfig> {
    let cfg = load(config, overrides)?;
    Ok(ExperimentLayoutBuilder::new(&cfg).derive_run_name())
}

fn handle_name(config: &Path, overrides: &[Override]) -> anyhow::Result<()> {
    let derived = derive(config, overrides)?;
    println!("{}", serde_json::to_string_pretty(&derived)?);
    Ok(())
}

/// Accept either a snapshot file or the run directory that holds it.
fn metadata_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(METADATA_FILE)
    } else {
        path.to_path_buf()
    }
}

fn handle_show(path: &Path) -> anyhow::Result<()> {
    let path = metadata_path(path);
    let cfg = runlayout_core::load_metadata(&path)?;
    print!("{}", serde_yaml::to_string(&cfg)?);
    Ok(())
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = init_settings(workspace)?;
            println!("Settings file: {}", config_path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let settings = runlayout_core::load_settings(Some(workspace))
                .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}

/// Write default settings to `<workspace>/.runlayout/config.toml` unless the
/// file already exists.
fn init_settings(workspace: &Path) -> anyhow::Result<PathBuf> {
    let config_dir = workspace.join(".runlayout");
    std::fs::create_dir_all(&config_dir)?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "Settings file already exists");
        return Ok(config_path);
    }

    let toml_str = toml::to_string_pretty(&LayoutSettings::default())?;
    std::fs::write(&config_path, &toml_str)?;
    tracing::info!(path = %config_path.display(), "Created default settings");
    Ok(config_path)
}
