//! Tool settings for runlayout.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment. Settings live in
//! `~/.config/runlayout/config.toml` and/or `.runlayout/config.toml` in the
//! workspace directory. These are settings of the tool itself; the run
//! configs it lays out are loaded by [`crate::config::load_run_config`].

use crate::revision::GitRevision;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Revision probe configuration.
    #[serde(default)]
    pub revision: RevisionSettings,
    /// Defaults for run layouts.
    #[serde(default)]
    pub layout: LayoutDefaults,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// How the source revision is looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionSettings {
    /// Git executable.
    #[serde(default = "default_git_program")]
    pub program: String,
    /// Maximum time to wait for the lookup (seconds).
    #[serde(default = "default_revision_timeout")]
    pub timeout_secs: u64,
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self {
            program: default_git_program(),
            timeout_secs: default_revision_timeout(),
        }
    }
}

impl RevisionSettings {
    pub fn probe(&self) -> GitRevision {
        GitRevision::new()
            .with_program(self.program.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_revision_timeout() -> u64 {
    10
}

/// Layout defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDefaults {
    /// Project directory name used when none is given on the command line.
    #[serde(default = "default_project")]
    pub default_project: String,
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            default_project: default_project(),
        }
    }
}

fn default_project() -> String {
    "default".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Directory for daily-rolled JSON logs. Unset disables file logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_log_dir: Option<PathBuf>,
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "runlayout", "runlayout")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load settings from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `RUNLAYOUT_`, `__` nests)
/// 2. Workspace-local config (`.runlayout/config.toml`)
/// 3. User config (`~/.config/runlayout/config.toml`)
/// 4. Built-in defaults
pub fn load_settings(workspace: Option<&Path>) -> Result<LayoutSettings, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(LayoutSettings::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".runlayout").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // RUNLAYOUT_REVISION__TIMEOUT_SECS, RUNLAYOUT_LOGGING__JSON_LOG_DIR, ...
    figment = figment.merge(Env::prefixed("RUNLAYOUT_").split("__"));

    figment.extract().map_err(Box::new)
}
