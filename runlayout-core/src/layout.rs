//! Experiment layout builder.
//!
//! Turns a [`RunConfig`] into a directory tree:
//!
//! ```text
//! <base_dir>/<dir_name>/<project_name>/
//!   models/
//!   outputs/
//!   metadata.json
//! ```
//!
//! All operations are synchronous. Directory creation is idempotent; nothing
//! is rolled back when a later step fails.

use crate::config::RunConfig;
use crate::error::LayoutError;
use crate::metadata;
use crate::naming::{self, DerivedConfig};
use crate::revision::{GitRevision, RevisionProbe, UNKNOWN_REVISION};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{Dispatch, debug, error, info, warn};

/// Subdirectories created under every run directory, in creation order.
pub const RUN_SUBDIRECTORIES: [&str; 2] = ["models", "outputs"];

/// Paths produced by [`ExperimentLayoutBuilder::build_layout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunLayout {
    pub main_dir: PathBuf,
    pub subdirs: BTreeMap<&'static str, PathBuf>,
    pub metadata_path: PathBuf,
}

impl RunLayout {
    pub fn subdir(&self, name: &str) -> Option<&Path> {
        self.subdirs.get(name).map(PathBuf::as_path)
    }

    pub fn models_dir(&self) -> Option<&Path> {
        self.subdir("models")
    }

    pub fn outputs_dir(&self) -> Option<&Path> {
        self.subdir("outputs")
    }
}

/// Derives run names and provisions run directories for one run config.
pub struct ExperimentLayoutBuilder<'a> {
    config: &'a RunConfig,
    working_dir: Option<PathBuf>,
    revision: Box<dyn RevisionProbe + 'a>,
    dispatch: Dispatch,
}

impl<'a> ExperimentLayoutBuilder<'a> {
    /// Borrow `config` for the builder's lifetime. Nothing is validated here.
    ///
    /// Logs go to the dispatcher that is current at construction time.
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            working_dir: None,
            revision: Box::new(GitRevision::default()),
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
        }
    }

    /// Resolve relative paths (including a `debug` base dir) against `dir`
    /// instead of the process working directory. Also used as the directory
    /// the revision probe runs in.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_revision_probe(mut self, probe: impl RevisionProbe + 'a) -> Self {
        self.revision = Box::new(probe);
        self
    }

    /// Send this builder's log events to `dispatch`.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn config(&self) -> &RunConfig {
        self.config
    }

    /// Current source revision, or `"unknown"` if it cannot be determined.
    pub fn get_revision_identifier(&self) -> String {
        tracing::dispatcher::with_default(&self.dispatch, || {
            match self.revision.lookup(self.working_dir.as_deref()) {
                Ok(rev) => {
                    debug!(revision = %rev, "Resolved source revision");
                    rev
                }
                Err(e) => {
                    error!(error = %e, "Error obtaining revision identifier");
                    UNKNOWN_REVISION.to_string()
                }
            }
        })
    }

    /// Create `path` and any missing ancestors. Existing directories are fine.
    pub fn ensure_directory(&self, path: &Path) -> Result<PathBuf, LayoutError> {
        let path = self.resolve(path);
        tracing::dispatcher::with_default(&self.dispatch, || {
            match std::fs::create_dir_all(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Directory ready");
                    Ok(path)
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Error creating directory");
                    Err(LayoutError::provisioning(&path, e))
                }
            }
        })
    }

    /// Ensure `root/models` and `root/outputs`. Stops at the first failure;
    /// directories created before it are left in place.
    pub fn create_run_subdirectories(
        &self,
        root: &Path,
    ) -> Result<BTreeMap<&'static str, PathBuf>, LayoutError> {
        let mut paths = BTreeMap::new();
        for name in RUN_SUBDIRECTORIES {
            let dir = self.ensure_directory(&root.join(name))?;
            paths.insert(name, dir);
        }
        Ok(paths)
    }

    /// Derive the run name from the config's naming hyperparameters.
    pub fn derive_run_name(&self) -> DerivedConfig {
        let derived = naming::derive_run_name(self.config);
        if derived.dir_name.is_empty() {
            tracing::dispatcher::with_default(&self.dispatch, || {
                warn!(
                    "No naming hyperparameters set; run directory has no distinguishing name \
                     and will be shared with every other unnamed run"
                );
            });
        }
        derived
    }

    /// Write the full config to `output_dir/metadata.json`.
    pub fn persist_metadata(&self, output_dir: &Path) -> Result<PathBuf, LayoutError> {
        let output_dir = self.resolve(output_dir);
        tracing::dispatcher::with_default(&self.dispatch, || {
            metadata::persist_metadata(self.config, &output_dir)
        })
    }

    /// Derive the run name, create `<base_dir>/<dir_name>/<project_name>`
    /// with its subdirectories, and snapshot the config into it.
    ///
    /// An empty `dir_name` collapses the path to `<base_dir>/<project_name>`.
    pub fn build_layout(&self, project_name: &str) -> Result<RunLayout, LayoutError> {
        let derived = self.derive_run_name();
        let base_dir = derived.base_dir.as_deref().ok_or_else(|| {
            LayoutError::config(format!(
                "paths.output_dir is required for task '{}'",
                self.config.task_name
            ))
        })?;

        let mut main_dir = base_dir.to_path_buf();
        if !derived.dir_name.is_empty() {
            main_dir.push(&derived.dir_name);
        }
        main_dir.push(project_name);

        let main_dir = self.ensure_directory(&main_dir)?;
        let subdirs = self.create_run_subdirectories(&main_dir)?;
        let metadata_path = self.persist_metadata(&main_dir)?;

        tracing::dispatcher::with_default(&self.dispatch, || {
            info!(
                main_dir = %main_dir.display(),
                run = %derived.dir_name,
                project = project_name,
                "Run layout ready"
            );
        });

        Ok(RunLayout {
            main_dir,
            subdirs,
            metadata_path,
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.working_dir {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}
