//! # runlayout-core — Output Layouts for Training Runs
//!
//! Derives a deterministic run name from a run's hyperparameters, creates the
//! run directory tree, snapshots the full run config into it, and looks up
//! the source revision for provenance.
//!
//! ```text
//! <base_dir>/<dir_name>/<project_name>/
//!   models/
//!   outputs/
//!   metadata.json
//! ```
//!
//! Everything is synchronous. Directory provisioning and metadata writes
//! fail loudly ([`LayoutError`]); the revision lookup never fails and
//! degrades to `"unknown"`.

pub mod config;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod naming;
pub mod revision;
pub mod settings;

// Re-exports
pub use config::{Override, ParamValue, RunConfig, load_run_config};
pub use error::{LayoutError, RevisionError};
pub use layout::{ExperimentLayoutBuilder, RUN_SUBDIRECTORIES, RunLayout};
pub use metadata::{METADATA_FILE, load_metadata, persist_metadata};
pub use naming::{DerivedConfig, derive_run_name};
pub use revision::{GitRevision, RevisionProbe, StaticRevision, UNKNOWN_REVISION};
pub use settings::{LayoutSettings, load_settings};
