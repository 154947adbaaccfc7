//! Error types for the runlayout-core crate.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors that abort layout provisioning.
///
/// Everything in here is fatal for `build_layout`: nothing is retried and
/// directories created before the failure stay on disk.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Failed to provision directory {}: {source}", .path.display())]
    Provisioning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write metadata {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read metadata {}: {source}", .path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LayoutError {
    pub fn provisioning(path: &Path, source: std::io::Error) -> Self {
        Self::Provisioning {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn metadata(path: &Path, source: std::io::Error) -> Self {
        Self::Metadata {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn metadata_read(path: &Path, source: std::io::Error) -> Self {
        Self::MetadataRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<figment::Error> for LayoutError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Failure modes of a revision lookup.
///
/// These never escape `ExperimentLayoutBuilder::get_revision_identifier`;
/// they are logged and replaced by [`crate::revision::UNKNOWN_REVISION`].
#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Revision output is not ASCII")]
    Decode,

    #[error("{program} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },

    #[error("Failed to start the process runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed while waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
