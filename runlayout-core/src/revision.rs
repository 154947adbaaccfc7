//! Best-effort source revision lookup.
//!
//! The default probe runs `git rev-parse HEAD` with a hard timeout. The
//! lookup is synchronous for callers; internally it drives the child on a
//! single-threaded tokio runtime so the timeout, output draining, and kill on
//! expiry come from `tokio::process` and `tokio::time`. Failures are reported
//! as [`RevisionError`] so callers can tell a missing tool from a
//! non-repository directory; the layout builder masks all of them as
//! [`UNKNOWN_REVISION`].

use crate::error::RevisionError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Value reported when no revision could be determined.
pub const UNKNOWN_REVISION: &str = "unknown";

/// Default upper bound for a revision lookup.
pub const DEFAULT_REVISION_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of a revision identifier for the working tree at `workdir`
/// (or the process working directory when `None`).
pub trait RevisionProbe {
    fn lookup(&self, workdir: Option<&Path>) -> Result<String, RevisionError>;
}

/// Revision probe backed by an external command, `git rev-parse HEAD` by default.
///
/// [`RevisionProbe::lookup`] builds its own runtime, so it must not be called
/// from inside an async context.
#[derive(Debug, Clone)]
pub struct GitRevision {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Default for GitRevision {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            args: vec!["rev-parse".to_string(), "HEAD".to_string()],
            timeout: DEFAULT_REVISION_TIMEOUT,
        }
    }
}

impl GitRevision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `program` as the git executable, keeping the `rev-parse HEAD` arguments.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Replace the whole command line.
    pub fn with_command<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Upper bound for the lookup. Durations too large to form a deadline
    /// mean the lookup waits for the child to exit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, workdir: Option<&Path>) -> Result<String, RevisionError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| RevisionError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Dropping the output future on expiry drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RevisionError::Timeout {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| RevisionError::Wait {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RevisionError::NonZeroExit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !output.stdout.is_ascii() {
            return Err(RevisionError::Decode);
        }
        let stdout = String::from_utf8(output.stdout).map_err(|_| RevisionError::Decode)?;
        Ok(stdout.trim().to_string())
    }
}

impl RevisionProbe for GitRevision {
    fn lookup(&self, workdir: Option<&Path>) -> Result<String, RevisionError> {
        debug!(program = %self.program, args = ?self.args, "Looking up source revision");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RevisionError::Runtime)?;
        runtime.block_on(self.run(workdir))
    }
}

/// A fixed answer, for callers that already know their revision.
#[derive(Debug, Clone)]
pub struct StaticRevision(pub String);

impl RevisionProbe for StaticRevision {
    fn lookup(&self, _workdir: Option<&Path>) -> Result<String, RevisionError> {
        Ok(self.0.clone())
    }
}
