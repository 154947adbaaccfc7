//! Run-name derivation.
//!
//! The run directory name is a pure function of seven hyperparameters, in a
//! fixed order: `lr, wd, ep, bs, act, opt, lrsched`. Nothing else in the
//! config influences it.

use crate::config::{ParamValue, RunConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Task name that redirects output to a local `debug` directory.
pub const DEBUG_TASK: &str = "debug";

/// Separator between run-name tokens and between name components.
pub const TOKEN_SEPARATOR: &str = "_";

/// Labels of the run-name tokens, in the order they appear.
pub const TOKEN_LABELS: [&str; 7] = ["lr", "wd", "ep", "bs", "act", "opt", "lrsched"];

/// Result of run-name derivation. Recomputed on every call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedConfig {
    /// `debug` for debug runs, otherwise `paths.output_dir` (absent if unset).
    pub base_dir: Option<PathBuf>,
    /// Reserved name component. Nothing populates it yet.
    pub task_model: Option<String>,
    /// Reserved. Nothing populates it yet.
    pub extra: Option<String>,
    /// Reserved. Nothing populates it yet.
    pub training_mode: Option<String>,
    /// `_`-joined hyperparameter tokens.
    pub params: String,
    /// Directory component for the run. Empty when no token could be built.
    pub dir_name: String,
}

/// Derive the run name from `cfg`.
pub fn derive_run_name(cfg: &RunConfig) -> DerivedConfig {
    let base_dir = if cfg.task_name == DEBUG_TASK {
        Some(PathBuf::from(DEBUG_TASK))
    } else {
        cfg.paths.output_dir.clone()
    };

    let params = join_present(param_tokens(cfg));

    let task_model: Option<String> = None;
    let dir_name = join_present([task_model.clone(), Some(params.clone())]);

    DerivedConfig {
        base_dir,
        task_model,
        extra: None,
        training_mode: None,
        params,
        dir_name,
    }
}

/// One token per label in [`TOKEN_LABELS`] order; `None` where the value is
/// absent. Present values always produce a token, even when they render empty.
pub fn param_tokens(cfg: &RunConfig) -> [Option<String>; 7] {
    let opt = &cfg.model.optimizer;
    let values = [
        opt.lr.as_ref().map(ParamValue::to_string),
        opt.weight_decay.as_ref().map(ParamValue::to_string),
        cfg.trainer.max_epochs.as_ref().map(ParamValue::to_string),
        cfg.data.train_batch_size.as_ref().map(ParamValue::to_string),
        cfg.model.net.activation.as_ref().map(ParamValue::to_string),
        opt.target.as_deref().map(class_name),
        cfg.model.scheduler.target.as_deref().map(class_name),
    ];

    let mut tokens: [Option<String>; 7] = Default::default();
    for ((slot, label), value) in tokens.iter_mut().zip(TOKEN_LABELS).zip(values) {
        *slot = value.map(|v| format!("{label}-{v}"));
    }
    tokens
}

/// Final `.`-separated segment of a fully-qualified class identifier.
/// A trailing `.` yields an empty segment.
pub fn class_name(target: &str) -> String {
    target.rsplit('.').next().unwrap_or_default().to_string()
}

fn join_present<I>(parts: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    parts
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(TOKEN_SEPARATOR)
}
