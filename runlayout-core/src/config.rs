//! Run configuration types.
//!
//! A [`RunConfig`] is the statically typed view of a training run's
//! hierarchical config. Only the fields consumed by run naming are modelled
//! explicitly; every other key of every section is kept in a flattened
//! `extra` map so the metadata snapshot still covers the whole config.
//!
//! Configs are loaded with `figment`: the run file (YAML, TOML or JSON, by
//! extension), then `RUNLAYOUT_RUN_` environment variables, then explicit
//! `key.path=value` overrides.

use crate::error::LayoutError;
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Keys of a config section that have no typed field.
pub type Extra = BTreeMap<String, serde_yaml::Value>;

/// Environment prefix for run config overrides (`RUNLAYOUT_RUN_MODEL__NET__ACTIVATION=gelu`).
pub const RUN_ENV_PREFIX: &str = "RUNLAYOUT_RUN_";

/// Top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Name of the task; `"debug"` redirects output under `./debug`.
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub trainer: TrainerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Filesystem locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root under which non-debug runs are laid out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Model section: optimizer, scheduler and network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub net: NetConfig,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Fully-qualified optimizer class, e.g. `torch.optim.Adam`.
    #[serde(rename = "_target_", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_decay: Option<ParamValue>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Fully-qualified scheduler class, e.g. `torch.optim.lr_scheduler.StepLR`.
    #[serde(rename = "_target_", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<ParamValue>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_epochs: Option<ParamValue>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_batch_size: Option<ParamValue>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A scalar hyperparameter as it appears in a config file.
///
/// `Display` renders values the way the training stack prints them, so run
/// names line up with names produced by existing tooling: floats always carry
/// a fractional part or an exponent (`0.0`, `0.01`, `1e-05`), booleans are
/// capitalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Shortest round-trip float repr: positional for decimal exponents in
/// `-4..16`, otherwise `<mantissa>e<sign><2+ digit exponent>`.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sci = format!("{v:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }

    let positional = format!("{v}");
    if positional.contains('.') {
        positional
    } else {
        format!("{positional}.0")
    }
}

/// A `key.path=value` override applied on top of a loaded run config.
///
/// The value is parsed as a YAML scalar, so `lr=0.1` yields a float and
/// `act=relu` a string.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub key: String,
    pub value: serde_yaml::Value,
}

impl FromStr for Override {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| LayoutError::config(format!("override '{s}' must be key=value")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(LayoutError::config(format!("override '{s}' has an empty key")));
        }
        let value = if raw.is_empty() {
            serde_yaml::Value::String(String::new())
        } else {
            serde_yaml::from_str(raw)?
        };
        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

/// Load a run config from `path`, layering environment variables and
/// `overrides` on top.
///
/// Priority (highest to lowest):
/// 1. `overrides`, in order
/// 2. Environment variables prefixed with `RUNLAYOUT_RUN_` (`__` nests)
/// 3. The config file
pub fn load_run_config(path: &Path, overrides: &[Override]) -> Result<RunConfig, LayoutError> {
    if !path.exists() {
        return Err(LayoutError::config(format!(
            "run config {} does not exist",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let mut figment = match ext.as_deref() {
        Some("yaml" | "yml") => Figment::from(Yaml::file(path)),
        Some("toml") => Figment::from(Toml::file(path)),
        Some("json") => Figment::from(Json::file(path)),
        _ => {
            return Err(LayoutError::config(format!(
                "unsupported run config format: {}",
                path.display()
            )));
        }
    };

    figment = figment.merge(Env::prefixed(RUN_ENV_PREFIX).split("__"));

    for ov in overrides {
        tracing::debug!(key = %ov.key, "Applying run config override");
        figment = figment.merge((ov.key.as_str(), &ov.value));
    }

    Ok(figment.extract()?)
}
