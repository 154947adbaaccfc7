//! Metadata snapshots: the full run config written next to the run's outputs.
//!
//! The snapshot is YAML (the same text format run configs are written in)
//! stored under the fixed name `metadata.json`. Writes go to a `.tmp`
//! sibling and are renamed into place, so a reader sees either the previous
//! snapshot or the new one. Concurrent writers are not coordinated; the last
//! rename wins.

use crate::config::RunConfig;
use crate::error::LayoutError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the snapshot inside a run directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Serialize `cfg` to `output_dir/metadata.json`, replacing any existing file.
///
/// `output_dir` must already exist.
pub fn persist_metadata(cfg: &RunConfig, output_dir: &Path) -> Result<PathBuf, LayoutError> {
    let path = output_dir.join(METADATA_FILE);
    let yaml = serde_yaml::to_string(cfg)?;
    atomic_write(&path, yaml.as_bytes()).map_err(|e| LayoutError::metadata(&path, e))?;
    debug!(path = %path.display(), bytes = yaml.len(), "Wrote metadata snapshot");
    Ok(path)
}

/// Read a snapshot written by [`persist_metadata`].
pub fn load_metadata(path: &Path) -> Result<RunConfig, LayoutError> {
    let content = std::fs::read_to_string(path).map_err(|e| LayoutError::metadata_read(path, e))?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Write to a `.tmp` sibling, then rename over `path`.
///
/// Unlike directory provisioning this never creates parents: a missing run
/// directory is a caller bug and should surface as an error.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParamValue;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config_with_extras() -> RunConfig {
        let yaml = r#"
task_name: train
tags: [baseline, v2]
paths:
  output_dir: /runs
model:
  optimizer:
    _target_: torch.optim.SGD
    lr: 0.1
    momentum: 0.9
  net:
    activation: tanh
trainer:
  max_epochs: 5
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_persist_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cfg = config_with_extras();

        let path = persist_metadata(&cfg, dir.path()).unwrap();
        assert_eq!(path, dir.path().join(METADATA_FILE));

        let loaded = load_metadata(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.model.optimizer.lr, Some(ParamValue::Float(0.1)));
    }

    #[test]
    fn test_persist_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(METADATA_FILE), "stale: true\n").unwrap();

        let cfg = config_with_extras();
        persist_metadata(&cfg, dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains("momentum"));
    }

    #[test]
    fn test_persist_no_tmp_leftover() {
        let dir = TempDir::new().unwrap();
        persist_metadata(&RunConfig::default(), dir.path()).unwrap();
        assert!(!dir.path().join("metadata.tmp").exists());
    }

    #[test]
    fn test_persist_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let result = persist_metadata(&RunConfig::default(), &missing);
        assert!(matches!(result, Err(LayoutError::Metadata { .. })));
        assert!(!missing.exists());
    }

    #[test]
    fn test_snapshot_is_yaml_text() {
        let dir = TempDir::new().unwrap();
        let path = persist_metadata(&config_with_extras(), dir.path()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("_target_: torch.optim.SGD"));
        assert!(content.contains("task_name: train"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_metadata(Path::new("/nonexistent/metadata.json"));
        assert!(matches!(result, Err(LayoutError::MetadataRead { .. })));
    }
}
