//! Debug runs without an anchored working directory.
//!
//! This changes the process working directory, so it lives in its own test
//! binary and holds a single test.

use pretty_assertions::assert_eq;
use runlayout_core::{ExperimentLayoutBuilder, ParamValue, RunConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn debug_run_returns_relative_debug_path() {
    let ws = TempDir::new().unwrap();
    std::env::set_current_dir(ws.path()).unwrap();

    let mut cfg = RunConfig {
        task_name: "debug".into(),
        ..Default::default()
    };
    cfg.paths.output_dir = Some(PathBuf::from("/tmp/x"));
    cfg.model.optimizer.lr = Some(ParamValue::Float(0.01));
    cfg.model.optimizer.weight_decay = Some(ParamValue::Float(0.0));
    cfg.model.optimizer.target = Some("pkg.Adam".into());
    cfg.model.scheduler.target = Some("pkg.StepLR".into());
    cfg.trainer.max_epochs = Some(ParamValue::Int(10));
    cfg.data.train_batch_size = Some(ParamValue::Int(32));
    cfg.model.net.activation = Some(ParamValue::from("relu"));

    let layout = ExperimentLayoutBuilder::new(&cfg)
        .build_layout("proj")
        .unwrap();

    let expected =
        Path::new("debug/lr-0.01_wd-0.0_ep-10_bs-32_act-relu_opt-Adam_lrsched-StepLR/proj");
    assert_eq!(layout.main_dir, expected);
    assert_eq!(layout.models_dir(), Some(expected.join("models").as_path()));
    assert!(ws.path().join(expected).join("models").is_dir());
    assert!(ws.path().join(expected).join("outputs").is_dir());
    assert!(ws.path().join(expected).join("metadata.json").is_file());
}
