//! Property-based tests for run naming.

use proptest::prelude::*;

use runlayout_core::naming::{TOKEN_LABELS, param_tokens};
use runlayout_core::{ParamValue, RunConfig, derive_run_name};
use std::path::PathBuf;

fn param_value() -> impl Strategy<Value = Option<ParamValue>> {
    prop_oneof![
        Just(None),
        any::<i64>().prop_map(|v| Some(ParamValue::Int(v))),
        (-1.0e3f64..1.0e3).prop_map(|v| Some(ParamValue::Float(v))),
        "[a-z]{1,8}".prop_map(|s| Some(ParamValue::Text(s))),
    ]
}

fn target() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "[a-z]{1,6}(\\.[a-z]{1,6}){0,2}\\.[A-Z][A-Za-z]{1,8}".prop_map(Some),
    ]
}

#[derive(Debug, Clone)]
struct NamingFields {
    lr: Option<ParamValue>,
    wd: Option<ParamValue>,
    ep: Option<ParamValue>,
    bs: Option<ParamValue>,
    act: Option<ParamValue>,
    opt: Option<String>,
    sched: Option<String>,
}

fn naming_fields() -> impl Strategy<Value = NamingFields> {
    (
        param_value(),
        param_value(),
        param_value(),
        param_value(),
        param_value(),
        target(),
        target(),
    )
        .prop_map(|(lr, wd, ep, bs, act, opt, sched)| NamingFields {
            lr,
            wd,
            ep,
            bs,
            act,
            opt,
            sched,
        })
}

fn config_from(fields: &NamingFields, task: &str, output_dir: &str, seed: i64) -> RunConfig {
    let mut cfg = RunConfig {
        task_name: task.to_string(),
        ..Default::default()
    };
    cfg.paths.output_dir = Some(PathBuf::from(output_dir));
    cfg.model.optimizer.lr = fields.lr.clone();
    cfg.model.optimizer.weight_decay = fields.wd.clone();
    cfg.trainer.max_epochs = fields.ep.clone();
    cfg.data.train_batch_size = fields.bs.clone();
    cfg.model.net.activation = fields.act.clone();
    cfg.model.optimizer.target = fields.opt.clone();
    cfg.model.scheduler.target = fields.sched.clone();
    cfg.extra.insert("seed".into(), serde_yaml::Value::from(seed));
    cfg.trainer
        .extra
        .insert("devices".into(), serde_yaml::Value::from(seed.rem_euclid(8)));
    cfg
}

proptest! {
    #[test]
    fn dir_name_ignores_unrelated_fields(
        fields in naming_fields(),
        task_a in "[a-z]{1,8}",
        task_b in "[a-z]{1,8}",
        out_a in "/[a-z]{1,8}",
        out_b in "/[a-z]{1,8}",
        seed_a in any::<i64>(),
        seed_b in any::<i64>(),
    ) {
        let a = derive_run_name(&config_from(&fields, &task_a, &out_a, seed_a));
        let b = derive_run_name(&config_from(&fields, &task_b, &out_b, seed_b));
        prop_assert_eq!(a.dir_name, b.dir_name);
        prop_assert_eq!(a.params, b.params);
    }

    #[test]
    fn tokens_keep_fixed_order(fields in naming_fields()) {
        let cfg = config_from(&fields, "train", "/out", 0);
        let name = derive_run_name(&cfg).dir_name;

        let present: Vec<String> = param_tokens(&cfg).into_iter().flatten().collect();
        prop_assert_eq!(name, present.join("_"));

        let labels: Vec<&str> = present
            .iter()
            .map(|t| t.split_once('-').map(|(label, _)| label).unwrap_or(""))
            .collect();
        let expected: Vec<&str> = TOKEN_LABELS
            .iter()
            .copied()
            .filter(|l| labels.contains(l))
            .collect();
        prop_assert_eq!(labels, expected);
    }

    #[test]
    fn class_tokens_use_final_segment(
        prefix in "[a-z]{1,6}(\\.[a-z]{1,6}){0,2}",
        class in "[A-Z][A-Za-z]{1,8}",
    ) {
        let fields = NamingFields {
            lr: None,
            wd: None,
            ep: None,
            bs: None,
            act: None,
            opt: Some(format!("{prefix}.{class}")),
            sched: None,
        };
        let cfg = config_from(&fields, "train", "/out", 0);
        prop_assert_eq!(derive_run_name(&cfg).dir_name, format!("opt-{class}"));
    }
}
