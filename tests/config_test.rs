//! Tests for layered settings loading

use std::path::PathBuf;

use tempfile::TempDir;

use exprtree::application::{ExpressionStore, IdStrategy};
use exprtree::config::Settings;
use exprtree::domain::{ExpressionTree, NodeId, UnknownTargetPolicy};

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write config file");
    path
}

#[test]
fn given_global_config_when_loading_then_overrides_defaults() {
    let temp = TempDir::new().unwrap();
    let global = write_config(
        &temp,
        "exprtree.toml",
        r#"
[labels]
criteria = "Condition"

[ids]
strategy = "uuid"
prefix = "c-"
"#,
    );

    let settings = Settings::load_from(Some(&global), None).unwrap();

    assert_eq!(settings.labels.criteria, "Condition");
    assert_eq!(settings.labels.operator, "New Operator");
    assert_eq!(settings.ids.strategy, IdStrategy::Uuid);
    assert_eq!(settings.ids.prefix, "c-");
}

#[test]
fn given_explicit_config_when_loading_then_wins_over_global() {
    let temp = TempDir::new().unwrap();
    let global = write_config(
        &temp,
        "global.toml",
        r#"
[labels]
criteria = "Global"
operator = "Global Group"
"#,
    );
    let explicit = write_config(
        &temp,
        "explicit.toml",
        r#"
[labels]
criteria = "Explicit"

[moves]
unknown_target = "reject"
"#,
    );

    let settings = Settings::load_from(Some(&global), Some(&explicit)).unwrap();

    assert_eq!(settings.labels.criteria, "Explicit");
    assert_eq!(settings.labels.operator, "Global Group");
    assert_eq!(settings.moves.unknown_target, UnknownTargetPolicy::Reject);
}

#[test]
fn given_missing_global_config_when_loading_then_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.toml");

    let settings = Settings::load_from(Some(&missing), None).unwrap();

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_missing_explicit_config_when_loading_then_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.toml");

    let result = Settings::load_from(None, Some(&missing));

    assert!(result.is_err());
}

#[test]
fn given_invalid_strategy_when_loading_then_reports_config_error() {
    let temp = TempDir::new().unwrap();
    let bad = write_config(&temp, "bad.toml", "[ids]\nstrategy = \"timestamp\"\n");

    let err = Settings::load_from(None, Some(&bad)).unwrap_err();

    assert!(err.to_string().starts_with("config error"), "got: {}", err);
}

#[test]
fn given_configured_labels_when_store_adds_nodes_then_uses_them() {
    let temp = TempDir::new().unwrap();
    let path = write_config(
        &temp,
        "labels.toml",
        r#"
[labels]
criteria = "Condition"
operator = "Group"

[ids]
prefix = "x"
"#,
    );
    let settings = Settings::load_from(None, Some(&path)).unwrap();
    let mut store = ExpressionStore::new(ExpressionTree::sample(), &settings);

    let criteria = store.add_criteria(&NodeId::from("1")).created_id().cloned().unwrap();
    let operator = store.add_operator(None).created_id().cloned().unwrap();

    assert_eq!(criteria, NodeId::from("x1"));
    assert_eq!(store.tree().find(&criteria).unwrap().label(), "Condition");
    assert_eq!(store.tree().find(&operator).unwrap().label(), "Group");
}
