//! Tests for the rule loader module.

use std::fs;

use tempfile::TempDir;
use threatlens_core::Severity;

use super::*;
use crate::schema::RuleKind;

const VALID_RULE_YAML: &str = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: test-rule
  name: Test Rule
  enabled: true
threat: t1
element: dataflow
design: $.ssl.isSSL == false
"#;

const VALID_THREAT_YAML: &str = r#"
apiVersion: v1
kind: Threat
metadata:
  id: t1
  name: Sniffing
severity: high
"#;

fn temp_loader() -> (TempDir, RuleLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = RuleLoader::new(dir.path().to_path_buf());
    (dir, loader)
}

#[test]
fn load_rule_from_file() {
    let (dir, loader) = temp_loader();
    let rule_path = dir.path().join("test-rule.yml");
    fs::write(&rule_path, VALID_RULE_YAML).unwrap();

    let doc = loader.load_file(&rule_path).unwrap();
    assert_eq!(doc.metadata().id, "test-rule");
    assert_eq!(doc.metadata().name, "Test Rule");
    assert!(doc.as_rule().is_some());
}

#[test]
fn load_all_skips_dotfiles_and_non_yaml() {
    let (dir, mut loader) = temp_loader();

    fs::write(dir.path().join("rule1.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a rule").unwrap();

    let results = loader.load_all().unwrap();

    let loaded = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();

    assert_eq!(loaded, 1);
    assert_eq!(skipped, 2);
    assert!(loader.get("test-rule").is_some());
}

#[test]
fn load_all_recursive_subdirectories() {
    let (dir, mut loader) = temp_loader();

    fs::write(dir.path().join("rule1.yml"), VALID_RULE_YAML).unwrap();

    let sub = dir.path().join("threats");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("t1.yaml"), VALID_THREAT_YAML).unwrap();

    let results = loader.load_all().unwrap();

    let loaded: Vec<(&str, RuleKind)> = results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Loaded { id, kind } => Some((id.as_str(), *kind)),
            _ => None,
        })
        .collect();

    assert_eq!(
        loaded,
        vec![("test-rule", RuleKind::ThreatRule), ("t1", RuleKind::Threat)]
    );

    let rules = loader.rules();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].threat, "t1");

    let threats = loader.threats();
    assert_eq!(threats.len(), 1);
    assert_eq!(threats[0].severity, Severity::High);
}

#[test]
fn load_all_preserves_sorted_path_order() {
    let (dir, mut loader) = temp_loader();
    for id in ["c-rule", "a-rule", "b-rule"] {
        fs::write(
            dir.path().join(format!("{}.yml", id)),
            VALID_RULE_YAML.replace("test-rule", id),
        )
        .unwrap();
    }

    loader.load_all().unwrap();
    let ids: Vec<String> = loader.rules().iter().map(|r| r.id().to_string()).collect();
    assert_eq!(ids, vec!["a-rule", "b-rule", "c-rule"]);
}

#[test]
fn parse_errors_do_not_abort_scan() {
    let (dir, mut loader) = temp_loader();

    fs::write(dir.path().join("good.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join("bad.yml"), "{{{{not yaml at all").unwrap();

    let results = loader.load_all().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.iter().filter(|r| r.is_failed()).count(), 1);
    assert!(loader.get("test-rule").is_some());
}

#[test]
fn duplicate_ids_are_reported() {
    let (dir, mut loader) = temp_loader();
    fs::write(dir.path().join("a.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join("b.yml"), VALID_RULE_YAML).unwrap();

    let results = loader.load_all().unwrap();
    let failed: Vec<_> = results.iter().filter(|r| r.is_failed()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("b.yml"));
    match &failed[0].status {
        LoadStatus::Failed { error } => assert!(error.contains("duplicate document id 'test-rule'")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(loader.documents().len(), 1);
}

#[test]
fn empty_id_fails_validation() {
    let yaml = VALID_RULE_YAML.replace("id: test-rule", "id: \"\"");
    let err = super::core::parse_document(&yaml).unwrap_err();
    assert!(matches!(err, RuleError::Validation(_)));
}

#[test]
fn unknown_kind_fails_validation() {
    let yaml = VALID_RULE_YAML.replace("kind: ThreatRule", "kind: AnomalyRule");
    let err = super::core::parse_document(&yaml).unwrap_err();
    assert!(err.to_string().contains("unknown document kind"));
}

#[test]
fn node_shape_errors_surface_from_second_pass() {
    let yaml = VALID_RULE_YAML.replace(
        "design: $.ssl.isSSL == false",
        "designs:\n  - design: $.a == 1\n    either: []",
    );
    let err = super::core::parse_document(&yaml).unwrap_err();
    assert!(err.to_string().contains("test-rule"));
}

#[test]
fn missing_directory_is_an_error() {
    let (dir, _) = temp_loader();
    let mut loader = RuleLoader::new(dir.path().join("nope"));
    assert!(matches!(loader.load_all(), Err(RuleError::Validation(_))));
}
