//! Tests for schema types.

use super::*;
use threatlens_core::{ElementCategory, Severity};

const SSL_RULE_YAML: &str = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: dataflow-without-ssl
  name: Dataflow without SSL
  description: Dataflow crossing zones in clear text
  tags: [transport, tls]
  enabled: true
threat: t1
element: dataflow
designs:
  - variable: $.attached.source.attached.zone = $SRC_ZONE
  - design: $.ssl.isSSL == false
  - either:
      - design: SRC_ZONE.trust < 3
      - design: "$.protocol == 'http'"
"#;

const THREAT_YAML: &str = r#"
apiVersion: v1
kind: Threat
metadata:
  id: t1
  name: Sniffing
  description: Traffic can be read in transit
  enabled: true
severity: high
mitigation: Enable TLS on every dataflow crossing a trust boundary.
compliance:
  cwe: [CWE-319]
  owasp: [A02]
  stride: [Information Disclosure]
"#;

#[test]
fn parse_threat_rule() {
    let rule: ThreatRule = serde_yaml::from_str(SSL_RULE_YAML).unwrap();
    assert_eq!(rule.api_version, "v1");
    assert_eq!(rule.id(), "dataflow-without-ssl");
    assert_eq!(rule.threat, "t1");
    assert_eq!(rule.element, ElementCategory::Dataflow);
    assert!(rule.is_enabled());

    let (combinator, nodes) = rule.predicate.as_list().unwrap();
    assert_eq!(combinator, Combinator::All);
    assert_eq!(nodes.len(), 3);
    assert_eq!(
        nodes[0],
        RuleNode::Variable("$.attached.source.attached.zone = $SRC_ZONE".into())
    );
    assert_eq!(nodes[1], RuleNode::Design("$.ssl.isSSL == false".into()));
    assert!(matches!(&nodes[2], RuleNode::Either(inner) if inner.len() == 2));
    assert_eq!(rule.predicate.depth(), 2);
}

#[test]
fn single_design_rule() {
    let yaml = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: untrusted-entity
  name: Untrusted entity
threat: t2
element: entity
design: $.trust < 2
"#;
    let rule: ThreatRule = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(rule.predicate, RuleNode::Design("$.trust < 2".into()));
    assert_eq!(rule.predicate.depth(), 0);
    assert!(rule.metadata.enabled);
}

#[test]
fn round_trip() {
    let rule: ThreatRule = serde_yaml::from_str(SSL_RULE_YAML).unwrap();
    let yaml = serde_yaml::to_string(&rule).unwrap();
    let rule2: ThreatRule = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(rule, rule2);
}

#[test]
fn node_with_two_forms_is_rejected() {
    let yaml = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: bad
  name: Bad
threat: t1
element: entity
designs:
  - design: $.trust < 2
    variable: $.trust = $T
"#;
    let err = serde_yaml::from_str::<ThreatRule>(yaml).unwrap_err();
    assert!(err.to_string().contains("more than one form"));
}

#[test]
fn empty_node_is_rejected() {
    let yaml = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: bad
  name: Bad
threat: t1
element: entity
either:
  - {}
"#;
    assert!(serde_yaml::from_str::<ThreatRule>(yaml).is_err());
}

#[test]
fn rule_needs_exactly_one_top_level_form() {
    let none = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: bad
  name: Bad
threat: t1
element: entity
"#;
    let err = serde_yaml::from_str::<ThreatRule>(none).unwrap_err();
    assert!(err.to_string().contains("designs, either or design"));

    let both = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: bad
  name: Bad
threat: t1
element: entity
design: $.trust < 2
either: []
"#;
    assert!(serde_yaml::from_str::<ThreatRule>(both).is_err());
}

#[test]
fn top_level_variable_is_rejected() {
    let yaml = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: bad
  name: Bad
threat: t1
element: entity
variable: $.trust = $T
"#;
    assert!(serde_yaml::from_str::<ThreatRule>(yaml).is_err());
}

#[test]
fn malformed_yaml_errors() {
    // Missing required field
    let missing_threat = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: test
  name: Test
element: entity
design: $.trust < 2
"#;
    assert!(serde_yaml::from_str::<ThreatRule>(missing_threat).is_err());

    // Unknown element category
    let bad_element = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: test
  name: Test
threat: t1
element: server
design: $.trust < 2
"#;
    assert!(serde_yaml::from_str::<ThreatRule>(bad_element).is_err());

    // Unknown field in strict struct
    let unknown_field = r#"
apiVersion: v1
kind: ThreatRule
metadata:
  id: test
  name: Test
  bogus_field: oops
threat: t1
element: entity
design: $.trust < 2
"#;
    assert!(serde_yaml::from_str::<ThreatRule>(unknown_field).is_err());
}

#[test]
fn parse_threat_document() {
    let doc: ThreatDocument = serde_yaml::from_str(THREAT_YAML).unwrap();
    let threat = doc.to_threat();
    assert_eq!(threat.id, "t1");
    assert_eq!(threat.name, "Sniffing");
    assert_eq!(threat.severity, Severity::High);
    assert_eq!(threat.description, "Traffic can be read in transit");
    assert_eq!(threat.compliance.cwe, vec!["CWE-319".to_string()]);
    assert_eq!(threat.compliance.stride, vec!["Information Disclosure".to_string()]);
}

// ── RuleKind / RuleEnvelope / RuleDocument tests ────────────────

#[test]
fn rule_kind_from_str() {
    assert_eq!("ThreatRule".parse::<RuleKind>().unwrap(), RuleKind::ThreatRule);
    assert_eq!("Threat".parse::<RuleKind>().unwrap(), RuleKind::Threat);
    assert!("AnomalyRule".parse::<RuleKind>().is_err());
}

#[test]
fn rule_kind_display() {
    assert_eq!(RuleKind::ThreatRule.to_string(), "ThreatRule");
    assert_eq!(RuleKind::Threat.to_string(), "Threat");
}

#[test]
fn rule_envelope_parses_threat_rule() {
    let envelope: RuleEnvelope = serde_yaml::from_str(SSL_RULE_YAML).unwrap();
    assert_eq!(envelope.api_version, "v1");
    assert_eq!(envelope.kind, "ThreatRule");
    assert_eq!(envelope.metadata.id, "dataflow-without-ssl");
    assert_eq!(envelope.rule_kind().unwrap(), RuleKind::ThreatRule);
}

#[test]
fn rule_envelope_unknown_kind_errors() {
    let yaml = r#"
apiVersion: v1
kind: UnknownKind
metadata:
  id: test
  name: Test
"#;
    let envelope: RuleEnvelope = serde_yaml::from_str(yaml).unwrap();
    assert!(envelope.rule_kind().is_err());
    assert!(envelope.parse_full().is_err());
}

#[test]
fn rule_envelope_parse_full() {
    let envelope: RuleEnvelope = serde_yaml::from_str(SSL_RULE_YAML).unwrap();
    let doc = envelope.parse_full().unwrap();
    assert_eq!(doc.kind(), RuleKind::ThreatRule);
    assert_eq!(doc.metadata().id, "dataflow-without-ssl");
    assert_eq!(doc.as_rule().unwrap().threat, "t1");
    assert!(doc.as_threat().is_none());

    let envelope: RuleEnvelope = serde_yaml::from_str(THREAT_YAML).unwrap();
    let doc = envelope.parse_full().unwrap();
    assert_eq!(doc.kind(), RuleKind::Threat);
    assert_eq!(doc.as_threat().unwrap().severity, Severity::High);
}

#[test]
fn rule_document_serializes_to_json() {
    let rule: ThreatRule = serde_yaml::from_str(SSL_RULE_YAML).unwrap();
    let json = RuleDocument::Rule(rule).to_json().unwrap();
    assert_eq!(json["apiVersion"], "v1");
    assert_eq!(json["element"], "dataflow");
    assert_eq!(json["designs"][1]["design"], "$.ssl.isSSL == false");
}
