//! Multi-kind document container and accessors.

use super::{CommonMetadata, RuleKind, ThreatDocument, ThreatRule};

/// A fully deserialized document of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    /// Predicate tree linking one element category to one threat.
    Rule(ThreatRule),
    /// Threat catalog entry.
    Threat(ThreatDocument),
}

impl RuleDocument {
    /// Get the document's metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            RuleDocument::Rule(rule) => &rule.metadata,
            RuleDocument::Threat(threat) => &threat.metadata,
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::Rule(_) => RuleKind::ThreatRule,
            RuleDocument::Threat(_) => RuleKind::Threat,
        }
    }

    pub fn as_rule(&self) -> Option<&ThreatRule> {
        match self {
            RuleDocument::Rule(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_threat(&self) -> Option<&ThreatDocument> {
        match self {
            RuleDocument::Threat(threat) => Some(threat),
            _ => None,
        }
    }

    /// Serialize this document to JSON, delegating to the inner type.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            RuleDocument::Rule(r) => serde_json::to_value(r),
            RuleDocument::Threat(t) => serde_json::to_value(t),
        }
    }

    /// Serialize this document to YAML, delegating to the inner type.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        match self {
            RuleDocument::Rule(r) => serde_yaml::to_string(r),
            RuleDocument::Threat(t) => serde_yaml::to_string(t),
        }
    }
}
