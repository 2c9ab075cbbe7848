//! Rule and threat validation with structured errors and suggestions.
//!
//! Checks document headers, threat references and every expression in a
//! rule's predicate tree. Returns a [`ValidationResult`] with errors (the rule
//! cannot work as written) and warnings (advisory).

mod rule_checks;
mod threat_checks;

pub mod fuzzy;

use serde::{Deserialize, Serialize};
use threatlens_core::config::DEFAULT_MAX_RULE_DEPTH;
use threatlens_core::Threat;

use crate::schema::*;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location inside the document, e.g. `"designs[1].either[0].design"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed [`ThreatRule`] against the loaded threat catalog.
pub fn validate_rule(rule: &ThreatRule, threats: &[Threat]) -> ValidationResult {
    validate_rule_with_depth(rule, threats, DEFAULT_MAX_RULE_DEPTH)
}

/// Same as [`validate_rule`] with an explicit analyzer depth bound.
pub fn validate_rule_with_depth(
    rule: &ThreatRule,
    threats: &[Threat],
    max_depth: usize,
) -> ValidationResult {
    let mut result = ValidationResult::new();
    rule_checks::validate_header(rule, &mut result);
    rule_checks::validate_threat_ref(rule, threats, &mut result);
    rule_checks::validate_predicate(rule, max_depth, &mut result);
    result
}

/// Validate any [`RuleDocument`] variant, dispatching to the appropriate validator.
pub fn validate_document(doc: &RuleDocument, threats: &[Threat], max_depth: usize) -> ValidationResult {
    match doc {
        RuleDocument::Rule(rule) => validate_rule_with_depth(rule, threats, max_depth),
        RuleDocument::Threat(threat) => {
            let mut result = ValidationResult::new();
            threat_checks::validate_threat(threat, &mut result);
            result
        }
    }
}

/// Parse raw YAML and validate. Returns parse errors merged with validation errors.
pub fn validate_yaml(yaml: &str, threats: &[Threat]) -> ValidationResult {
    let parsed = serde_yaml::from_str::<RuleEnvelope>(yaml)
        .map_err(|e| e.to_string())
        .and_then(|envelope| envelope.parse_full());
    match parsed {
        Ok(doc) => validate_document(&doc, threats, DEFAULT_MAX_RULE_DEPTH),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            result
        }
    }
}
