//! Threat document checks.

use super::fuzzy::is_kebab_case;
use super::ValidationResult;
use crate::schema::*;

const STRIDE_CATEGORIES: &[&str] = &[
    "Spoofing",
    "Tampering",
    "Repudiation",
    "Information Disclosure",
    "Denial of Service",
    "Elevation of Privilege",
];

pub(super) fn validate_threat(threat: &ThreatDocument, result: &mut ValidationResult) {
    if threat.api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", threat.api_version),
        );
    }
    if threat.kind != RuleKind::Threat.to_string() {
        result.error("kind", format!("kind must be 'Threat', got '{}'", threat.kind));
    }

    if threat.metadata.id.trim().is_empty() {
        result.error("metadata.id", "id must not be empty");
    } else if !is_kebab_case(&threat.metadata.id) {
        result.warn(
            "metadata.id",
            format!("id should be kebab-case, got '{}'", threat.metadata.id),
        );
    }
    if threat.metadata.name.trim().is_empty() {
        result.error("metadata.name", "name must not be empty");
    }
    if threat.mitigation.trim().is_empty() {
        result.warn("mitigation", "no mitigation described");
    }

    for (i, cwe) in threat.compliance.cwe.iter().enumerate() {
        let well_formed = cwe
            .strip_prefix("CWE-")
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
        if !well_formed {
            result.warn(
                format!("compliance.cwe[{}]", i),
                format!("expected 'CWE-<number>', got '{}'", cwe),
            );
        }
    }

    for (i, stride) in threat.compliance.stride.iter().enumerate() {
        if !STRIDE_CATEGORIES.contains(&stride.as_str()) {
            let suggestion = super::fuzzy::fuzzy_match(stride, STRIDE_CATEGORIES);
            let mut message = format!("unknown STRIDE category '{}'", stride);
            if let Some(close) = suggestion {
                message.push_str(&format!("; did you mean '{}'?", close));
            }
            result.warn(format!("compliance.stride[{}]", i), message);
        }
    }
}
