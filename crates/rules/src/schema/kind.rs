//! Document kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    ThreatRule,
    Threat,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::ThreatRule => write!(f, "ThreatRule"),
            RuleKind::Threat => write!(f, "Threat"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ThreatRule" => Ok(RuleKind::ThreatRule),
            "Threat" => Ok(RuleKind::Threat),
            other => Err(format!("unknown document kind: '{}'", other)),
        }
    }
}
