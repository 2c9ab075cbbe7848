//! `Threat` catalog documents.

use serde::{Deserialize, Serialize};
use threatlens_core::{Compliance, Severity, Threat};

use super::CommonMetadata;

/// YAML form of a threat. `metadata.id` and `metadata.name` become the
/// threat's id and name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreatDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub severity: Severity,
    #[serde(default)]
    pub mitigation: String,
    #[serde(default)]
    pub compliance: Compliance,
}

impl ThreatDocument {
    pub fn to_threat(&self) -> Threat {
        Threat {
            id: self.metadata.id.clone(),
            name: self.metadata.name.clone(),
            severity: self.severity,
            description: self.metadata.description.clone().unwrap_or_default(),
            mitigation: self.mitigation.clone(),
            compliance: self.compliance.clone(),
        }
    }
}
