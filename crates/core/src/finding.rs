use serde::{Deserialize, Serialize};

use crate::element::ElementCategory;

/// A rule match on one element, linking it to a threat.
///
/// Only the analyzer creates findings, and nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub element: ElementCategory,
    pub shape: String,
    pub rule: String,
    pub threat: String,
}
