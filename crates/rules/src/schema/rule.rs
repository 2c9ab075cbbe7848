//! `ThreatRule` document and its predicate tree.

use serde::{Deserialize, Serialize};
use threatlens_core::ElementCategory;

use super::CommonMetadata;

/// How a list node combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `designs`: every child must hold.
    All,
    /// `either`: at least one child must hold.
    Any,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::All => "designs",
            Combinator::Any => "either",
        }
    }
}

/// One node of a rule's predicate tree.
///
/// Exactly one form is present per node; the YAML mapping is rejected at
/// deserialization time otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub enum RuleNode {
    Designs(Vec<RuleNode>),
    Either(Vec<RuleNode>),
    Design(String),
    /// Binding such as `$.attached.zone = $ZONE`. Only valid inside a list.
    Variable(String),
}

impl RuleNode {
    /// The children and combinator of a list node.
    pub fn as_list(&self) -> Option<(Combinator, &[RuleNode])> {
        match self {
            RuleNode::Designs(nodes) => Some((Combinator::All, nodes)),
            RuleNode::Either(nodes) => Some((Combinator::Any, nodes)),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, RuleNode::Variable(_))
    }

    /// List nesting depth. Leaves are 0, a flat `designs` is 1.
    pub fn depth(&self) -> usize {
        match self.as_list() {
            Some((_, nodes)) => 1 + nodes.iter().map(RuleNode::depth).max().unwrap_or(0),
            None => 0,
        }
    }

    fn form(&self) -> &'static str {
        match self {
            RuleNode::Designs(_) => "designs",
            RuleNode::Either(_) => "either",
            RuleNode::Design(_) => "design",
            RuleNode::Variable(_) => "variable",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    designs: Option<Vec<RuleNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    either: Option<Vec<RuleNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    design: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variable: Option<String>,
}

impl TryFrom<RawNode> for RuleNode {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let mut forms = Vec::with_capacity(1);
        if let Some(nodes) = raw.designs {
            forms.push(RuleNode::Designs(nodes));
        }
        if let Some(nodes) = raw.either {
            forms.push(RuleNode::Either(nodes));
        }
        if let Some(expr) = raw.design {
            forms.push(RuleNode::Design(expr));
        }
        if let Some(binding) = raw.variable {
            forms.push(RuleNode::Variable(binding));
        }
        exactly_one(forms, "designs, either, design or variable")
    }
}

impl From<RuleNode> for RawNode {
    fn from(node: RuleNode) -> Self {
        let mut raw = RawNode::default();
        match node {
            RuleNode::Designs(nodes) => raw.designs = Some(nodes),
            RuleNode::Either(nodes) => raw.either = Some(nodes),
            RuleNode::Design(expr) => raw.design = Some(expr),
            RuleNode::Variable(binding) => raw.variable = Some(binding),
        }
        raw
    }
}

fn exactly_one(mut forms: Vec<RuleNode>, expected: &str) -> Result<RuleNode, String> {
    match forms.len() {
        1 => Ok(forms.remove(0)),
        0 => Err(format!("node must have one of {}", expected)),
        _ => Err(format!(
            "node has more than one form: {}",
            forms
                .iter()
                .map(RuleNode::form)
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

/// A rule linking one element category to one threat through a predicate tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThreatRule", into = "RawThreatRule")]
pub struct ThreatRule {
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    /// Id of the threat this rule reports.
    pub threat: String,
    /// Category of the elements the rule is evaluated against.
    pub element: ElementCategory,
    /// Top-level `designs`, `either` or `design`. Never a `variable`.
    pub predicate: RuleNode,
}

impl ThreatRule {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn is_enabled(&self) -> bool {
        self.metadata.enabled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThreatRule {
    #[serde(rename = "apiVersion")]
    api_version: String,
    kind: String,
    metadata: CommonMetadata,
    threat: String,
    element: ElementCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    designs: Option<Vec<RuleNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    either: Option<Vec<RuleNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    design: Option<String>,
}

impl TryFrom<RawThreatRule> for ThreatRule {
    type Error = String;

    fn try_from(raw: RawThreatRule) -> Result<Self, Self::Error> {
        let mut forms = Vec::with_capacity(1);
        if let Some(nodes) = raw.designs {
            forms.push(RuleNode::Designs(nodes));
        }
        if let Some(nodes) = raw.either {
            forms.push(RuleNode::Either(nodes));
        }
        if let Some(expr) = raw.design {
            forms.push(RuleNode::Design(expr));
        }
        let predicate = exactly_one(forms, "designs, either or design")
            .map_err(|e| format!("rule '{}': {}", raw.metadata.id, e))?;

        Ok(ThreatRule {
            api_version: raw.api_version,
            kind: raw.kind,
            metadata: raw.metadata,
            threat: raw.threat,
            element: raw.element,
            predicate,
        })
    }
}

impl From<ThreatRule> for RawThreatRule {
    fn from(rule: ThreatRule) -> Self {
        let mut raw = RawThreatRule {
            api_version: rule.api_version,
            kind: rule.kind,
            metadata: rule.metadata,
            threat: rule.threat,
            element: rule.element,
            designs: None,
            either: None,
            design: None,
        };
        match rule.predicate {
            RuleNode::Designs(nodes) => raw.designs = Some(nodes),
            RuleNode::Either(nodes) => raw.either = Some(nodes),
            RuleNode::Design(expr) => raw.design = Some(expr),
            // Unreachable through deserialization; keep the binding inside a list.
            variable @ RuleNode::Variable(_) => raw.designs = Some(vec![variable]),
        }
        raw
    }
}
