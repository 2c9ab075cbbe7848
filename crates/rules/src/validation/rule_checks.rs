//! ThreatRule checks: header, threat reference and the predicate tree.

use std::collections::HashSet;

use threatlens_core::Threat;

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;
use crate::expression::{parse, Expression, ExpressionKind, Operand};
use crate::schema::*;

// ── Header ──────────────────────────────────────────────────────────

pub(super) fn validate_header(rule: &ThreatRule, result: &mut ValidationResult) {
    if rule.api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{}'", rule.api_version),
        );
    }

    if rule.kind != RuleKind::ThreatRule.to_string() {
        result.error(
            "kind",
            format!("kind must be 'ThreatRule', got '{}'", rule.kind),
        );
    }

    if rule.metadata.id.trim().is_empty() {
        result.error("metadata.id", "id must not be empty");
    } else if !is_kebab_case(&rule.metadata.id) {
        result.warn(
            "metadata.id",
            format!(
                "id should be kebab-case (lowercase alphanumeric + hyphens), got '{}'",
                rule.metadata.id
            ),
        );
    }

    if rule.metadata.name.trim().is_empty() {
        result.error("metadata.name", "name must not be empty");
    }
}

// ── Threat reference ────────────────────────────────────────────────

pub(super) fn validate_threat_ref(rule: &ThreatRule, threats: &[Threat], result: &mut ValidationResult) {
    if rule.threat.trim().is_empty() {
        result.error("threat", "threat must not be empty");
        return;
    }
    if threats.iter().any(|t| t.id == rule.threat) {
        return;
    }

    let known: Vec<&str> = threats.iter().map(|t| t.id.as_str()).collect();
    let message = format!(
        "unknown threat '{}'; the rule will never produce findings",
        rule.threat
    );
    match fuzzy_match(&rule.threat, &known) {
        Some(close) => result.error_with_suggestion("threat", message, format!("Did you mean '{close}'?")),
        None => result.error("threat", message),
    }
}

// ── Predicate tree ──────────────────────────────────────────────────

pub(super) fn validate_predicate(rule: &ThreatRule, max_depth: usize, result: &mut ValidationResult) {
    let mut walker = TreeWalker {
        max_depth,
        scopes: Vec::new(),
        result,
    };
    match rule.predicate.as_list() {
        Some((combinator, nodes)) => walker.list(combinator.as_str(), nodes, 1),
        None => walker.node(&rule.predicate, "design".to_string(), 0),
    }
}

/// Walks the tree the way the analyzer evaluates it, tracking which
/// variable names are bound at each point.
struct TreeWalker<'r> {
    max_depth: usize,
    scopes: Vec<HashSet<String>>,
    result: &'r mut ValidationResult,
}

impl TreeWalker<'_> {
    fn list(&mut self, path: &str, nodes: &[RuleNode], depth: usize) {
        if depth > self.max_depth {
            self.result.warn(
                path,
                format!(
                    "nesting depth {} exceeds the limit of {}; this list always evaluates to false",
                    depth, self.max_depth
                ),
            );
            return;
        }
        if nodes.is_empty() {
            self.result.warn(path, "empty list");
        }

        self.scopes.push(HashSet::new());

        // Bindings are registered before any sibling is evaluated.
        for (i, node) in nodes.iter().enumerate() {
            if let RuleNode::Variable(binding) = node {
                self.binding(binding, &format!("{}[{}].variable", path, i));
            }
        }

        let mut has_condition = false;
        for (i, node) in nodes.iter().enumerate() {
            if node.is_variable() {
                continue;
            }
            has_condition = true;
            self.node(node, format!("{}[{}]", path, i), depth);
        }
        if !nodes.is_empty() && !has_condition {
            self.result.warn(path, "list binds variables but has no conditions");
        }

        self.scopes.pop();
    }

    fn node(&mut self, node: &RuleNode, path: String, depth: usize) {
        match node {
            RuleNode::Designs(nodes) => self.list(&format!("{}.designs", path), nodes, depth + 1),
            RuleNode::Either(nodes) => self.list(&format!("{}.either", path), nodes, depth + 1),
            RuleNode::Design(expression) => self.design(expression, &path),
            RuleNode::Variable(_) => self.result.error(path, "variable is only allowed inside a list"),
        }
    }

    fn design(&mut self, expression: &str, path: &str) {
        let path = if path.ends_with("design") {
            path.to_string()
        } else {
            format!("{}.design", path)
        };
        match parse(expression, ExpressionKind::Design) {
            Ok(Expression::Comparison { left, right, .. }) => {
                self.check_bound(&left, &path);
                self.check_bound(&right, &path);
            }
            Ok(Expression::Binding { .. }) => {}
            Err(e) => self
                .result
                .error(path, format!("invalid expression '{}': {}", expression, e)),
        }
    }

    fn binding(&mut self, binding: &str, path: &str) {
        match parse(binding, ExpressionKind::Binding) {
            Ok(Expression::Binding { name, source }) => {
                self.check_bound(&source, path);
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name);
                }
            }
            Ok(Expression::Comparison { .. }) => {}
            Err(e) => self
                .result
                .error(path, format!("invalid binding '{}': {}", binding, e)),
        }
    }

    fn check_bound(&mut self, operand: &Operand, path: &str) {
        let Some(name) = operand.variable_name() else {
            return;
        };
        if !self.scopes.iter().any(|scope| scope.contains(name)) {
            self.result.warn(
                path,
                format!("variable '{}' is not bound here; the comparison is always false", name),
            );
        }
    }
}
