//! Rule analyzer: walks a rule's predicate tree over every matching element
//! of a diagram and records a [`Finding`] for each element that satisfies it.

use threatlens_core::config::DEFAULT_MAX_RULE_DEPTH;
use threatlens_core::{Diagram, Element, Finding, Threat};
use tracing::{debug, warn};

use crate::expression::{ElementContext, ExpressionEvaluator};
use crate::schema::{Combinator, RuleNode, ThreatRule};
use crate::scope::BlockId;

/// Evaluates rules one at a time. Holds an evaluator, so it is not shared
/// between threads; create one per worker.
#[derive(Debug)]
pub struct RuleAnalyzer {
    evaluator: ExpressionEvaluator,
    max_depth: usize,
}

impl Default for RuleAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleAnalyzer {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_RULE_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            evaluator: ExpressionEvaluator::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Evaluate `rule` against every element of its category, appending one
    /// finding per match to `results`.
    ///
    /// A rule whose threat is not in `threats` is skipped without error.
    pub fn start_evaluation(
        &mut self,
        rule: &ThreatRule,
        diagram: &Diagram,
        threats: &[Threat],
        results: &mut Vec<Finding>,
    ) {
        let Some(threat) = threats.iter().find(|t| t.id == rule.threat) else {
            debug!(rule = %rule.id(), threat = %rule.threat, "threat not found, skipping rule");
            return;
        };

        let before = results.len();
        for element in diagram.by_category(rule.element) {
            if self.matches(rule, diagram, element) {
                results.push(Finding {
                    element: rule.element,
                    shape: element.shape().to_string(),
                    rule: rule.id().to_string(),
                    threat: threat.id.clone(),
                });
            }
        }
        self.evaluator.clear_all();

        debug!(
            rule = %rule.id(),
            findings = results.len() - before,
            "rule evaluated"
        );
    }

    fn matches(&mut self, rule: &ThreatRule, diagram: &Diagram, element: &Element) -> bool {
        let ctx = ElementContext::new(diagram, element);
        let max_depth = self.max_depth;
        let mut block = self.evaluator.scoped();
        let id = block.id();

        let matched = match rule.predicate.as_list() {
            Some((combinator, nodes)) => {
                evaluate_list(&mut block, nodes, &ctx, 1, combinator, max_depth)
            }
            None => evaluate_leaf(&mut block, &rule.predicate, &ctx, id, 1, max_depth),
        };

        debug!(rule = %rule.id(), element = %element.id, matched, "element evaluated");
        matched
    }
}

/// Evaluate one list node at `depth` inside a fresh block.
fn evaluate_list(
    evaluator: &mut ExpressionEvaluator,
    nodes: &[RuleNode],
    ctx: &ElementContext<'_>,
    depth: usize,
    combinator: Combinator,
    max_depth: usize,
) -> bool {
    if depth > max_depth {
        warn!(
            depth,
            max_depth,
            list = combinator.as_str(),
            "maximum rule depth exceeded, treating subtree as false"
        );
        return false;
    }

    let mut block = evaluator.scoped();
    let id = block.id();

    for node in nodes {
        if let RuleNode::Variable(binding) = node {
            if let Err(e) = block.register_variable(binding, ctx, id) {
                debug!(block = %id, binding = %binding, error = %e, "variable left unbound");
            }
        }
    }

    // Every child is evaluated before combining, so no short-circuit.
    let outcomes: Vec<bool> = nodes
        .iter()
        .filter(|node| !node.is_variable())
        .map(|node| evaluate_leaf(&mut block, node, ctx, id, depth, max_depth))
        .collect();

    match combinator {
        Combinator::All => outcomes.iter().all(|&ok| ok),
        Combinator::Any => outcomes.iter().any(|&ok| ok),
    }
}

/// Evaluate a non-variable child of a list opened at `depth`.
fn evaluate_leaf(
    evaluator: &mut ExpressionEvaluator,
    node: &RuleNode,
    ctx: &ElementContext<'_>,
    block: BlockId,
    depth: usize,
    max_depth: usize,
) -> bool {
    match node {
        RuleNode::Designs(nodes) => {
            evaluate_list(evaluator, nodes, ctx, depth + 1, Combinator::All, max_depth)
        }
        RuleNode::Either(nodes) => {
            evaluate_list(evaluator, nodes, ctx, depth + 1, Combinator::Any, max_depth)
        }
        RuleNode::Design(expression) => {
            if !evaluator.validate(expression, block) {
                warn!(block = %block, expression = %expression, "invalid design expression");
                return false;
            }
            match evaluator.evaluate(expression, ctx, block) {
                Ok(matched) => matched,
                Err(e) => {
                    debug!(block = %block, expression = %expression, error = %e, "design evaluation failed");
                    false
                }
            }
        }
        RuleNode::Variable(binding) => {
            warn!(binding = %binding, "variable outside a list is ignored");
            false
        }
    }
}
