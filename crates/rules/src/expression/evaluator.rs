//! [`ExpressionEvaluator`]: validates and evaluates expressions against an
//! element, and owns the scope store that temporary variables live in.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::scope::{BlockId, ScopeStore};

use super::ast::{Expression, ExpressionKind, Operand};
use super::error::{EvalError, ExpressionError};
use super::parser::parse;
use super::value::{compare, resolve_path, ElementContext, Value};

/// One evaluator per rule run. Holds mutable scope state, so concurrent runs
/// each need their own instance.
#[derive(Debug, Default)]
pub struct ExpressionEvaluator {
    scopes: ScopeStore,
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an expression for the given node kind, returning the typed error.
    pub fn check(
        &self,
        expression: &str,
        kind: ExpressionKind,
    ) -> Result<Expression, ExpressionError> {
        parse(expression, kind)
    }

    /// Syntactic check of a `design` leaf. Does not touch element data.
    pub fn validate(&self, expression: &str, block: BlockId) -> bool {
        match parse(expression, ExpressionKind::Design) {
            Ok(_) => true,
            Err(e) => {
                debug!(block = %block, expression, error = %e, "expression failed validation");
                false
            }
        }
    }

    /// Evaluate a `design` leaf against `ctx`, resolving variables from `block` outward.
    pub fn evaluate(
        &self,
        expression: &str,
        ctx: &ElementContext<'_>,
        block: BlockId,
    ) -> Result<bool, EvalError> {
        let Expression::Comparison { left, op, right } =
            parse(expression, ExpressionKind::Design)?
        else {
            return Err(ExpressionError::AssignmentInDesign.into());
        };

        let left = self.resolve(&left, ctx, block)?;
        let right = self.resolve(&right, ctx, block)?;
        compare(&left, op, &right)
    }

    /// Resolve the source side of a `variable` binding and store it in `block`.
    pub fn register_variable(
        &mut self,
        binding: &str,
        ctx: &ElementContext<'_>,
        block: BlockId,
    ) -> Result<(), EvalError> {
        let Expression::Binding { name, source } = parse(binding, ExpressionKind::Binding)? else {
            return Err(ExpressionError::MissingBindingTarget.into());
        };

        let value = self.resolve(&source, ctx, block)?;
        debug!(block = %block, name = %name, "registered variable");
        self.scopes.register(name, value, block)
    }

    fn resolve(
        &self,
        operand: &Operand,
        ctx: &ElementContext<'_>,
        block: BlockId,
    ) -> Result<Value, EvalError> {
        match operand {
            Operand::Path(segments) => Ok(resolve_path(segments, ctx)),
            Operand::Variable { name, path } => {
                let value = self.scopes.resolve(name, block)?.clone();
                Ok(value.walk(path, ctx))
            }
            Operand::Literal(literal) => Ok(Value::from_literal(literal)),
        }
    }

    /// Allocate a fresh, never-before-used block id.
    pub fn new_block_id(&mut self) -> BlockId {
        self.scopes.next_block_id()
    }

    pub fn enter_scope(&mut self, id: BlockId) {
        self.scopes.push(id);
    }

    /// Pop the innermost block and discard its variables.
    pub fn exit_scope(&mut self) -> Option<BlockId> {
        self.scopes.pop()
    }

    /// Reset all scopes between independent rule runs.
    pub fn clear_all(&mut self) {
        self.scopes.clear();
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Enter a fresh block that is exited when the guard drops.
    pub fn scoped(&mut self) -> ScopeGuard<'_> {
        let id = self.new_block_id();
        self.enter_scope(id);
        ScopeGuard {
            evaluator: self,
            id,
        }
    }
}

/// A scope block held open for the lifetime of the guard.
///
/// Dereferences to the evaluator so nested evaluation can keep going through it.
pub struct ScopeGuard<'e> {
    evaluator: &'e mut ExpressionEvaluator,
    id: BlockId,
}

impl ScopeGuard<'_> {
    pub fn id(&self) -> BlockId {
        self.id
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = ExpressionEvaluator;

    fn deref(&self) -> &Self::Target {
        self.evaluator
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.evaluator
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.evaluator.exit_scope();
    }
}
