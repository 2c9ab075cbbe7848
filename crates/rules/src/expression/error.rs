//! Parse and evaluation errors for rule expressions.

use crate::scope::BlockId;

/// Syntactic problem with an expression string. Never touches element data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string literal starting at offset {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid operand '{text}' at offset {pos}")]
    InvalidOperand { text: String, pos: usize },

    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String },

    #[error("expected an operand at offset {pos}")]
    ExpectedOperand { pos: usize },

    #[error("expected a comparison operator at offset {pos}")]
    ExpectedOperator { pos: usize },

    #[error("unexpected trailing input at offset {pos}")]
    TrailingInput { pos: usize },

    #[error("'=' is only allowed in variable bindings")]
    AssignmentInDesign,

    #[error("variable bindings must use '=', found '{op}'")]
    ComparisonInBinding { op: String },

    #[error("both sides of the binding are variable names")]
    AmbiguousBinding,

    #[error("binding has no variable name on either side")]
    MissingBindingTarget,
}

/// Runtime failure while evaluating an expression against an element.
///
/// The analyzer treats every variant as a non-match for the element.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("invalid expression: {0}")]
    Invalid(#[from] ExpressionError),

    #[error("unbound variable '{0}'")]
    UnboundVariable(String),

    #[error("cannot compare two arrays")]
    BothArrays,

    #[error("scope block {0} is not active")]
    UnknownBlock(BlockId),
}
