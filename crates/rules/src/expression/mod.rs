//! Sandboxed comparison-expression language for rule leaves.
//!
//! An expression is exactly `operand OP operand`:
//! - `$.a.b` walks the element under evaluation (and its `attached` relations)
//! - `NAME`, `$NAME`, `NAME.a.b` read temporary variables through the scope chain
//! - `'text'`, `42`, `-1.5`, `true`, `false` are literals
//!
//! Strings are lexed into a typed AST and interpreted directly. There is no
//! function call, arithmetic or code-evaluation surface at all, so operand
//! contents can never change the operator or add syntax.

mod ast;
mod error;
mod evaluator;
mod lexer;
mod parser;
mod value;

pub use ast::{CompareOp, Expression, ExpressionKind, Literal, Operand};
pub use error::{EvalError, ExpressionError};
pub use evaluator::{ExpressionEvaluator, ScopeGuard};
pub use parser::parse;
pub use value::{compare, resolve_path, ElementContext, Value};
