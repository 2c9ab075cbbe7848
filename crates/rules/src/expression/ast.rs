//! Typed AST for one rule expression.

use std::fmt;

/// Comparison operators available to `design` leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// Literal operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
}

/// One side of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `$.a.b.c`: walks the element under evaluation.
    Path(Vec<String>),
    /// `NAME`, `$NAME` or `NAME.a.b`: resolved through the scope chain.
    Variable { name: String, path: Vec<String> },
    Literal(Literal),
}

impl Operand {
    /// A variable reference with no trailing path, the only legal binding target.
    pub fn as_bare_variable(&self) -> Option<&str> {
        match self {
            Operand::Variable { name, path } if path.is_empty() => Some(name),
            _ => None,
        }
    }

    /// Temporary variable this operand reads, if any.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Operand::Variable { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Path(segments) => write!(f, "$.{}", segments.join(".")),
            Operand::Variable { name, path } if path.is_empty() => f.write_str(name),
            Operand::Variable { name, path } => write!(f, "{}.{}", name, path.join(".")),
            Operand::Literal(Literal::String(s)) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Operand::Literal(Literal::Number(n)) => write!(f, "{}", n),
            Operand::Literal(Literal::Bool(b)) => write!(f, "{}", b),
        }
    }
}

/// A parsed `design` comparison or `variable` binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    Binding {
        name: String,
        source: Operand,
    },
}

/// Which rule node an expression string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    Design,
    Binding,
}
