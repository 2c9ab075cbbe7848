//! Recursive-descent parser: `operand op operand`, checked against the kind of
//! rule node the string came from.

use super::ast::{CompareOp, Expression, ExpressionKind, Operand};
use super::error::ExpressionError;
use super::lexer::{tokenize, Spanned, Token};

/// Parse an expression string for the given node kind.
///
/// `design` leaves accept the six comparison operators; `variable` bindings
/// accept only `=` with exactly one side being a bare variable name.
pub fn parse(input: &str, kind: ExpressionKind) -> Result<Expression, ExpressionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: input.len(),
    };
    let left = parser.operand()?;
    let op = parser.operator()?;
    let right = parser.operand()?;
    parser.finish()?;

    match (kind, op) {
        (ExpressionKind::Design, "=") => Err(ExpressionError::AssignmentInDesign),
        (ExpressionKind::Design, op) => Ok(Expression::Comparison {
            left,
            op: compare_op(op),
            right,
        }),
        (ExpressionKind::Binding, "=") => binding(left, right),
        (ExpressionKind::Binding, op) => Err(ExpressionError::ComparisonInBinding {
            op: op.to_string(),
        }),
    }
}

fn compare_op(op: &str) -> CompareOp {
    match op {
        "==" => CompareOp::Eq,
        "!=" => CompareOp::Ne,
        "<" => CompareOp::Lt,
        "<=" => CompareOp::Le,
        ">" => CompareOp::Gt,
        _ => CompareOp::Ge,
    }
}

/// Either orientation is accepted: `$.attached.zone = $ZONE` or `ZONE = $.attached.zone`.
fn binding(left: Operand, right: Operand) -> Result<Expression, ExpressionError> {
    let targets = (
        left.as_bare_variable().map(str::to_string),
        right.as_bare_variable().map(str::to_string),
    );
    match targets {
        (Some(_), Some(_)) => Err(ExpressionError::AmbiguousBinding),
        (None, None) => Err(ExpressionError::MissingBindingTarget),
        (Some(name), None) => Ok(Expression::Binding { name, source: right }),
        (None, Some(name)) => Ok(Expression::Binding { name, source: left }),
    }
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    end: usize,
}

impl<'t> Parser<'t> {
    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.pos).unwrap_or(self.end)
    }

    fn operand(&mut self) -> Result<Operand, ExpressionError> {
        match self.tokens.get(self.pos) {
            Some(Spanned {
                token: Token::Operand(operand),
                ..
            }) => {
                self.pos += 1;
                Ok(operand.clone())
            }
            _ => Err(ExpressionError::ExpectedOperand { pos: self.offset() }),
        }
    }

    fn operator(&mut self) -> Result<&'static str, ExpressionError> {
        match self.tokens.get(self.pos) {
            Some(Spanned {
                token: Token::Op(op),
                ..
            }) => {
                self.pos += 1;
                Ok(*op)
            }
            _ => Err(ExpressionError::ExpectedOperator { pos: self.offset() }),
        }
    }

    fn finish(&self) -> Result<(), ExpressionError> {
        if self.pos < self.tokens.len() {
            return Err(ExpressionError::TrailingInput { pos: self.offset() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ast::Literal;

    fn design(input: &str) -> Result<Expression, ExpressionError> {
        parse(input, ExpressionKind::Design)
    }

    fn bind(input: &str) -> Result<Expression, ExpressionError> {
        parse(input, ExpressionKind::Binding)
    }

    #[test]
    fn parses_comparison() {
        assert_eq!(
            design("$.trust <= 3").unwrap(),
            Expression::Comparison {
                left: Operand::Path(vec!["trust".into()]),
                op: CompareOp::Le,
                right: Operand::Literal(Literal::Number(3.0)),
            }
        );
    }

    #[test]
    fn every_comparison_operator_parses() {
        for (text, op) in [
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<", CompareOp::Lt),
            ("<=", CompareOp::Le),
            (">", CompareOp::Gt),
            (">=", CompareOp::Ge),
        ] {
            let expr = design(&format!("1 {} 2", text)).unwrap();
            assert!(matches!(expr, Expression::Comparison { op: parsed, .. } if parsed == op));
        }
    }

    #[test]
    fn rejects_structural_errors() {
        assert_eq!(design("   "), Err(ExpressionError::Empty));
        assert_eq!(design("$.a"), Err(ExpressionError::ExpectedOperator { pos: 3 }));
        assert_eq!(design("$.a =="), Err(ExpressionError::ExpectedOperand { pos: 6 }));
        assert_eq!(design("== 1"), Err(ExpressionError::ExpectedOperand { pos: 0 }));
        assert_eq!(
            design("$.a == 1 == 2"),
            Err(ExpressionError::TrailingInput { pos: 9 })
        );
        assert_eq!(
            design("$.a == == 1"),
            Err(ExpressionError::ExpectedOperand { pos: 7 })
        );
    }

    #[test]
    fn assignment_is_rejected_in_designs() {
        assert_eq!(design("$.a = $A"), Err(ExpressionError::AssignmentInDesign));
    }

    #[test]
    fn binding_accepts_either_orientation() {
        let expected = Expression::Binding {
            name: "ZONE".into(),
            source: Operand::Path(vec!["attached".into(), "zone".into()]),
        };
        assert_eq!(bind("$.attached.zone = $ZONE").unwrap(), expected);
        assert_eq!(bind("ZONE = $.attached.zone").unwrap(), expected);
    }

    #[test]
    fn binding_may_read_an_earlier_variable() {
        assert_eq!(
            bind("ZONE.parent = $PARENT").unwrap(),
            Expression::Binding {
                name: "PARENT".into(),
                source: Operand::Variable {
                    name: "ZONE".into(),
                    path: vec!["parent".into()],
                },
            }
        );
    }

    #[test]
    fn binding_needs_exactly_one_variable_name() {
        assert_eq!(bind("$A = $B"), Err(ExpressionError::AmbiguousBinding));
        assert_eq!(bind("$.a = 3"), Err(ExpressionError::MissingBindingTarget));
        assert_eq!(
            bind("ZONE.trust = 'x'"),
            Err(ExpressionError::MissingBindingTarget)
        );
        assert_eq!(
            bind("$.a == $A"),
            Err(ExpressionError::ComparisonInBinding { op: "==".into() })
        );
    }
}
