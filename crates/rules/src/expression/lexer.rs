//! Hand-written lexer for rule expressions.
//!
//! Operands are lexed whole: an attribute path, a variable reference or a
//! literal each become a single token, so the parser only ever sees
//! `operand op operand`.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ast::{Literal, Operand};
use super::error::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Operand(Operand),
    /// `==`, `!=`, `<`, `<=`, `>`, `>=` or `=`, kept as text until parsing.
    Op(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, ExpressionError> {
    Lexer {
        input,
        chars: input.char_indices().peekable(),
    }
    .run()
}

/// `[A-Z][A-Z0-9_]*`
pub(crate) fn is_variable_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Vec<Spanned>, ExpressionError> {
        let mut tokens = Vec::new();

        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
                continue;
            }

            let token = match ch {
                '$' => self.sigil(pos)?,
                '\'' => self.string(pos)?,
                '0'..='9' => self.number(pos)?,
                '-' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                    self.number(pos)?
                }
                c if c.is_ascii_alphabetic() || c == '_' => self.word(pos)?,
                '=' | '!' | '<' | '>' => self.operator(pos, ch)?,
                other => return Err(ExpressionError::UnexpectedChar { ch: other, pos }),
            };

            tokens.push(Spanned { token, pos });
        }

        Ok(tokens)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = match self.chars.peek() {
            Some(&(i, _)) => i,
            None => return "",
        };
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        &self.input[start..end]
    }

    /// Zero or more `.ident` segments.
    fn dotted_path(&mut self, start: usize) -> Result<Vec<String>, ExpressionError> {
        let mut segments = Vec::new();
        while let Some(&(_, '.')) = self.chars.peek() {
            self.chars.next();
            let segment = self.take_while(is_ident_char);
            if segment.is_empty() {
                return Err(self.invalid_operand(start));
            }
            segments.push(segment.to_string());
        }
        Ok(segments)
    }

    /// `$.path` or `$NAME[.path]`.
    fn sigil(&mut self, start: usize) -> Result<Token, ExpressionError> {
        self.chars.next();
        match self.chars.peek() {
            Some(&(_, '.')) => {
                let segments = self.dotted_path(start)?;
                Ok(Token::Operand(Operand::Path(segments)))
            }
            Some(&(_, c)) if c.is_ascii_uppercase() => {
                let name = self.take_while(is_ident_char);
                if !is_variable_name(name) {
                    return Err(self.invalid_operand(start));
                }
                let path = self.dotted_path(start)?;
                Ok(Token::Operand(Operand::Variable {
                    name: name.to_string(),
                    path,
                }))
            }
            _ => Err(self.invalid_operand(start)),
        }
    }

    /// Single-quoted string with `\'` and `\\` escapes.
    fn string(&mut self, start: usize) -> Result<Token, ExpressionError> {
        self.chars.next();
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ExpressionError::UnterminatedString { pos: start }),
                Some((_, '\'')) => break,
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, c @ ('\'' | '\\'))) => value.push(c),
                    Some((_, c)) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => return Err(ExpressionError::UnterminatedString { pos: start }),
                },
                Some((_, c)) => value.push(c),
            }
        }
        Ok(Token::Operand(Operand::Literal(Literal::String(value))))
    }

    fn number(&mut self, start: usize) -> Result<Token, ExpressionError> {
        let mut end = start;
        let mut first = true;
        while let Some(&(i, c)) = self.chars.peek() {
            let accept = c.is_ascii_digit() || c == '.' || (first && c == '-');
            if !accept {
                break;
            }
            first = false;
            end = i + c.len_utf8();
            self.chars.next();
        }

        // Reject things like `12abc` instead of splitting them into two tokens.
        if let Some(&(_, c)) = self.chars.peek() {
            if is_ident_char(c) {
                let rest = self.take_while(is_ident_char);
                return Err(ExpressionError::InvalidOperand {
                    text: format!("{}{}", &self.input[start..end], rest),
                    pos: start,
                });
            }
        }

        let text = &self.input[start..end];
        if text.ends_with('.') {
            return Err(ExpressionError::InvalidNumber {
                text: text.to_string(),
            });
        }
        text.parse::<f64>()
            .map(|n| Token::Operand(Operand::Literal(Literal::Number(n))))
            .map_err(|_| ExpressionError::InvalidNumber {
                text: text.to_string(),
            })
    }

    /// `true`, `false`, or an uppercase variable reference.
    fn word(&mut self, start: usize) -> Result<Token, ExpressionError> {
        let word = self.take_while(is_ident_char);
        match word {
            "true" => Ok(Token::Operand(Operand::Literal(Literal::Bool(true)))),
            "false" => Ok(Token::Operand(Operand::Literal(Literal::Bool(false)))),
            name if is_variable_name(name) => {
                let path = self.dotted_path(start)?;
                Ok(Token::Operand(Operand::Variable {
                    name: name.to_string(),
                    path,
                }))
            }
            _ => Err(self.invalid_operand(start)),
        }
    }

    fn operator(&mut self, pos: usize, first: char) -> Result<Token, ExpressionError> {
        self.chars.next();
        let followed_by_eq = matches!(self.chars.peek(), Some(&(_, '=')));
        if followed_by_eq {
            self.chars.next();
        }
        let op = match (first, followed_by_eq) {
            ('=', true) => "==",
            ('!', true) => "!=",
            ('<', true) => "<=",
            ('>', true) => ">=",
            ('=', false) => "=",
            ('<', false) => "<",
            ('>', false) => ">",
            _ => return Err(ExpressionError::UnexpectedChar { ch: first, pos }),
        };
        Ok(Token::Op(op))
    }

    /// Build an `InvalidOperand` covering the rest of the current word.
    fn invalid_operand(&mut self, start: usize) -> ExpressionError {
        let end = loop {
            match self.chars.peek() {
                Some(&(i, c)) if c.is_whitespace() || "=!<>".contains(c) => break i,
                Some(_) => {
                    self.chars.next();
                }
                None => break self.input.len(),
            }
        };
        ExpressionError::InvalidOperand {
            text: self.input[start..end].to_string(),
            pos: start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operands(input: &str) -> Vec<Token> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn lexes_path_op_literal() {
        assert_eq!(
            operands("$.ssl.isSSL == false"),
            vec![
                Token::Operand(Operand::Path(vec!["ssl".into(), "isSSL".into()])),
                Token::Op("=="),
                Token::Operand(Operand::Literal(Literal::Bool(false))),
            ]
        );
    }

    #[test]
    fn lexes_variables_with_and_without_sigil() {
        assert_eq!(
            operands("ZONE.trust>=$LIMIT"),
            vec![
                Token::Operand(Operand::Variable {
                    name: "ZONE".into(),
                    path: vec!["trust".into()],
                }),
                Token::Op(">="),
                Token::Operand(Operand::Variable {
                    name: "LIMIT".into(),
                    path: vec![],
                }),
            ]
        );
    }

    #[test]
    fn lexes_numbers_and_strings() {
        assert_eq!(
            operands("-1.5 != 'it\\'s'"),
            vec![
                Token::Operand(Operand::Literal(Literal::Number(-1.5))),
                Token::Op("!="),
                Token::Operand(Operand::Literal(Literal::String("it's".into()))),
            ]
        );
    }

    #[test]
    fn string_contents_stay_opaque() {
        let tokens = operands("'1); maliciousCall(' == $.name");
        assert_eq!(
            tokens[0],
            Token::Operand(Operand::Literal(Literal::String(
                "1); maliciousCall(".into()
            )))
        );
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn rejects_lowercase_bare_words() {
        assert!(matches!(
            tokenize("trust == 3"),
            Err(ExpressionError::InvalidOperand { pos: 0, .. })
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            tokenize("'open"),
            Err(ExpressionError::UnterminatedString { pos: 0 })
        ));
        assert!(matches!(
            tokenize("$.a ! 1"),
            Err(ExpressionError::UnexpectedChar { ch: '!', .. })
        ));
        assert!(matches!(
            tokenize("$.a == foo()"),
            Err(ExpressionError::InvalidOperand { .. })
        ));
        assert!(matches!(
            tokenize("1.2.3 == 1"),
            Err(ExpressionError::InvalidNumber { .. })
        ));
        assert!(matches!(
            tokenize("$. == 1"),
            Err(ExpressionError::InvalidOperand { .. })
        ));
        assert!(matches!(
            tokenize("$.a == 1;"),
            Err(ExpressionError::UnexpectedChar { ch: ';', .. })
        ));
    }
}
