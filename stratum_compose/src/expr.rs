// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Score expressions.
//!
//! Grammar, lowest precedence first; binary operators associate to the left:
//!
//! ```text
//! sum     = product (("+" | "-") product)*
//! product = unary (("*" | "/") unary)*
//! unary   = "-" unary | primary
//! primary = number | operand | "(" sum ")"
//! ```
//!
//! Numbers are decimal with an optional exponent (`2`, `0.5`, `1e3`).
//! Operands are identifiers: an ASCII letter or `_`, then letters, digits, or
//! `_`.
//!
//! Nesting is limited to [`MAX_DEPTH`] levels. Each parenthesis, unary minus,
//! and chained binary operator adds a level.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Deepest nesting [`Expr::parse`] accepts.
pub const MAX_DEPTH: usize = 256;

/// Errors from parsing or validating a score expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// The expression is blank.
    #[error("score expression is empty")]
    EmptyExpression,
    /// The expression names an operand that was not supplied.
    #[error("score expression refers to unknown layer `{0}`")]
    UnknownOperand(String),
    /// The expression is malformed.
    #[error("syntax error at offset {offset}: {message}")]
    SyntaxError {
        /// Byte offset of the offending token.
        offset: usize,
        /// What went wrong.
        message: String,
    },
}

impl ExprError {
    fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::SyntaxError {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// A binary arithmetic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

impl BinaryOp {
    fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            Self::Add => left + right,
            Self::Subtract => left - right,
            Self::Multiply => left * right,
            Self::Divide => left / right,
        }
    }
}

/// A parsed score expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A reference to an operand layer's score.
    Operand(String),
    /// Unary minus.
    Neg(Box<Expr>),
    /// A binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
}

impl Expr {
    /// Parses `text`.
    ///
    /// Expressions nested deeper than [`MAX_DEPTH`] are a
    /// [`SyntaxError`](ExprError::SyntaxError).
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(ExprError::EmptyExpression);
        }
        Parser {
            tokens,
            index: 0,
            end: text.len(),
            depth: 0,
        }
        .parse()
    }

    /// Returns the distinct operand names, sorted.
    #[must_use]
    pub fn operands(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_operands(&mut names);
        names
    }

    fn collect_operands<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Self::Number(_) => {}
            Self::Operand(name) => {
                names.insert(name);
            }
            Self::Neg(inner) => inner.collect_operands(names),
            Self::Binary { left, right, .. } => {
                left.collect_operands(names);
                right.collect_operands(names);
            }
        }
    }

    /// Returns the first operand, in reading order, for which `is_known`
    /// returns `false`.
    fn first_unknown(&self, is_known: &dyn Fn(&str) -> bool) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Operand(name) => (!is_known(name)).then_some(name.as_str()),
            Self::Neg(inner) => inner.first_unknown(is_known),
            Self::Binary { left, right, .. } => left
                .first_unknown(is_known)
                .or_else(|| right.first_unknown(is_known)),
        }
    }

    /// Checks that every operand satisfies `is_known`.
    pub fn check_operands(&self, is_known: &dyn Fn(&str) -> bool) -> Result<(), ExprError> {
        match self.first_unknown(is_known) {
            Some(name) => Err(ExprError::UnknownOperand(name.to_string())),
            None => Ok(()),
        }
    }

    /// Evaluates the expression with `operand` supplying each operand's
    /// value. IEEE semantics apply: division by zero yields an infinity or
    /// NaN.
    pub fn eval(&self, operand: &dyn Fn(&str) -> f64) -> f64 {
        match self {
            Self::Number(value) => *value,
            Self::Operand(name) => operand(name),
            Self::Neg(inner) => -inner.eval(operand),
            Self::Binary { op, left, right } => op.apply(left.eval(operand), right.eval(operand)),
        }
    }
}

/// Parses `text` and checks that it only refers to `names`, without
/// evaluating it.
pub fn validate_expression(text: &str, names: &[&str]) -> Result<Expr, ExprError> {
    let expr = Expr::parse(text)?;
    expr.check_operands(&|name| names.contains(&name))?;
    Ok(expr)
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    let mut tokens = Vec::new();
    while idx < bytes.len() {
        let b = bytes[idx];
        if b.is_ascii_whitespace() {
            idx += 1;
            continue;
        }
        let start = idx;
        let token = match b {
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            _ if b.is_ascii_digit() || b == b'.' => {
                idx += 1;
                while idx < bytes.len()
                    && (bytes[idx].is_ascii_digit()
                        || bytes[idx] == b'.'
                        || matches!(bytes[idx], b'e' | b'E' | b'+' | b'-'))
                {
                    // A sign only belongs to the literal right after an exponent marker.
                    if matches!(bytes[idx], b'+' | b'-') && !matches!(bytes[idx - 1], b'e' | b'E') {
                        break;
                    }
                    idx += 1;
                }
                let raw = &text[start..idx];
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| ExprError::syntax(start, format!("invalid number `{raw}`")))?;
                tokens.push((start, Token::Number(value)));
                continue;
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                idx += 1;
                while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_') {
                    idx += 1;
                }
                tokens.push((start, Token::Ident(String::from(&text[start..idx]))));
                continue;
            }
            _ => {
                let ch = text[start..].chars().next().unwrap_or('?');
                return Err(ExprError::syntax(start, format!("unexpected character `{ch}`")));
            }
        };
        tokens.push((start, token));
        idx += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    index: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn parse(mut self) -> Result<Expr, ExprError> {
        let expr = self.parse_add_sub()?;
        if let Some((offset, _)) = self.tokens.get(self.index) {
            return Err(ExprError::syntax(*offset, "unexpected trailing input"));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(_, token)| token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.index).map_or(self.end, |(offset, _)| *offset)
    }

    fn descend(&mut self, offset: usize) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::syntax(
                offset,
                format!("expression nests deeper than {MAX_DEPTH} levels"),
            ));
        }
        Ok(())
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).map(|(_, token)| token.clone());
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn parse_add_sub(&mut self) -> Result<Expr, ExprError> {
        let base = self.depth;
        let mut expr = self.parse_mul_div()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.descend(self.offset())?;
            self.index += 1;
            let right = self.parse_mul_div()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(expr)
    }

    fn parse_mul_div(&mut self) -> Result<Expr, ExprError> {
        let base = self.depth;
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => break,
            };
            self.descend(self.offset())?;
            self.index += 1;
            let right = self.parse_unary()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.descend(self.offset())?;
            self.index += 1;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Neg(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let offset = self.offset();
        match self.consume() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => Ok(Expr::Operand(name)),
            Some(Token::LParen) => {
                self.descend(offset)?;
                let expr = self.parse_add_sub()?;
                self.depth -= 1;
                let close = self.offset();
                if !matches!(self.consume(), Some(Token::RParen)) {
                    return Err(ExprError::syntax(close, "missing `)`"));
                }
                Ok(expr)
            }
            Some(_) => Err(ExprError::syntax(offset, "expected a number, an operand, or `(`")),
            None => Err(ExprError::syntax(offset, "unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn eval(text: &str, a: f64, b: f64) -> f64 {
        Expr::parse(text).unwrap().eval(&|name| match name {
            "a" => a,
            "b" => b,
            _ => f64::NAN,
        })
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("a+b*2", 1.0, 3.0), 7.0);
        assert_eq!(eval("(a+b)*2", 1.0, 3.0), 8.0);
        assert_eq!(eval("a-b-1", 10.0, 3.0), 6.0);
        assert_eq!(eval("a/b/2", 12.0, 3.0), 2.0);
        assert_eq!(eval("-a+b", 1.0, 3.0), 2.0);
        assert_eq!(eval("--a", 4.0, 0.0), 4.0);
    }

    #[test]
    fn number_literals() {
        assert_eq!(eval("1e2 + .5", 0.0, 0.0), 100.5);
        assert_eq!(eval("2.5e-1*a", 4.0, 0.0), 1.0);
        assert_eq!(eval("1-2", 0.0, 0.0), -1.0);
    }

    #[test]
    fn division_by_zero_is_not_finite() {
        assert!(!eval("a/b", 1.0, 0.0).is_finite());
        assert!(eval("a/b", 0.0, 0.0).is_nan());
    }

    #[test]
    fn operands_are_collected_once() {
        let expr = Expr::parse("b + a * b - score_2").unwrap();
        assert_eq!(
            expr.operands().into_iter().collect::<Vec<_>>(),
            vec!["a", "b", "score_2"]
        );
    }

    #[test]
    fn empty_expressions() {
        assert_eq!(Expr::parse(""), Err(ExprError::EmptyExpression));
        assert_eq!(Expr::parse("   \t"), Err(ExprError::EmptyExpression));
    }

    #[test]
    fn syntax_errors_carry_offsets() {
        assert_eq!(
            Expr::parse("a + "),
            Err(ExprError::syntax(4, "unexpected end of expression"))
        );
        assert_eq!(Expr::parse("(a + b"), Err(ExprError::syntax(6, "missing `)`")));
        assert_eq!(
            Expr::parse("a b"),
            Err(ExprError::syntax(2, "unexpected trailing input"))
        );
        assert!(matches!(
            Expr::parse("a % b"),
            Err(ExprError::SyntaxError { offset: 2, .. })
        ));
        assert!(matches!(
            Expr::parse("1.2.3"),
            Err(ExprError::SyntaxError { offset: 0, .. })
        ));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let parens = "(".repeat(100_000) + "a" + &")".repeat(100_000);
        assert!(matches!(
            validate_expression(&parens, &["a"]),
            Err(ExprError::SyntaxError { offset: 256, .. })
        ));

        let negations = "-".repeat(100_000) + "a";
        assert!(matches!(
            Expr::parse(&negations),
            Err(ExprError::SyntaxError { offset: 256, .. })
        ));

        let chain = "a+".repeat(1_000) + "a";
        assert!(matches!(Expr::parse(&chain), Err(ExprError::SyntaxError { .. })));
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let parens = "(".repeat(MAX_DEPTH) + "a" + &")".repeat(MAX_DEPTH);
        assert_eq!(eval(&parens, 4.0, 0.0), 4.0);

        let chain = "a+".repeat(MAX_DEPTH) + "a";
        assert_eq!(eval(&chain, 1.0, 0.0), 257.0);
    }

    #[test]
    fn validation_reports_first_unknown_operand() {
        assert!(validate_expression("a+b", &["a", "b"]).is_ok());
        assert_eq!(
            validate_expression("a + c * d", &["a", "b"]),
            Err(ExprError::UnknownOperand(String::from("c")))
        );
        assert_eq!(validate_expression(" ", &["a"]), Err(ExprError::EmptyExpression));
        assert!(matches!(
            validate_expression("a +* b", &["a", "b"]),
            Err(ExprError::SyntaxError { offset: 3, .. })
        ));
    }
}
