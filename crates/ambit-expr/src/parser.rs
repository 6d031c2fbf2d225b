//! Recursive descent parser for expression text.

use smol_str::SmolStr;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::ExprError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Operator precedence levels for Pratt parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * / %
    Unary,      // - not
}

impl Precedence {
    fn of(kind: &TokenKind) -> Self {
        match kind {
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::EqEq | TokenKind::Ne => Precedence::Equality,
            TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => Precedence::Comparison,
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
            _ => Precedence::None,
        }
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::Ne => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    })
}

/// Parser for a single expression.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    current: Token,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given expression text.
    pub fn new(source: &'source str) -> Result<Self, ExprError> {
        let mut lexer = Lexer::new(source);
        let current = match lexer.next() {
            Some(result) => result?,
            None => Token::new(TokenKind::Eof, 0..0),
        };
        Ok(Self { lexer, current })
    }

    /// Parse a complete expression, requiring all input to be consumed.
    pub fn parse(mut self) -> Result<Expr, ExprError> {
        let expr = self.parse_precedence(Precedence::None)?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of expression"));
        }
        Ok(expr)
    }

    fn advance(&mut self) -> Result<(), ExprError> {
        self.current = match self.lexer.next() {
            Some(result) => result?,
            None => Token::new(TokenKind::Eof, self.current.span.clone()),
        };
        Ok(())
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<(), ExprError> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        if self.current.kind == TokenKind::Eof {
            ExprError::UnexpectedEof
        } else {
            ExprError::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current.kind.describe(),
                span: self.current.span.clone(),
            }
        }
    }

    fn parse_precedence(&mut self, min: Precedence) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let prec = Precedence::of(&self.current.kind);
            if prec <= min {
                return Ok(lhs);
            }
            // Precedence::of only maps binary operators above None.
            let op = binary_op(&self.current.kind).ok_or_else(|| self.unexpected("operator"))?;
            self.advance()?;

            let rhs = self.parse_precedence(prec)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, ExprError> {
        match self.current.kind.clone() {
            TokenKind::Int(n) => {
                self.advance()?;
                Ok(Expr::Int(n))
            }
            TokenKind::Float(n) => {
                self.advance()?;
                Ok(Expr::Float(n))
            }
            TokenKind::Str(s) => {
                self.advance()?;
                Ok(Expr::Str(s))
            }
            TokenKind::True => {
                self.advance()?;
                Ok(Expr::Bool(true))
            }
            TokenKind::False => {
                self.advance()?;
                Ok(Expr::Bool(false))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::Null)
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                if self.current.kind == TokenKind::LParen {
                    self.parse_call(name)
                } else {
                    Ok(Expr::Name(name))
                }
            }
            TokenKind::Minus => {
                self.advance()?;
                let operand = self.parse_precedence(Precedence::Unary)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Not => {
                self.advance()?;
                let operand = self.parse_precedence(Precedence::Unary)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_precedence(Precedence::None)?;
                self.consume(TokenKind::RParen, "closing `)`")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_call(&mut self, name: SmolStr) -> Result<Expr, ExprError> {
        self.consume(TokenKind::LParen, "`(`")?;

        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                args.push(self.parse_precedence(Precedence::None)?);
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
        }
        self.consume(TokenKind::RParen, "closing `)`")?;

        Ok(Expr::Call { name, args })
    }
}
