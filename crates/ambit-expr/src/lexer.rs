//! High-level lexer interface.

use crate::error::ExprError;
use crate::token::{Token, TokenKind};
use logos::Logos;

/// A lexer for expression text.
///
/// Wraps the logos-generated lexer with a nicer interface and error handling.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, TokenKind>,
    /// Track if we've emitted EOF
    done: bool,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given expression text.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            done: false,
        }
    }

    /// Get the source text.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<Token, ExprError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(Ok(kind)) => Some(Ok(Token::new(kind, self.inner.span()))),
            Some(Err(())) => Some(Err(ExprError::UnexpectedChar {
                span: self.inner.span(),
            })),
            None => {
                if !self.done {
                    self.done = true;
                    let pos = self.inner.span().end;
                    return Some(Ok(Token::new(TokenKind::Eof, pos..pos)));
                }
                None
            }
        }
    }
}
