//! Token definitions for the expression language.

use logos::Logos;
use smol_str::SmolStr;

/// A token with its kind and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: std::ops::Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, span: std::ops::Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// Token kinds for the expression language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // ========================================================================
    // Keywords
    // ========================================================================
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // ========================================================================
    // Operators
    // ========================================================================
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // ========================================================================
    // Delimiters
    // ========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    // ========================================================================
    // Literals
    // ========================================================================
    /// Float literal
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*", |lex| parse_float(lex.slice()))]
    Float(f64),

    /// Integer literal
    #[regex(r"[0-9][0-9_]*", |lex| parse_int(lex.slice()))]
    Int(i64),

    /// String literal
    #[regex(r#""([^"\\]|\\.)*""#, |lex| parse_string(lex.slice()))]
    Str(SmolStr),

    /// Identifier. A positional marker `$N` lexes as the plain identifier
    /// `_N`, so positional references share the ordinary name grammar.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| SmolStr::from(lex.slice()))]
    #[regex(r"\$[0-9]+", |lex| normalize_positional(lex.slice()))]
    Ident(SmolStr),

    /// End of input
    Eof,
}

impl TokenKind {
    /// Check if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("`{name}`"),
            TokenKind::Int(n) => format!("`{n}`"),
            TokenKind::Float(n) => format!("`{n}`"),
            TokenKind::Str(s) => format!("\"{s}\""),
            TokenKind::Eof => "end of expression".to_string(),
            other => format!("{other:?}"),
        }
    }
}

/// Recognize the normalized form of a positional marker (`_N`) and return
/// its one-based argument position. `_0` is an ordinary identifier, not a
/// marker.
pub fn positional(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse().ok()? {
        0 => None,
        position => Some(position),
    }
}

// ============================================================================
// Helper functions for parsing
// ============================================================================

fn parse_int(s: &str) -> Option<i64> {
    let s = s.replace('_', "");
    s.parse().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    let s = s.replace('_', "");
    s.parse().ok()
}

fn parse_string(s: &str) -> Option<SmolStr> {
    // Remove quotes
    let s = s.strip_prefix('"')?.strip_suffix('"')?;

    // Handle escape sequences
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    Some(SmolStr::from(result))
}

fn normalize_positional(s: &str) -> Option<SmolStr> {
    let digits = s.strip_prefix('$')?;
    // Positions are one-based; `$0` is a lex error, not a marker.
    if digits.bytes().all(|b| b == b'0') {
        return None;
    }
    Some(SmolStr::from(format!("_{digits}")))
}
