//! # Ambit expression language
//!
//! Tokenizes, parses and evaluates the small expression grammar used for
//! textual definitions in the ambit engine: arithmetic, comparisons,
//! boolean logic and function calls by name.
//!
//! The lexer uses the `logos` crate. Positional markers of the form `$N`
//! are normalized to ordinary `_N` identifiers at the token level, so
//! positional references and plain names share one grammar.
//!
//! ## Example
//!
//! ```
//! use ambit_expr::{evaluate, free_names, parse, Bindings, NoCalls, Value};
//!
//! let expr = parse("-(a+b)*2").unwrap();
//! assert_eq!(free_names(&expr), vec!["a", "b"]);
//!
//! let mut vars = Bindings::default();
//! vars.insert("a".into(), Value::Int(1));
//! vars.insert("b".into(), Value::Int(2));
//! assert_eq!(evaluate(&expr, &vars, &mut NoCalls), Ok(Value::Int(-6)));
//! ```

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;
mod token;
mod value;

pub use ast::{free_names, BinaryOp, Expr, UnaryOp};
pub use error::ExprError;
pub use eval::{evaluate, Bindings, CallTable, NoCalls};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{positional, Token, TokenKind};
pub use value::Value;

/// Parse expression text into an AST.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    Parser::new(source)?.parse()
}
