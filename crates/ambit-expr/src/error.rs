//! Expression error definitions.

use smol_str::SmolStr;
use thiserror::Error;

/// An error raised while tokenizing, parsing or evaluating an expression.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character")]
    UnexpectedChar { span: std::ops::Range<usize> },

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: std::ops::Range<usize>,
    },

    #[error("unexpected end of expression")]
    UnexpectedEof,

    #[error("unknown name `{name}`")]
    UnknownName { name: SmolStr },

    #[error("`{name}` is not callable")]
    NotCallable { name: SmolStr },

    #[error("unsupported operand types for `{op}`")]
    UnsupportedOperands { op: &'static str },

    #[error("division by zero")]
    DivisionByZero,
}
