//! Engine error definitions.

use ambit_expr::ExprError;
use smol_str::SmolStr;
use thiserror::Error;

/// An error raised while defining or resolving names.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// The name is not a well-formed identifier. Fails fast at
    /// `define`/`resolve` and is not recoverable.
    #[error("invalid name `{name}`: names must be non-empty")]
    InvalidName { name: String },

    /// The name is absent in the full scope chain. Recoverable.
    #[error("could not resolve `{name}`")]
    NotFound { name: SmolStr },

    /// A dependency of an expression could not be resolved. This is the
    /// `NotFound` of the dependency, annotated with the dependent
    /// expression's name for diagnostics.
    #[error("could not resolve `{dependency}`, required by `{expression}`")]
    MissingDependency {
        dependency: SmolStr,
        expression: SmolStr,
    },

    /// A name re-entered its own active resolution chain. Fatal, never
    /// retried.
    #[error("cyclic definition: `{name}` depends on itself")]
    CycleDetected { name: SmolStr },

    /// A fault from the expression language (tokenizing, parsing or
    /// evaluation).
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// Cooperative cancellation raised when a bounded collection reaches
    /// capacity. Caught at the `collect` boundary; never observed by
    /// external callers.
    #[error("collection capacity reached")]
    Interrupted,
}

impl Error {
    /// Whether this error reports an unresolvable name, either directly or
    /// as a missing dependency of an expression.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::MissingDependency { .. }
        )
    }
}
