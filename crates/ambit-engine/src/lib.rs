//! # Ambit engine
//!
//! A hierarchical, lazily-evaluated name-resolution engine: names are
//! defined in nested scopes as constants, textual expressions or wrapped
//! functions, and resolving a name yields the stored constant, the live
//! re-evaluated result of its expression, or the function wrapper itself,
//! walking up the scope chain when the name is absent locally.
//!
//! Expression dependencies are dynamically scoped relative to the call
//! site: the same expression, resolved from different descendant scopes,
//! may see different values for the names it references.
//!
//! ## Example
//!
//! ```
//! use ambit_engine::{Scope, Value};
//!
//! let scope = Scope::new();
//! scope.define("a", 12)?;
//!
//! let child = scope.new_child();
//! child.define("add", "a*a")?;
//!
//! let grandchild = child.new_child();
//! grandchild.define("a", 24)?;
//!
//! assert_eq!(child.resolve("add")?.into_value(), Some(Value::Int(144)));
//! assert_eq!(grandchild.resolve("add")?.into_value(), Some(Value::Int(576)));
//! # Ok::<(), ambit_engine::Error>(())
//! ```

mod chain;
mod context;
mod curry;
mod definition;
mod error;
mod expression;
mod report;
mod scope;
mod sink;

pub use ambit_expr::{Bindings, Value};
pub use chain::ResolveChain;
pub use context::{Context, ContextParam, FnDef, Frame, NativeFn};
pub use curry::Curry;
pub use definition::{Definition, Input, Resolved};
pub use error::Error;
pub use expression::Expression;
pub use report::{Report, Signal};
pub use scope::Scope;
pub use sink::Sink;
