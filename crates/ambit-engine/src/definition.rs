//! Definitions: what a name is bound to.

use std::rc::Rc;

use ambit_expr::Value;
use smol_str::SmolStr;

use crate::context::{Context, FnDef};
use crate::error::Error;
use crate::expression::Expression;
use crate::scope::Scope;

/// Raw input to `define`, before classification.
///
/// A closed enum populated through `From` conversions: text becomes an
/// expression, a function definition becomes a context, and everything
/// else is stored as a constant.
#[derive(Debug, Clone)]
pub enum Input {
    Value(Value),
    Text(String),
    Function(FnDef),
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<i64> for Input {
    fn from(n: i64) -> Self {
        Input::Value(Value::Int(n))
    }
}

impl From<f64> for Input {
    fn from(n: f64) -> Self {
        Input::Value(Value::Float(n))
    }
}

impl From<bool> for Input {
    fn from(b: bool) -> Self {
        Input::Value(Value::Bool(b))
    }
}

/// A `Value` passes through as a constant, including `Value::Str`: this is
/// the escape hatch for storing literal text without parsing it.
impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<FnDef> for Input {
    fn from(def: FnDef) -> Self {
        Input::Function(def)
    }
}

/// The thing a name is bound to.
#[derive(Clone)]
pub enum Definition {
    /// Returns the stored value unconditionally.
    Constant(Value),
    /// Re-evaluated against the call-site scope on every resolution.
    Expression(Rc<Expression>),
    /// The function wrapper itself; resolution yields it unevaluated.
    Function(Context),
}

impl std::fmt::Debug for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Definition::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Definition::Expression(expr) => f.debug_tuple("Expression").field(expr).finish(),
            Definition::Function(_) => f.debug_tuple("Function").finish(),
        }
    }
}

/// Classify a raw input into a definition. This is the single place where
/// the three-way dispatch occurs; all downstream code matches exhaustively
/// on the variant.
pub fn classify(input: Input, parent: &Scope) -> Result<Definition, Error> {
    Ok(match input {
        Input::Value(value) => Definition::Constant(value),
        Input::Text(text) => Definition::Expression(Rc::new(Expression::new(&text)?)),
        Input::Function(def) => Definition::Function(Context::new(def, parent)?),
    })
}

/// The result of resolving a name: either a plain value or the function
/// wrapper bound to the name.
#[derive(Debug, Clone)]
pub enum Resolved {
    Value(Value),
    Context(Context),
}

impl Resolved {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Resolved::Value(value) => Some(value),
            Resolved::Context(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            Resolved::Context(_) => None,
        }
    }

    pub fn into_context(self) -> Option<Context> {
        match self {
            Resolved::Context(context) => Some(context),
            Resolved::Value(_) => None,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self, Resolved::Context(_))
    }
}

/// Validate a scope identifier.
pub(crate) fn check_name(name: &str) -> Result<SmolStr, Error> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(SmolStr::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_classifies_as_expression() {
        let scope = Scope::new();
        let def = classify(Input::from("a+b"), &scope).unwrap();
        assert!(matches!(def, Definition::Expression(_)));
    }

    #[test]
    fn test_value_classifies_as_constant() {
        let scope = Scope::new();
        let def = classify(Input::from(42), &scope).unwrap();
        assert!(matches!(def, Definition::Constant(Value::Int(42))));
    }

    #[test]
    fn test_string_value_skips_parsing() {
        // "a+b" as a Value stays literal text instead of an expression.
        let scope = Scope::new();
        let def = classify(Input::from(Value::from("a+b")), &scope).unwrap();
        assert!(matches!(def, Definition::Constant(Value::Str(_))));
    }

    #[test]
    fn test_function_classifies_as_context() {
        let scope = Scope::new();
        let def = classify(
            Input::from(FnDef::new(|_, _| Ok(Value::Null))),
            &scope,
        )
        .unwrap();
        assert!(matches!(def, Definition::Function(_)));
    }

    #[test]
    fn test_malformed_text_fails_at_classification() {
        let scope = Scope::new();
        let err = classify(Input::from("a +"), &scope);
        assert!(matches!(err, Err(Error::Expr(_))));
    }

    #[test]
    fn test_check_name_rejects_empty() {
        assert!(matches!(check_name(""), Err(Error::InvalidName { .. })));
        assert!(check_name("x").is_ok());
    }
}
