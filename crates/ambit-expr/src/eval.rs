//! Tree-walking evaluator.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::ExprError;
use crate::value::Value;

/// Name→value bindings for evaluation.
pub type Bindings = FxHashMap<SmolStr, Value>;

/// The function table an evaluation calls into.
///
/// The error type is host-defined so that host-side failures (and host-side
/// control signals) pass through the evaluator unchanged.
pub trait CallTable {
    type Error: From<ExprError>;

    /// Whether `name` is bound as a callable.
    fn is_callable(&self, name: &str) -> bool;

    /// Invoke the callable bound to `name`.
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, Self::Error>;
}

/// An empty function table: every call fails.
pub struct NoCalls;

impl CallTable for NoCalls {
    type Error = ExprError;

    fn is_callable(&self, _name: &str) -> bool {
        false
    }

    fn call(&mut self, name: &str, _args: &[Value]) -> Result<Value, Self::Error> {
        Err(ExprError::NotCallable {
            name: SmolStr::from(name),
        })
    }
}

/// Evaluate a parsed expression against variable bindings and a function
/// table.
pub fn evaluate<C: CallTable>(
    expr: &Expr,
    vars: &Bindings,
    calls: &mut C,
) -> Result<Value, C::Error> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(n) => Ok(Value::Float(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),

        Expr::Name(name) => match vars.get(name.as_str()) {
            Some(value) => Ok(value.clone()),
            None => Err(ExprError::UnknownName { name: name.clone() }.into()),
        },

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, vars, calls)?;
            match op {
                UnaryOp::Neg => value.negate().map_err(Into::into),
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
            }
        }

        Expr::Binary { op, lhs, rhs } => {
            // `and`/`or` short-circuit on the left operand.
            if *op == BinaryOp::And {
                let lhs = evaluate(lhs, vars, calls)?;
                if !lhs.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                let rhs = evaluate(rhs, vars, calls)?;
                return Ok(Value::Bool(rhs.is_truthy()));
            }
            if *op == BinaryOp::Or {
                let lhs = evaluate(lhs, vars, calls)?;
                if lhs.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                let rhs = evaluate(rhs, vars, calls)?;
                return Ok(Value::Bool(rhs.is_truthy()));
            }

            let lhs = evaluate(lhs, vars, calls)?;
            let rhs = evaluate(rhs, vars, calls)?;
            Value::binary(*op, &lhs, &rhs).map_err(Into::into)
        }

        Expr::Call { name, args } => {
            if !calls.is_callable(name.as_str()) {
                return Err(ExprError::NotCallable { name: name.clone() }.into());
            }
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate(arg, vars, calls)?);
            }
            calls.call(name.as_str(), &evaluated)
        }
    }
}
