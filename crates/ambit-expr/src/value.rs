//! Runtime values produced by expression evaluation.

use crate::ast::BinaryOp;
use crate::error::ExprError;
use smol_str::SmolStr;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    List(Vec<Value>),
}

impl Value {
    /// Truthiness, used by `and`/`or`/`not`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Apply a binary operator. Ints promote to floats when mixed; `+`
    /// concatenates strings.
    pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ExprError> {
        use BinaryOp::*;

        match op {
            And => return Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
            Or => return Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
            Eq => return Ok(Value::Bool(lhs.loose_eq(rhs))),
            Ne => return Ok(Value::Bool(!lhs.loose_eq(rhs))),
            _ => {}
        }

        match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => Self::int_binary(op, *a, *b),
            (Value::Float(a), Value::Float(b)) => Self::float_binary(op, *a, *b),
            (Value::Int(a), Value::Float(b)) => Self::float_binary(op, *a as f64, *b),
            (Value::Float(a), Value::Int(b)) => Self::float_binary(op, *a, *b as f64),
            (Value::Str(a), Value::Str(b)) => match op {
                Add => Ok(Value::Str(SmolStr::from(format!("{a}{b}")))),
                Lt => Ok(Value::Bool(a < b)),
                Gt => Ok(Value::Bool(a > b)),
                Le => Ok(Value::Bool(a <= b)),
                Ge => Ok(Value::Bool(a >= b)),
                _ => Err(ExprError::UnsupportedOperands { op: op.symbol() }),
            },
            _ => Err(ExprError::UnsupportedOperands { op: op.symbol() }),
        }
    }

    /// Arithmetic negation.
    pub fn negate(&self) -> Result<Value, ExprError> {
        match self {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(n) => Ok(Value::Float(-n)),
            _ => Err(ExprError::UnsupportedOperands { op: "-" }),
        }
    }

    /// Equality with int/float promotion.
    fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (a, b) => a == b,
        }
    }

    fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Value, ExprError> {
        use BinaryOp::*;
        Ok(match op {
            Add => Value::Int(a.wrapping_add(b)),
            Sub => Value::Int(a.wrapping_sub(b)),
            Mul => Value::Int(a.wrapping_mul(b)),
            Div => {
                if b == 0 {
                    return Err(ExprError::DivisionByZero);
                }
                // Integer division falls back to float when not exact.
                if a % b == 0 {
                    Value::Int(a / b)
                } else {
                    Value::Float(a as f64 / b as f64)
                }
            }
            Rem => {
                if b == 0 {
                    return Err(ExprError::DivisionByZero);
                }
                Value::Int(a % b)
            }
            Lt => Value::Bool(a < b),
            Gt => Value::Bool(a > b),
            Le => Value::Bool(a <= b),
            Ge => Value::Bool(a >= b),
            Eq | Ne | And | Or => unreachable!("handled before numeric dispatch"),
        })
    }

    fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Value, ExprError> {
        use BinaryOp::*;
        Ok(match op {
            Add => Value::Float(a + b),
            Sub => Value::Float(a - b),
            Mul => Value::Float(a * b),
            Div => {
                if b == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                Value::Float(a / b)
            }
            Rem => {
                if b == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                Value::Float(a % b)
            }
            Lt => Value::Bool(a < b),
            Gt => Value::Bool(a > b),
            Le => Value::Bool(a <= b),
            Ge => Value::Bool(a >= b),
            Eq | Ne | And | Or => unreachable!("handled before numeric dispatch"),
        })
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(SmolStr::from(s))
    }
}

impl From<SmolStr> for Value {
    fn from(s: SmolStr) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
