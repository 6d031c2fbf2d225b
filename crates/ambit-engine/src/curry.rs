//! Partial application over contexts.

use std::cell::RefCell;

use ambit_expr::Value;

use crate::context::Context;
use crate::error::Error;

/// A context that accumulates arguments across calls and only invokes the
/// wrapped function once its leading required parameters are saturated.
///
/// A call that does not yet saturate the parameters returns `None`; the
/// saturating call consumes the buffered arguments and returns the
/// invocation's result.
pub struct Curry {
    context: Context,
    required: usize,
    pending: RefCell<Vec<Value>>,
}

impl Curry {
    pub fn new(context: Context) -> Self {
        let required = context
            .params()
            .iter()
            .take_while(|param| !param.is_optional())
            .count();
        Self {
            context,
            required,
            pending: RefCell::new(Vec::new()),
        }
    }

    /// The wrapped context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Append arguments; invoke once enough have accumulated.
    pub fn call(&self, args: &[Value]) -> Result<Option<Value>, Error> {
        let saturated = {
            let mut pending = self.pending.borrow_mut();
            pending.extend_from_slice(args);

            if pending.len() < self.required {
                None
            } else {
                // Arguments beyond the required count are discarded along
                // with the buffer, ready for the next round.
                let taken = pending[..self.required].to_vec();
                pending.clear();
                Some(taken)
            }
        };

        match saturated {
            Some(args) => Ok(Some(self.context.call(&args)?)),
            None => Ok(None),
        }
    }
}
