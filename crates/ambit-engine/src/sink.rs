//! Bounded accumulation of collected values.

use std::cell::RefCell;

use ambit_expr::Value;

use crate::error::Error;

/// An appendable sequence of collected values with an optional capacity.
///
/// Appending past the capacity raises `Error::Interrupted`, a cooperative
/// cancellation that unwinds the in-flight invocation. The value that hit
/// the limit is retained, so everything produced before the unwind
/// survives it; once full, further values are rejected outright.
#[derive(Debug, Default)]
pub struct Sink {
    values: RefCell<Vec<Value>>,
    limit: Option<usize>,
}

impl Sink {
    /// A sink without a capacity limit; `push` never cancels.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A sink that cancels once `limit` values have been appended.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            values: RefCell::new(Vec::with_capacity(limit)),
            limit: Some(limit),
        }
    }

    /// Append a value, signalling cancellation when the limit is reached.
    /// A sink that is already full drops the value and cancels again, so a
    /// caller that ignores the cancellation cannot grow it past the limit.
    pub fn push(&self, value: Value) -> Result<(), Error> {
        let mut values = self.values.borrow_mut();
        match self.limit {
            Some(limit) if values.len() >= limit => Err(Error::Interrupted),
            Some(limit) => {
                values.push(value);
                if values.len() >= limit {
                    Err(Error::Interrupted)
                } else {
                    Ok(())
                }
            }
            None => {
                values.push(value);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// Whether the limit has been reached.
    pub fn is_complete(&self) -> bool {
        match self.limit {
            Some(limit) => self.len() >= limit,
            None => false,
        }
    }

    /// Snapshot of the collected values.
    pub fn values(&self) -> Vec<Value> {
        self.values.borrow().clone()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_cancels() {
        let sink = Sink::unbounded();
        for i in 0..100 {
            sink.push(Value::Int(i)).unwrap();
        }
        assert_eq!(sink.len(), 100);
        assert!(!sink.is_complete());
    }

    #[test]
    fn test_push_cancels_at_limit_but_keeps_value() {
        let sink = Sink::with_limit(2);
        sink.push(Value::Int(0)).unwrap();
        assert_eq!(sink.push(Value::Int(1)), Err(Error::Interrupted));

        // The cancelling push is retained.
        assert!(sink.is_complete());
        assert_eq!(sink.into_values(), vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn test_full_sink_rejects_further_values() {
        let sink = Sink::with_limit(1);
        assert_eq!(sink.push(Value::Int(0)), Err(Error::Interrupted));
        assert_eq!(sink.push(Value::Int(1)), Err(Error::Interrupted));
        assert_eq!(sink.into_values(), vec![Value::Int(0)]);
    }
}
