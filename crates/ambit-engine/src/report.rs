//! Cooperative signal flags raised during an invocation.

/// A signal raised from within evaluated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Signal {
    /// Short-circuit the dependency chain: the current result becomes the
    /// whole call's result.
    DependencyChainStopped = 1 << 0,
    /// End the postcall chain immediately with the current result.
    PropagationChainStopped = 1 << 1,
    /// A value was explicitly appended to the invocation's sink.
    ResultCollected = 1 << 2,
    /// The invocation runs under `collect`.
    CollectModeOn = 1 << 3,
}

/// The set of signals raised during one invocation.
///
/// Flag presence is idempotent: this is a set, not a multiset, so merging
/// two reports is a plain union.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    flags: u8,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `signal` occurred.
    pub fn occurred(&mut self, signal: Signal) {
        self.flags |= signal as u8;
    }

    /// Whether `signal` occurred.
    pub fn was(&self, signal: Signal) -> bool {
        self.flags & signal as u8 != 0
    }

    /// Drop all recorded signals.
    pub fn clear(&mut self) {
        self.flags = 0;
    }

    /// Union a nested invocation's signals into this report.
    pub fn merge(&mut self, other: &Report) {
        self.flags |= other.flags;
    }

    pub fn is_empty(&self) -> bool {
        self.flags == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurred_and_was() {
        let mut report = Report::new();
        assert!(!report.was(Signal::ResultCollected));

        report.occurred(Signal::ResultCollected);
        assert!(report.was(Signal::ResultCollected));
        assert!(!report.was(Signal::DependencyChainStopped));
    }

    #[test]
    fn test_merge_is_idempotent_union() {
        let mut a = Report::new();
        a.occurred(Signal::DependencyChainStopped);

        let mut b = Report::new();
        b.occurred(Signal::DependencyChainStopped);
        b.occurred(Signal::ResultCollected);

        a.merge(&b);
        a.merge(&b);
        assert!(a.was(Signal::DependencyChainStopped));
        assert!(a.was(Signal::ResultCollected));
        assert_eq!(a, {
            let mut expected = Report::new();
            expected.occurred(Signal::DependencyChainStopped);
            expected.occurred(Signal::ResultCollected);
            expected
        });
    }

    #[test]
    fn test_clear() {
        let mut report = Report::new();
        report.occurred(Signal::CollectModeOn);
        report.clear();
        assert!(report.is_empty());
    }
}
