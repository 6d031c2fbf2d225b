//! Cycle guard for in-flight resolutions.

use smol_str::SmolStr;

/// The ordered set of names currently being resolved within one logical
/// `resolve` call.
///
/// Branching to resolve a dependency clones the chain, so sibling
/// dependencies never see each other's branch, while every branch carries
/// the full ancestor path. Re-entry of an already-active name is a cycle.
#[derive(Debug, Clone, Default)]
pub struct ResolveChain {
    names: Vec<SmolStr>,
}

impl ResolveChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is already being resolved on this path.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Clone this chain with `name` pushed on top.
    pub fn branch(&self, name: &str) -> Self {
        let mut names = self.names.clone();
        names.push(SmolStr::from(name));
        Self { names }
    }
}
