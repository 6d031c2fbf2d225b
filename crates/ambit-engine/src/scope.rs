//! Hierarchical name→definition mapping with parent delegation.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::chain::ResolveChain;
use crate::definition::{check_name, classify, Definition, Input, Resolved};
use crate::error::Error;
use crate::report::Report;

/// A virtual scope: an owned mapping from name to definition plus a shared
/// link to the parent scope.
///
/// Cloning a `Scope` yields another handle to the same scope. A child
/// holds a reference to its parent; a parent is never aware of its
/// children, and defining a name never mutates an ancestor.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    bindings: RefCell<FxHashMap<SmolStr, Definition>>,
    parent: Option<Scope>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// Create a root scope.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                bindings: RefCell::new(FxHashMap::default()),
                parent: None,
            }),
        }
    }

    /// Create a new scope whose parent is this one.
    pub fn new_child(&self) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                bindings: RefCell::new(FxHashMap::default()),
                parent: Some(self.clone()),
            }),
        }
    }

    /// A scope with the given parent and a private copy of `bindings`.
    /// Used by context cloning.
    pub(crate) fn forked(parent: Option<Scope>, bindings: FxHashMap<SmolStr, Definition>) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                bindings: RefCell::new(bindings),
                parent,
            }),
        }
    }

    pub(crate) fn parent(&self) -> Option<Scope> {
        self.inner.parent.clone()
    }

    pub(crate) fn bindings_snapshot(&self) -> FxHashMap<SmolStr, Definition> {
        self.inner.bindings.borrow().clone()
    }

    /// Define a new variable, expression or function in this scope.
    ///
    /// Redefinition is always permitted and replaces the previous binding
    /// in this scope only; ancestors are never touched.
    pub fn define(&self, name: &str, value: impl Into<Input>) -> Result<(), Error> {
        let name = check_name(name)?;
        let definition = classify(value.into(), self)?;

        trace!(name = %name, ?definition, "define");
        self.inner.bindings.borrow_mut().insert(name, definition);
        Ok(())
    }

    /// Resolve a name against this scope and its ancestors.
    ///
    /// Constants yield their stored value; expressions are re-evaluated
    /// against this scope on every call; functions yield their wrapper.
    pub fn resolve(&self, name: &str) -> Result<Resolved, Error> {
        check_name(name)?;
        self.forward_resolve(name, self, &ResolveChain::new())
    }

    /// The ordered dependency names of the expression bound to `name` in
    /// this scope, or `None` when the local binding is not an expression.
    pub fn dependencies(&self, name: &str) -> Option<Vec<SmolStr>> {
        match self.inner.bindings.borrow().get(name) {
            Some(Definition::Expression(expr)) => Some(expr.dependencies().to_vec()),
            _ => None,
        }
    }

    /// The core resolution walk.
    ///
    /// `origin` is always the scope where the outermost `resolve` began,
    /// never the scope that lexically owns the definition: free variables
    /// inside expressions are dynamically scoped relative to the call
    /// site, so the same expression may see different values for its
    /// dependencies depending on where resolution started.
    pub(crate) fn forward_resolve(
        &self,
        name: &str,
        origin: &Scope,
        chain: &ResolveChain,
    ) -> Result<Resolved, Error> {
        if chain.contains(name) {
            trace!(name, "cycle detected");
            return Err(Error::CycleDetected {
                name: SmolStr::from(name),
            });
        }

        // Clone the definition out so the borrow ends before evaluation,
        // which may re-enter this scope.
        let local = self.inner.bindings.borrow().get(name).cloned();

        if let Some(definition) = local {
            let branch = chain.branch(name);
            return match definition {
                Definition::Constant(value) => Ok(Resolved::Value(value)),
                Definition::Expression(expr) => {
                    let mut report = Report::new();
                    expr.evaluate(origin, &branch, &Default::default(), &mut report)
                        .map(Resolved::Value)
                        .map_err(|err| match err {
                            Error::NotFound { name: dependency } => Error::MissingDependency {
                                dependency,
                                expression: SmolStr::from(name),
                            },
                            other => other,
                        })
                }
                Definition::Function(context) => Ok(Resolved::Context(context)),
            };
        }

        match &self.inner.parent {
            Some(parent) => parent.forward_resolve(name, origin, chain),
            None => Err(Error::NotFound {
                name: SmolStr::from(name),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambit_expr::Value;

    fn value_of(scope: &Scope, name: &str) -> Value {
        scope.resolve(name).unwrap().into_value().unwrap()
    }

    #[test]
    fn test_access_to_parent_scope_variables() {
        let parent = Scope::new();
        parent.define("var", 123).unwrap();

        let child = parent.new_child();
        assert_eq!(value_of(&child, "var"), Value::Int(123));
    }

    #[test]
    fn test_hide_parent_variable_in_child_scope() {
        let parent = Scope::new();
        parent.define("var", 123).unwrap();

        let child = parent.new_child();
        child.define("var", 12).unwrap();

        assert_eq!(value_of(&child, "var"), Value::Int(12));
        assert_eq!(value_of(&parent, "var"), Value::Int(123));
    }

    #[test]
    fn test_undefined_key() {
        let scope = Scope::new();
        let err = scope.resolve("R60g0ME7").unwrap_err();
        assert_eq!(
            err,
            Error::NotFound {
                name: SmolStr::from("R60g0ME7")
            }
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let scope = Scope::new();
        assert!(matches!(
            scope.define("", 0),
            Err(Error::InvalidName { .. })
        ));
        assert!(matches!(
            scope.resolve(""),
            Err(Error::InvalidName { .. })
        ));
    }

    #[test]
    fn test_redefinition_replaces_binding() {
        let scope = Scope::new();
        scope.define("var", 1).unwrap();
        scope.define("var", 2).unwrap();
        assert_eq!(value_of(&scope, "var"), Value::Int(2));
    }

    #[test]
    fn test_expression_dependencies() {
        let scope = Scope::new();
        scope.define("var", "-(a+b)*bar(foo)").unwrap();

        let deps = scope.dependencies("var").unwrap();
        for expected in ["a", "b", "foo"] {
            assert!(deps.iter().any(|d| d == expected));
        }
    }

    #[test]
    fn test_no_dependencies_for_constants_or_missing() {
        let scope = Scope::new();
        assert!(scope.dependencies("boo").is_none());

        scope.define("number", 12).unwrap();
        assert!(scope.dependencies("number").is_none());
    }

    #[test]
    fn test_resolve_static_expression_chain() {
        let scope = Scope::new();
        scope.define("a", 12).unwrap();
        scope.define("b", -3).unwrap();
        scope.define("add", "a+b").unwrap();
        scope.define("mul", "a*add").unwrap();
        scope.define("foo", "a*add+b*mul*(-2)").unwrap();

        assert_eq!(value_of(&scope, "add"), Value::Int(9));
        assert_eq!(value_of(&scope, "mul"), Value::Int(12 * 9));
        assert_eq!(
            value_of(&scope, "foo"),
            Value::Int(12 * 9 + (-3) * (12 * 9) * (-2))
        );
    }

    #[test]
    fn test_resolve_dynamic_expression() {
        let scope = Scope::new();
        scope.define("a", 12).unwrap();

        let child = scope.new_child();
        let grandchild = child.new_child();
        child.define("add", "a*a").unwrap();
        grandchild.define("a", 24).unwrap();

        // Same expression, different results based on call-site scope.
        assert_eq!(value_of(&child, "add"), Value::Int(144));
        assert_eq!(value_of(&grandchild, "add"), Value::Int(576));
    }

    #[test]
    fn test_missing_dependency_reports_both_names() {
        let scope = Scope::new();
        scope.define("foo", "bar*bar2").unwrap();

        let err = scope.resolve("foo").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err,
            Error::MissingDependency {
                dependency: SmolStr::from("bar"),
                expression: SmolStr::from("foo"),
            }
        );
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let scope = Scope::new();
        scope.define("foo", "foo+1").unwrap();

        let err = scope.resolve("foo").unwrap_err();
        assert_eq!(
            err,
            Error::CycleDetected {
                name: SmolStr::from("foo")
            }
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_mutual_recursion_is_a_cycle() {
        let scope = Scope::new();
        scope.define("foo", "bar+1").unwrap();
        scope.define("bar", "foo+1").unwrap();

        assert!(matches!(
            scope.resolve("foo"),
            Err(Error::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_diamond_dependencies_are_not_a_cycle() {
        // Both operands depend on `c`; sibling branches must not poison
        // each other.
        let scope = Scope::new();
        scope.define("c", 2).unwrap();
        scope.define("a", "c+1").unwrap();
        scope.define("b", "c*2").unwrap();
        scope.define("foo", "a+b").unwrap();

        assert_eq!(value_of(&scope, "foo"), Value::Int(7));
    }
}
