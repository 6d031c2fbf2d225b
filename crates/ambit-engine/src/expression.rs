//! Textual definitions: parsed once, re-evaluated per resolution.

use ambit_expr::{positional, Bindings, CallTable, Expr, ExprError, Value};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::chain::ResolveChain;
use crate::context::Context;
use crate::definition::Resolved;
use crate::error::Error;
use crate::report::Report;
use crate::scope::Scope;
use crate::sink::Sink;

/// A tokenized expression plus its ordered free-variable names.
///
/// Never memoized: every resolution re-evaluates against the call-site
/// scope, so a descendant redefining a dependency changes the result
/// without redefining the expression itself.
#[derive(Debug)]
pub struct Expression {
    expr: Expr,
    dependencies: Vec<SmolStr>,
}

impl Expression {
    /// Tokenize expression text and record its dependencies.
    pub fn new(text: &str) -> Result<Self, Error> {
        let expr = ambit_expr::parse(text)?;
        let dependencies = ambit_expr::free_names(&expr);
        Ok(Self { expr, dependencies })
    }

    /// The ordered, first-occurrence list of names this expression
    /// references.
    pub fn dependencies(&self) -> &[SmolStr] {
        &self.dependencies
    }

    /// Bind each positional-marker dependency (`$N`, normalized `_N`) to
    /// the matching call argument, when present.
    pub fn positional_bindings(&self, args: &[Value]) -> Bindings {
        let mut extras = Bindings::default();
        for dependency in &self.dependencies {
            if let Some(position) = positional(dependency) {
                if let Some(value) = args.get(position - 1) {
                    extras.insert(dependency.clone(), value.clone());
                }
            }
        }
        extras
    }

    /// Evaluate against the call-site scope.
    ///
    /// Every dependency not already present in `extras` is resolved
    /// through `origin`. A dependency that resolves to a context becomes
    /// a callable usable from within the expression; invoking it there
    /// merges its report into `report`, so nested stop/collect signals
    /// stay visible to the top caller. Everything else binds as a plain
    /// variable.
    pub fn evaluate(
        &self,
        origin: &Scope,
        chain: &ResolveChain,
        extras: &Bindings,
        report: &mut Report,
    ) -> Result<Value, Error> {
        let mut vars = extras.clone();
        let mut contexts: FxHashMap<SmolStr, Context> = FxHashMap::default();

        for dependency in &self.dependencies {
            if vars.contains_key(dependency) || contexts.contains_key(dependency) {
                continue;
            }
            trace!(dependency = %dependency, "resolving expression dependency");
            match origin.forward_resolve(dependency, origin, chain)? {
                Resolved::Value(value) => {
                    vars.insert(dependency.clone(), value);
                }
                Resolved::Context(context) => {
                    contexts.insert(dependency.clone(), context);
                }
            }
        }

        let mut calls = ContextCalls { contexts, report };
        ambit_expr::evaluate(&self.expr, &vars, &mut calls)
    }
}

/// Function table backed by resolved contexts. Each call runs a full
/// context invocation and threads its report back to the caller.
struct ContextCalls<'a> {
    contexts: FxHashMap<SmolStr, Context>,
    report: &'a mut Report,
}

impl CallTable for ContextCalls<'_> {
    type Error = Error;

    fn is_callable(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, Self::Error> {
        let context = match self.contexts.get(name) {
            Some(context) => context.clone(),
            None => {
                return Err(ExprError::NotCallable {
                    name: SmolStr::from(name),
                }
                .into())
            }
        };

        let mut nested = Report::new();
        let sink = Sink::unbounded();
        let result = context.invoke(args, &mut nested, &sink);
        self.report.merge(&nested);
        result
    }
}
