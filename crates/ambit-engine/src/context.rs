//! Function wrappers and the invocation protocol.

use std::cell::RefCell;
use std::rc::Rc;

use ambit_expr::Value;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::chain::ResolveChain;
use crate::definition::{check_name, classify, Definition, Input, Resolved};
use crate::error::Error;
use crate::report::{Report, Signal};
use crate::scope::Scope;
use crate::sink::Sink;

/// The wrapped function's type. The frame is the explicit accessor through
/// which the body reaches its context's scope and raises signals.
pub type NativeFn = Rc<dyn Fn(&mut Frame<'_>, &[Value]) -> Result<Value, Error>>;

/// A function plus its declared parameter descriptors, ready to be bound
/// into a scope.
///
/// Parameter descriptors are supplied explicitly through this builder;
/// there is no runtime introspection of the function itself.
///
/// ```
/// use ambit_engine::{FnDef, Value};
///
/// let def = FnDef::new(|_frame, args| Ok(args[0].clone()))
///     .required("x")
///     .optional("y", "-$2");
/// ```
#[derive(Clone)]
pub struct FnDef {
    func: NativeFn,
    params: Vec<ParamSpec>,
}

#[derive(Clone)]
struct ParamSpec {
    name: SmolStr,
    optional: bool,
    default: Option<Input>,
}

impl FnDef {
    pub fn new(func: impl Fn(&mut Frame<'_>, &[Value]) -> Result<Value, Error> + 'static) -> Self {
        Self {
            func: Rc::new(func),
            params: Vec::new(),
        }
    }

    /// Declare a required parameter, filled positionally at call time.
    pub fn required(mut self, name: &str) -> Self {
        self.params.push(ParamSpec {
            name: SmolStr::from(name),
            optional: false,
            default: None,
        });
        self
    }

    /// Declare an optional parameter. A text default is tokenized into an
    /// expression when the context is built; any other default is a
    /// literal.
    pub fn optional(mut self, name: &str, default: impl Into<Input>) -> Self {
        self.params.push(ParamSpec {
            name: SmolStr::from(name),
            optional: true,
            default: Some(default.into()),
        });
        self
    }
}

impl std::fmt::Debug for FnDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        f.debug_struct("FnDef").field("params", &names).finish()
    }
}

/// A declared parameter of a context, built once at construction.
#[derive(Debug, Clone)]
pub struct ContextParam {
    name: SmolStr,
    optional: bool,
    default: Option<Definition>,
}

impl ContextParam {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default(&self) -> Option<&Definition> {
        self.default.as_ref()
    }
}

/// A function bound into a scope chain: the wrapped function, its
/// parameter descriptors, the precall/postcall chains, and an own scope
/// whose parent is the defining scope. Resolving names through a context
/// walks that chain like any scope.
///
/// Cloning a `Context` yields another handle to the same context; use
/// [`Context::overclone`] for an independent copy.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

struct ContextInner {
    func: NativeFn,
    params: Vec<ContextParam>,
    precalls: RefCell<Vec<Definition>>,
    postcalls: RefCell<Vec<Definition>>,
    scope: Scope,
}

impl Context {
    /// Build a context from a function definition, bound under `parent`.
    ///
    /// Optional parameter defaults are classified here: text defaults are
    /// tokenized immediately, so malformed ones fail at construction.
    pub fn new(def: FnDef, parent: &Scope) -> Result<Self, Error> {
        let scope = parent.new_child();

        let mut params = Vec::with_capacity(def.params.len());
        for spec in def.params {
            check_name(&spec.name)?;
            let default = match spec.default {
                Some(input) => Some(classify(input, &scope)?),
                None => None,
            };
            params.push(ContextParam {
                name: spec.name,
                optional: spec.optional,
                default,
            });
        }

        Ok(Self {
            inner: Rc::new(ContextInner {
                func: def.func,
                params,
                precalls: RefCell::new(Vec::new()),
                postcalls: RefCell::new(Vec::new()),
                scope,
            }),
        })
    }

    /// The context's own scope (own bindings, parent = defining scope).
    pub fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    /// The declared parameters, in declaration order.
    pub fn params(&self) -> &[ContextParam] {
        &self.inner.params
    }

    /// Resolve a name through this context's scope chain.
    pub fn resolve(&self, name: &str) -> Result<Resolved, Error> {
        self.inner.scope.resolve(name)
    }

    /// Define a name directly on this context's own scope, shadowing the
    /// defining scope for subsequent resolutions through the context.
    pub fn define(&self, name: &str, value: impl Into<Input>) -> Result<&Self, Error> {
        self.inner.scope.define(name, value)?;
        Ok(self)
    }

    /// Define many names at once on this context's own scope.
    pub fn define_all<I, V>(&self, pairs: I) -> Result<&Self, Error>
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Input>,
    {
        for (name, value) in pairs {
            self.inner.scope.define(name, value)?;
        }
        Ok(self)
    }

    /// Clone this context (shared function, independent scope bindings and
    /// hook chains) and define `name` on the clone, leaving the original
    /// untouched.
    pub fn overclone(&self, name: &str, value: impl Into<Input>) -> Result<Context, Error> {
        let cloned = self.fork();
        cloned.define(name, value)?;
        Ok(cloned)
    }

    /// Clone this context and define many names on the clone.
    pub fn overclone_all<I, V>(&self, pairs: I) -> Result<Context, Error>
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Input>,
    {
        let cloned = self.fork();
        cloned.define_all(pairs)?;
        Ok(cloned)
    }

    /// Register a precall: invoked before the body with the same raw
    /// arguments, able to short-circuit the whole call by raising the
    /// stop-dependency-chain signal.
    pub fn depends(&self, value: impl Into<Input>) -> Result<&Self, Error> {
        let definition = classify(value.into(), &self.inner.scope)?;
        self.inner.precalls.borrow_mut().push(definition);
        Ok(self)
    }

    /// Register a postcall: fed the previous result after the body, able
    /// to end the chain early by raising the stop-propagation-chain
    /// signal.
    pub fn propagates(&self, value: impl Into<Input>) -> Result<&Self, Error> {
        let definition = classify(value.into(), &self.inner.scope)?;
        self.inner.postcalls.borrow_mut().push(definition);
        Ok(self)
    }

    /// Invoke the context with positional arguments.
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        let mut report = Report::new();
        let sink = Sink::unbounded();
        self.invoke(args, &mut report, &sink)
    }

    /// Repeatedly invoke the context until `n` values have been collected.
    ///
    /// An invocation that appends through [`Frame::collect`] is tracked;
    /// one that never does contributes its raw return value instead.
    /// Reaching capacity cancels the in-flight invocation cooperatively;
    /// values appended before the cancellation are preserved.
    pub fn collect(&self, n: usize, args: &[Value]) -> Result<Vec<Value>, Error> {
        let sink = Sink::with_limit(n);

        while !sink.is_complete() {
            let mut report = Report::new();
            report.occurred(Signal::CollectModeOn);

            match self.invoke(args, &mut report, &sink) {
                Ok(value) => {
                    if !report.was(Signal::ResultCollected) {
                        // Untracked invocation: its raw return is the
                        // collected value. Capacity is re-checked by the
                        // loop condition.
                        let _ = sink.push(value);
                    }
                }
                // Capacity reached mid-invocation; already-appended
                // values are preserved.
                Err(Error::Interrupted) => break,
                Err(other) => return Err(other),
            }
        }

        Ok(sink.into_values())
    }

    /// The invocation protocol.
    pub(crate) fn invoke(
        &self,
        args: &[Value],
        report: &mut Report,
        sink: &Sink,
    ) -> Result<Value, Error> {
        debug!(
            params = self.inner.params.len(),
            args = args.len(),
            "invoking context"
        );

        // The report is cleared per invocation; only collect mode
        // survives, since it describes the enclosing collection run.
        let collecting = report.was(Signal::CollectModeOn);
        report.clear();
        if collecting {
            report.occurred(Signal::CollectModeOn);
        }

        // Bind parameters in declaration order.
        let mut bound = Vec::with_capacity(self.inner.params.len());
        for (index, param) in self.inner.params.iter().enumerate() {
            if !param.optional {
                // The underlying function's own arity handling applies to
                // a missing required argument.
                bound.push(args.get(index).cloned().unwrap_or(Value::Null));
                continue;
            }

            let Some(default) = &param.default else {
                bound.push(Value::Null);
                continue;
            };

            let mut nested = Report::new();
            let value = self.run_definition(default, args, &mut nested)?;
            report.merge(&nested);
            if nested.was(Signal::DependencyChainStopped) {
                trace!(param = %param.name, "dependency chain stopped in default");
                return Ok(value);
            }
            bound.push(value);
        }

        // Precalls, in registration order, with the raw arguments. The
        // borrow is released before running: a hook may touch this
        // context again.
        let precalls = self.inner.precalls.borrow().clone();
        for precall in &precalls {
            let mut nested = Report::new();
            let result = self.run_definition(precall, args, &mut nested)?;
            report.merge(&nested);
            if nested.was(Signal::DependencyChainStopped) {
                trace!("dependency chain stopped in precall");
                return Ok(result);
            }
        }

        // The body itself.
        let returned = {
            let mut frame = Frame {
                context: self,
                report: &mut *report,
                sink,
            };
            (self.inner.func)(&mut frame, &bound)?
        };

        // Explicitly collected values win over the raw return. Under
        // `collect` the sink spans many invocations and the collection
        // loop owns it, so the substitution only applies to plain calls.
        if !report.was(Signal::CollectModeOn)
            && (report.was(Signal::ResultCollected) || returned.is_null())
            && !sink.is_empty()
        {
            return Ok(Value::List(sink.values()));
        }

        // Postcalls, each fed the previous result as its argument list.
        let mut result = returned;
        let postcalls = self.inner.postcalls.borrow().clone();
        for postcall in &postcalls {
            let post_args = match result {
                Value::List(items) => items,
                other => vec![other],
            };
            let mut nested = Report::new();
            result = self.run_definition(postcall, &post_args, &mut nested)?;
            report.merge(&nested);
            if nested.was(Signal::PropagationChainStopped) {
                trace!("propagation chain stopped in postcall");
                break;
            }
        }

        Ok(result)
    }

    /// Evaluate a parameter default or a hook with this context as scope.
    /// Expressions see the raw arguments through their positional-marker
    /// bindings; nested contexts run a full invocation of their own.
    fn run_definition(
        &self,
        definition: &Definition,
        args: &[Value],
        report: &mut Report,
    ) -> Result<Value, Error> {
        match definition {
            Definition::Constant(value) => Ok(value.clone()),
            Definition::Expression(expr) => {
                let extras = expr.positional_bindings(args);
                expr.evaluate(&self.inner.scope, &ResolveChain::new(), &extras, report)
            }
            Definition::Function(context) => {
                let sink = Sink::unbounded();
                context.invoke(args, report, &sink)
            }
        }
    }

    /// Deep-enough copy: shared function, private bindings and hooks.
    fn fork(&self) -> Context {
        let scope = Scope::forked(
            self.inner.scope.parent(),
            self.inner.scope.bindings_snapshot(),
        );
        Context {
            inner: Rc::new(ContextInner {
                func: Rc::clone(&self.inner.func),
                params: self.inner.params.clone(),
                precalls: RefCell::new(self.inner.precalls.borrow().clone()),
                postcalls: RefCell::new(self.inner.postcalls.borrow().clone()),
                scope,
            }),
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.inner.params.iter().map(|p| p.name.as_str()).collect();
        f.debug_struct("Context").field("params", &names).finish()
    }
}

/// The accessor a wrapped function receives: resolution through the
/// owning context's scope chain, plus the cooperative signals.
pub struct Frame<'a> {
    context: &'a Context,
    report: &'a mut Report,
    sink: &'a Sink,
}

impl Frame<'_> {
    /// Resolve a name through the owning context's scope chain.
    pub fn resolve(&self, name: &str) -> Result<Resolved, Error> {
        self.context.resolve(name)
    }

    /// Resolve a name, falling back to `default` when resolution fails.
    pub fn placeholder(&self, name: &str, default: Value) -> Resolved {
        match self.context.resolve(name) {
            Ok(resolved) => resolved,
            Err(_) => Resolved::Value(default),
        }
    }

    /// Raise the stop-dependency-chain signal: the enclosing caller treats
    /// the current result as the whole call's result.
    pub fn stop_dependency_chain(&mut self) {
        self.report.occurred(Signal::DependencyChainStopped);
    }

    /// Raise the stop-propagation-chain signal: the postcall chain ends
    /// with the current result.
    pub fn stop_propagation_chain(&mut self) {
        self.report.occurred(Signal::PropagationChainStopped);
    }

    /// Append a value to the invocation's sink. At capacity this returns
    /// the cooperative cancellation, which the body should propagate
    /// with `?`.
    pub fn collect(&mut self, value: Value) -> Result<(), Error> {
        self.report.occurred(Signal::ResultCollected);
        self.sink.push(value)
    }

    /// Whether this invocation runs under [`Context::collect`].
    pub fn collecting(&self) -> bool {
        self.report.was(Signal::CollectModeOn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_function_invoked() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|_, args| Ok(args[0].clone())).required("arg"),
            &scope,
        )
        .unwrap();

        let result = context.call(&[Value::from("bar")]).unwrap();
        assert_eq!(result, Value::from("bar"));
    }

    #[test]
    fn test_missing_required_argument_binds_null() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|_, args| Ok(args[0].clone())).required("arg"),
            &scope,
        )
        .unwrap();

        assert_eq!(context.call(&[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_optional_literal_default() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|_, args| Ok(args[0].clone())).optional("x", Value::Int(7)),
            &scope,
        )
        .unwrap();

        assert_eq!(context.call(&[]).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_positional_parameter_defaults() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|_, args| Ok(Value::List(args.to_vec())))
                .optional("y", "-$2")
                .optional("z", "($1+$2)*$4"),
            &scope,
        )
        .unwrap();

        let result = context
            .call(&[Value::Int(3), Value::Int(4), Value::Int(5), Value::Int(12)])
            .unwrap();
        assert_eq!(
            result,
            Value::List(vec![Value::Int(-4), Value::Int((3 + 4) * 12)])
        );
    }

    #[test]
    fn test_zero_positional_default_rejected_at_construction() {
        // Positions are one-based; `$0` must fail fast instead of binding.
        let scope = Scope::new();
        let result = Context::new(
            FnDef::new(|_, args| Ok(args[0].clone())).optional("y", "$0"),
            &scope,
        );
        assert!(matches!(result, Err(Error::Expr(_))));
    }

    #[test]
    fn test_malformed_default_fails_at_construction() {
        let scope = Scope::new();
        let result = Context::new(
            FnDef::new(|_, _| Ok(Value::Null)).optional("x", "1 +"),
            &scope,
        );
        assert!(matches!(result, Err(Error::Expr(_))));
    }

    #[test]
    fn test_frame_resolves_through_defining_scope() {
        let scope = Scope::new();
        scope.define("base", 10).unwrap();

        let context = Context::new(
            FnDef::new(|frame, _| {
                let base = frame.resolve("base")?.into_value().unwrap();
                ambit_expr::Value::binary(ambit_expr::BinaryOp::Add, &base, &Value::Int(1))
                    .map_err(Into::into)
            }),
            &scope,
        )
        .unwrap();

        assert_eq!(context.call(&[]).unwrap(), Value::Int(11));
    }

    #[test]
    fn test_define_shadows_for_context_only() {
        let scope = Scope::new();
        scope.define("x", 1).unwrap();

        let context = Context::new(
            FnDef::new(|frame, _| Ok(frame.resolve("x")?.into_value().unwrap())),
            &scope,
        )
        .unwrap();
        context.define("x", 2).unwrap();

        assert_eq!(context.call(&[]).unwrap(), Value::Int(2));
        assert_eq!(
            scope.resolve("x").unwrap().into_value().unwrap(),
            Value::Int(1)
        );
    }

    #[test]
    fn test_overclone_leaves_original_untouched() {
        let scope = Scope::new();
        scope.define("bar", 1).unwrap();

        let context = Context::new(
            FnDef::new(|frame, _| Ok(frame.resolve("bar")?.into_value().unwrap())),
            &scope,
        )
        .unwrap();

        let cloned = context.overclone("bar", 567).unwrap();
        assert_eq!(cloned.call(&[]).unwrap(), Value::Int(567));
        assert_eq!(context.call(&[]).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_placeholder_falls_back_until_defined() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|frame, _| {
                Ok(frame
                    .placeholder("foo", Value::Int(124))
                    .into_value()
                    .unwrap())
            }),
            &scope,
        )
        .unwrap();

        assert_eq!(context.call(&[]).unwrap(), Value::Int(124));

        scope.define("foo", 443).unwrap();
        assert_eq!(context.call(&[]).unwrap(), Value::Int(443));
    }

    #[test]
    fn test_precall_short_circuits() {
        let scope = Scope::new();
        scope
            .define(
                "guard",
                FnDef::new(|frame, _| {
                    frame.stop_dependency_chain();
                    Ok(Value::from("guarded"))
                }),
            )
            .unwrap();

        let body_ran = Rc::new(RefCell::new(false));
        let witness = Rc::clone(&body_ran);
        let context = Context::new(
            FnDef::new(move |_, _| {
                *witness.borrow_mut() = true;
                Ok(Value::from("body"))
            }),
            &scope,
        )
        .unwrap();
        context.depends("guard()").unwrap();

        assert_eq!(context.call(&[]).unwrap(), Value::from("guarded"));
        assert!(!*body_ran.borrow());
    }

    #[test]
    fn test_guard_in_parameter_default() {
        let scope = Scope::new();
        scope
            .define(
                "foo",
                FnDef::new(|frame, _| {
                    frame.stop_dependency_chain();
                    Ok(Value::from("foo"))
                }),
            )
            .unwrap();

        let body_ran = Rc::new(RefCell::new(false));
        let witness = Rc::clone(&body_ran);
        scope
            .define(
                "bar",
                FnDef::new(move |_, _| {
                    *witness.borrow_mut() = true;
                    Ok(Value::from("bar"))
                })
                .optional("a", "foo()"),
            )
            .unwrap();

        let bar = scope.resolve("bar").unwrap().into_context().unwrap();
        assert_eq!(bar.call(&[]).unwrap(), Value::from("foo"));
        assert!(!*body_ran.borrow());
    }

    #[test]
    fn test_collected_values_through_default_expression() {
        let scope = Scope::new();
        scope
            .define(
                "gen",
                FnDef::new(|frame, _| {
                    frame.collect(Value::Int(1))?;
                    frame.collect(Value::Int(2))?;
                    Ok(Value::Null)
                }),
            )
            .unwrap();

        // `gen()` invoked from the default expression yields its collected
        // values as the bound argument.
        let context = Context::new(
            FnDef::new(|_, args| Ok(args[0].clone())).optional("vals", "gen()"),
            &scope,
        )
        .unwrap();

        assert_eq!(
            context.call(&[]).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_postcall_chain_feeds_results_forward() {
        let scope = Scope::new();
        let context = Context::new(FnDef::new(|_, _| Ok(Value::Int(3))), &scope).unwrap();
        context.propagates("$1*10").unwrap();
        context.propagates("$1+1").unwrap();

        assert_eq!(context.call(&[]).unwrap(), Value::Int(31));
    }

    #[test]
    fn test_postcall_stop_propagation() {
        let scope = Scope::new();
        scope
            .define(
                "halt",
                FnDef::new(|frame, args| {
                    frame.stop_propagation_chain();
                    Ok(args[0].clone())
                })
                .required("x"),
            )
            .unwrap();

        let context = Context::new(FnDef::new(|_, _| Ok(Value::Int(3))), &scope).unwrap();
        context.propagates("$1*10").unwrap();
        context.propagates("halt($1)").unwrap();
        context.propagates("$1+1").unwrap();

        // The third postcall never runs.
        assert_eq!(context.call(&[]).unwrap(), Value::Int(30));
    }

    #[test]
    fn test_collect_explicit() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|frame, _| {
                for i in 0..3 {
                    frame.collect(Value::Int(i))?;
                }
                Ok(Value::Null)
            }),
            &scope,
        )
        .unwrap();

        let values = context.collect(7, &[]).unwrap();
        assert_eq!(
            values,
            [0, 1, 2, 0, 1, 2, 0].map(Value::Int).to_vec()
        );
    }

    #[test]
    fn test_collect_implicit() {
        let scope = Scope::new();
        let context = Context::new(FnDef::new(|_, _| Ok(Value::Int(0))), &scope).unwrap();

        let values = context.collect(3, &[]).unwrap();
        assert_eq!(values, vec![Value::Int(0); 3]);
    }

    #[test]
    fn test_collect_caps_when_cancellation_is_swallowed() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|frame, _| {
                for i in 0..5 {
                    // Ignores the cancellation instead of propagating it.
                    let _ = frame.collect(Value::Int(i));
                }
                Ok(Value::Null)
            }),
            &scope,
        )
        .unwrap();

        assert_eq!(
            context.collect(3, &[]).unwrap(),
            vec![Value::Int(0), Value::Int(1), Value::Int(2)]
        );
    }

    #[test]
    fn test_collect_zero_is_empty() {
        let scope = Scope::new();
        let context = Context::new(FnDef::new(|_, _| Ok(Value::Int(0))), &scope).unwrap();
        assert_eq!(context.collect(0, &[]).unwrap(), vec![]);
    }

    #[test]
    fn test_plain_call_returns_collected_values() {
        let scope = Scope::new();
        let context = Context::new(
            FnDef::new(|frame, _| {
                frame.collect(Value::Int(1))?;
                frame.collect(Value::Int(2))?;
                Ok(Value::Null)
            }),
            &scope,
        )
        .unwrap();

        assert_eq!(
            context.call(&[]).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }
}
