//! Built-in function library, one module per category.

mod array;
mod conditional;
mod math;
mod string;
mod temporal;

use transform_api::format::SourceData;
use transform_api::value::Value;

use crate::context::Context;
use crate::error::EvalResult;
use crate::node::{BoxedParser, ValueParser, evaluate_all};
use crate::registry::{Arity, FunctionDoc, FunctionRegistry};

pub(crate) fn register_builtins(registry: &mut FunctionRegistry) {
    array::register(registry);
    math::register(registry);
    string::register(registry);
    temporal::register(registry);
    conditional::register(registry);
}

/// How an eager function treats `Null` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Nulls {
    /// Any `Null` argument makes the result `Null` without calling the body.
    Strict,
    /// The body sees `Null` arguments and decides itself.
    PassThrough,
}

#[derive(Clone, Copy)]
pub(crate) enum Body {
    Pure(fn(&[Value]) -> EvalResult),
    WithContext(fn(&[Value], &Context) -> EvalResult),
}

/// Eager call: evaluates every argument left to right, then runs the body.
pub(crate) struct ScalarFunction {
    args: Vec<BoxedParser>,
    nulls: Nulls,
    body: Body,
}

impl ValueParser for ScalarFunction {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let values = evaluate_all(&self.args, source, row_index, context)?;
        if self.nulls == Nulls::Strict && values.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
        match self.body {
            Body::Pure(f) => f(&values),
            Body::WithContext(f) => f(&values, context),
        }
    }
}

/// Register an eager function.
pub(crate) fn scalar(
    registry: &mut FunctionRegistry,
    names: &[&str],
    arity: Arity,
    nulls: Nulls,
    doc: FunctionDoc,
    body: fn(&[Value]) -> EvalResult,
) {
    registry.register(names, doc, arity, move |args| {
        Box::new(ScalarFunction { args, nulls, body: Body::Pure(body) })
    });
}

/// Register an eager function whose body reads the evaluation context.
pub(crate) fn contextual(
    registry: &mut FunctionRegistry,
    names: &[&str],
    arity: Arity,
    doc: FunctionDoc,
    body: fn(&[Value], &Context) -> EvalResult,
) {
    registry.register(names, doc, arity, move |args| {
        Box::new(ScalarFunction { args, nulls: Nulls::Strict, body: Body::WithContext(body) })
    });
}

/// Optional trailing argument, `None` when absent.
pub(crate) fn opt(args: &[Value], i: usize) -> Option<&Value> {
    args.get(i).filter(|v| !v.is_null())
}

#[cfg(test)]
pub(crate) mod testing {
    use transform_api::format::DecodedRows;
    use transform_api::value::Value;

    use crate::error::EvalResult;
    use crate::node::testing::{context, lit};
    use crate::registry::registry;

    /// Build `name(args..)` through the global registry and evaluate it.
    pub fn call(name: &str, args: Vec<Value>) -> EvalResult {
        let factory = registry()
            .resolve(name, args.len())
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        let node = factory(args.into_iter().map(lit).collect());
        node.evaluate(&DecodedRows::single(Vec::new()), 0, &context())
    }

    pub fn call_ok(name: &str, args: Vec<Value>) -> Value {
        call(name, args).unwrap_or_else(|e| panic!("{name}: {e}"))
    }

    pub fn arr(items: Vec<Value>) -> Value {
        Value::Array(items)
    }
}
