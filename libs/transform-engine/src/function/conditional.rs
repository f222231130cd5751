//! Conditional functions. `if`, `coalesce` and `ifnull` evaluate lazily:
//! arguments that do not contribute to the result are never evaluated.

use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{Nulls, scalar};
use crate::context::Context;
use crate::error::EvalResult;
use crate::node::{BoxedParser, ValueParser};
use crate::registry::{Arity, FunctionCategory::Conditional, FunctionDoc, FunctionRegistry};

// ═══════════════════════════════════════════════════════════════
//  Registration
// ═══════════════════════════════════════════════════════════════

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(
        &["if"],
        FunctionDoc::new(Conditional, "if(condition, then, else)", "then when condition is true, else otherwise (including null).", "if(1 > 0, 'yes', 'no') = yes"),
        Arity::Exact(3),
        |args| Box::new(If { args }),
    );
    registry.register(
        &["coalesce"],
        FunctionDoc::new(Conditional, "coalesce(value, ...)", "First argument that is not null.", "coalesce(null, 2, 3) = 2"),
        Arity::AtLeast(1),
        |args| Box::new(Coalesce { args }),
    );
    registry.register(
        &["ifnull", "nvl"],
        FunctionDoc::new(Conditional, "ifnull(value, fallback)", "fallback when value is null.", "ifnull(null, 'n/a') = n/a"),
        Arity::Exact(2),
        |args| Box::new(Coalesce { args }),
    );
    scalar(
        registry,
        &["nullif"],
        Arity::Exact(2),
        Nulls::PassThrough,
        FunctionDoc::new(Conditional, "nullif(a, b)", "null when a equals b, otherwise a.", "nullif(1, 1) = null"),
        |args| Ok(if args[0].sql_eq(&args[1]) { Value::Null } else { args[0].clone() }),
    );
    scalar(
        registry,
        &["isnull"],
        Arity::Exact(1),
        Nulls::PassThrough,
        FunctionDoc::new(Conditional, "isnull(value)", "true when value is null.", "isnull(null) = true"),
        |args| Ok(Value::Bool(args[0].is_null())),
    );
    scalar(
        registry,
        &["is_numeric", "isnumeric"],
        Arity::Exact(1),
        Nulls::PassThrough,
        FunctionDoc::new(Conditional, "is_numeric(value)", "true when value is a number or text parseable as one; false for null.", "is_numeric('1.5e3') = true"),
        |args| Ok(Value::Bool(args[0].is_numeric() || (matches!(args[0], Value::String(_)) && args[0].to_decimal().is_some()))),
    );
}

// ═══════════════════════════════════════════════════════════════
//  Lazy forms
// ═══════════════════════════════════════════════════════════════

/// `args` is `[condition, then, else]`.
struct If {
    args: Vec<BoxedParser>,
}

impl ValueParser for If {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let branch = match self.args[0].evaluate(source, row_index, context)?.to_bool() {
            Some(true) => &self.args[1],
            _ => &self.args[2],
        };
        branch.evaluate(source, row_index, context)
    }
}

struct Coalesce {
    args: Vec<BoxedParser>,
}

impl ValueParser for Coalesce {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        for arg in &self.args {
            let value = arg.evaluate(source, row_index, context)?;
            if !value.is_null() {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }
}
