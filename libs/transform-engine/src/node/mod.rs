//! Executable expression tree.
//!
//! Every node implements [`ValueParser`]. Nodes own their children, are
//! immutable once built and hold no per-evaluation state, so one tree can
//! be evaluated from many threads at once.

mod arithmetic;
mod case;
mod cast;
mod column;
mod compare;
mod literal;
mod logic;
mod pattern;

use transform_api::format::SourceData;
use transform_api::value::Value;

use crate::context::Context;
use crate::error::{EvalError, EvalResult};

pub use arithmetic::{ArithOp, Arithmetic, Negate};
pub use case::Case;
pub use cast::Cast;
pub use column::{ColumnRef, ContextParam};
pub use compare::{Between, CmpOp, Comparison, InList, IsNull};
pub use literal::Literal;
pub use logic::{And, Not, Or};
pub use pattern::{Concat, Like};

pub(crate) use arithmetic::arith;
pub(crate) use compare::compare;

pub trait ValueParser: Send + Sync {
    /// Evaluate against one row of `source`. `Ok(Value::Null)` is a normal
    /// result; `Err` is reserved for runtime faults.
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult;

    /// Value known at build time, if this node is a literal.
    fn constant(&self) -> Option<&Value> {
        None
    }
}

pub type BoxedParser = Box<dyn ValueParser>;

/// Evaluate `$parser`, returning `Null` from the enclosing function when
/// the result is `Null`.
macro_rules! required {
    ($parser:expr, $source:expr, $row:expr, $ctx:expr) => {
        match $parser.evaluate($source, $row, $ctx)? {
            transform_api::value::Value::Null => return Ok(transform_api::value::Value::Null),
            value => value,
        }
    };
}
pub(crate) use required;

pub(crate) fn evaluate_all(
    parsers: &[BoxedParser],
    source: &dyn SourceData,
    row_index: usize,
    context: &Context,
) -> Result<Vec<Value>, EvalError> {
    parsers
        .iter()
        .map(|p| p.evaluate(source, row_index, context))
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{TimeZone, Utc};
    use transform_api::format::DecodedRows;

    use super::*;

    pub fn lit(v: impl Into<Value>) -> BoxedParser {
        Box::new(Literal::new(v.into()))
    }

    pub fn context() -> Context {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 45).unwrap();
        Context::new(ts)
    }

    /// Evaluate a node that does not read columns.
    pub fn eval(node: &dyn ValueParser) -> EvalResult {
        let empty = DecodedRows::single(Vec::new());
        node.evaluate(&empty, 0, &context())
    }
}
