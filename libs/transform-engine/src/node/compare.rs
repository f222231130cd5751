use std::cmp::Ordering;

use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{BoxedParser, ValueParser, required};
use crate::context::Context;
use crate::error::EvalResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CmpOp {
    fn test(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::NotEq => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::LtEq => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::GtEq => ord != Ordering::Less,
        }
    }
}

/// Ordering used by comparison operators.
///
/// Booleans compare as booleans, values that both parse as numbers compare
/// numerically, everything else compares by text. `None` when either side
/// is `Null`.
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (a, b) => a
            .numeric_cmp(b)
            .or_else(|| Some(a.to_text()?.cmp(&b.to_text()?))),
    }
}

pub struct Comparison {
    op: CmpOp,
    left: BoxedParser,
    right: BoxedParser,
}

impl Comparison {
    pub fn new(op: CmpOp, left: BoxedParser, right: BoxedParser) -> Self {
        Self { op, left, right }
    }
}

impl ValueParser for Comparison {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let left = required!(self.left, source, row_index, context);
        let right = required!(self.right, source, row_index, context);
        Ok(compare(&left, &right).map_or(Value::Null, |ord| Value::Bool(self.op.test(ord))))
    }
}

/// `expr [NOT] BETWEEN low AND high`, bounds inclusive.
pub struct Between {
    expr: BoxedParser,
    low: BoxedParser,
    high: BoxedParser,
    negated: bool,
}

impl Between {
    pub fn new(expr: BoxedParser, low: BoxedParser, high: BoxedParser, negated: bool) -> Self {
        Self { expr, low, high, negated }
    }
}

impl ValueParser for Between {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = required!(self.expr, source, row_index, context);
        let low = required!(self.low, source, row_index, context);
        let high = required!(self.high, source, row_index, context);
        let (Some(lo), Some(hi)) = (compare(&value, &low), compare(&value, &high)) else {
            return Ok(Value::Null);
        };
        let inside = lo != Ordering::Less && hi != Ordering::Greater;
        Ok(Value::Bool(inside != self.negated))
    }
}

/// `expr [NOT] IN (list)` with SQL null semantics: no match plus a `Null`
/// in the list gives `Null`.
pub struct InList {
    expr: BoxedParser,
    list: Vec<BoxedParser>,
    negated: bool,
}

impl InList {
    pub fn new(expr: BoxedParser, list: Vec<BoxedParser>, negated: bool) -> Self {
        Self { expr, list, negated }
    }
}

impl ValueParser for InList {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = required!(self.expr, source, row_index, context);
        let mut saw_null = false;
        for item in &self.list {
            let candidate = item.evaluate(source, row_index, context)?;
            match compare(&value, &candidate) {
                Some(Ordering::Equal) => return Ok(Value::Bool(!self.negated)),
                None => saw_null = true,
                Some(_) => {}
            }
        }
        Ok(if saw_null { Value::Null } else { Value::Bool(self.negated) })
    }
}

/// `IS [NOT] NULL`, never `Null` itself.
pub struct IsNull {
    inner: BoxedParser,
    negated: bool,
}

impl IsNull {
    pub fn new(inner: BoxedParser, negated: bool) -> Self {
        Self { inner, negated }
    }
}

impl ValueParser for IsNull {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = self.inner.evaluate(source, row_index, context)?;
        Ok(Value::Bool(value.is_null() != self.negated))
    }
}
