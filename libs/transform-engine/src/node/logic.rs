use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{BoxedParser, ValueParser};
use crate::context::Context;
use crate::error::EvalResult;

/// Truth value of an operand; non-boolean values count as unknown.
fn truth(v: &Value) -> Option<bool> {
    match v {
        Value::Null => None,
        other => other.to_bool(),
    }
}

fn from_truth(t: Option<bool>) -> Value {
    t.map_or(Value::Null, Value::Bool)
}

/// Three-valued `AND`; the right side is skipped once the left is false.
pub struct And {
    left: BoxedParser,
    right: BoxedParser,
}

impl And {
    pub fn new(left: BoxedParser, right: BoxedParser) -> Self {
        Self { left, right }
    }
}

impl ValueParser for And {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let left = truth(&self.left.evaluate(source, row_index, context)?);
        if left == Some(false) {
            return Ok(Value::Bool(false));
        }
        let right = truth(&self.right.evaluate(source, row_index, context)?);
        Ok(match (left, right) {
            (_, Some(false)) => Value::Bool(false),
            (Some(true), Some(true)) => Value::Bool(true),
            _ => Value::Null,
        })
    }
}

/// Three-valued `OR`; the right side is skipped once the left is true.
pub struct Or {
    left: BoxedParser,
    right: BoxedParser,
}

impl Or {
    pub fn new(left: BoxedParser, right: BoxedParser) -> Self {
        Self { left, right }
    }
}

impl ValueParser for Or {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let left = truth(&self.left.evaluate(source, row_index, context)?);
        if left == Some(true) {
            return Ok(Value::Bool(true));
        }
        let right = truth(&self.right.evaluate(source, row_index, context)?);
        Ok(match (left, right) {
            (_, Some(true)) => Value::Bool(true),
            (Some(false), Some(false)) => Value::Bool(false),
            _ => Value::Null,
        })
    }
}

pub struct Not {
    inner: BoxedParser,
}

impl Not {
    pub fn new(inner: BoxedParser) -> Self {
        Self { inner }
    }
}

impl ValueParser for Not {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = self.inner.evaluate(source, row_index, context)?;
        Ok(from_truth(truth(&value).map(|b| !b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::node::testing::{eval, lit};
    use crate::node::{ArithOp, Arithmetic};

    const T: Value = Value::Bool(true);
    const F: Value = Value::Bool(false);

    #[test]
    fn and_truth_table() {
        assert_eq!(eval(&And::new(lit(T), lit(T))), Ok(T));
        assert_eq!(eval(&And::new(lit(T), lit(Value::Null))), Ok(Value::Null));
        assert_eq!(eval(&And::new(lit(Value::Null), lit(F))), Ok(F));
    }

    #[test]
    fn or_truth_table() {
        assert_eq!(eval(&Or::new(lit(F), lit(F))), Ok(F));
        assert_eq!(eval(&Or::new(lit(Value::Null), lit(T))), Ok(T));
        assert_eq!(eval(&Or::new(lit(F), lit(Value::Null))), Ok(Value::Null));
    }

    #[test]
    fn short_circuit_skips_faulting_side() {
        let boom = || -> BoxedParser { Box::new(Arithmetic::new(ArithOp::Div, lit(1), lit(0))) };
        assert_eq!(eval(&And::new(lit(F), boom())), Ok(F));
        assert_eq!(eval(&Or::new(lit(T), boom())), Ok(T));
        assert_eq!(eval(&And::new(lit(T), boom())), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn not_of_null_is_null() {
        assert_eq!(eval(&Not::new(lit(Value::Null))), Ok(Value::Null));
        assert_eq!(eval(&Not::new(lit("false"))), Ok(T));
    }
}
