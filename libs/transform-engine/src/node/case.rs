use std::cmp::Ordering;

use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{BoxedParser, ValueParser, compare};
use crate::context::Context;
use crate::error::EvalResult;

/// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`.
///
/// Only the chosen branch is evaluated. Without an operand a branch is
/// taken when its condition is `true`; with one, when the condition equals
/// the operand.
pub struct Case {
    operand: Option<BoxedParser>,
    branches: Vec<(BoxedParser, BoxedParser)>,
    otherwise: Option<BoxedParser>,
}

impl Case {
    pub fn new(
        operand: Option<BoxedParser>,
        branches: Vec<(BoxedParser, BoxedParser)>,
        otherwise: Option<BoxedParser>,
    ) -> Self {
        Self { operand, branches, otherwise }
    }
}

impl ValueParser for Case {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let operand = match &self.operand {
            Some(p) => Some(p.evaluate(source, row_index, context)?),
            None => None,
        };
        for (condition, result) in &self.branches {
            let when = condition.evaluate(source, row_index, context)?;
            let taken = match &operand {
                Some(op) => compare(op, &when) == Some(Ordering::Equal),
                None => when.to_bool() == Some(true),
            };
            if taken {
                return result.evaluate(source, row_index, context);
            }
        }
        match &self.otherwise {
            Some(p) => p.evaluate(source, row_index, context),
            None => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::testing::{eval, lit};

    #[test]
    fn searched_case_takes_first_true_branch() {
        let node = Case::new(
            None,
            vec![(lit(false), lit("a")), (lit(Value::Null), lit("b")), (lit(true), lit("c"))],
            Some(lit("d")),
        );
        assert_eq!(eval(&node), Ok(Value::from("c")));
    }

    #[test]
    fn simple_case_compares_operand() {
        let node = Case::new(Some(lit("2")), vec![(lit(1), lit("one")), (lit(2), lit("two"))], None);
        assert_eq!(eval(&node), Ok(Value::from("two")));
        let miss = Case::new(Some(lit(9)), vec![(lit(1), lit("one"))], None);
        assert_eq!(eval(&miss), Ok(Value::Null));
    }
}
