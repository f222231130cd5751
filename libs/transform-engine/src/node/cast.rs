use transform_api::format::SourceData;
use transform_api::schema::FieldType;

use super::{BoxedParser, ValueParser, required};
use crate::context::Context;
use crate::error::EvalResult;

/// `CAST(expr AS type)`; values that do not convert become `Null`.
pub struct Cast {
    inner: BoxedParser,
    target: FieldType,
}

impl Cast {
    pub fn new(inner: BoxedParser, target: FieldType) -> Self {
        Self { inner, target }
    }
}

impl ValueParser for Cast {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = required!(self.inner, source, row_index, context);
        Ok(self.target.coerce(&value))
    }
}

#[cfg(test)]
mod tests {
    use transform_api::value::Value;

    use super::*;
    use crate::node::testing::{eval, lit};

    #[test]
    fn casts_between_scalars() {
        assert_eq!(eval(&Cast::new(lit("12.7"), FieldType::Int)), Ok(Value::Int(12)));
        assert_eq!(eval(&Cast::new(lit(3), FieldType::String)), Ok(Value::from("3")));
        assert_eq!(eval(&Cast::new(lit("x"), FieldType::Float)), Ok(Value::Null));
    }
}
