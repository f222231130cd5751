use transform_api::format::SourceData;
use transform_api::schema::FieldType;
use transform_api::value::Value;

use super::ValueParser;
use crate::context::Context;
use crate::error::EvalResult;

/// Reads one declared source field and coerces it to the declared type.
///
/// Missing fields and empty raw text read as `Null`.
pub struct ColumnRef {
    index: usize,
    field_type: FieldType,
}

impl ColumnRef {
    pub fn new(index: usize, field_type: FieldType) -> Self {
        Self { index, field_type }
    }
}

impl ValueParser for ColumnRef {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, _context: &Context) -> EvalResult {
        Ok(match source.get(row_index, self.index) {
            None | Some(Value::Null) => Value::Null,
            Some(Value::String(s)) if s.is_empty() => Value::Null,
            Some(raw) => self.field_type.coerce(raw),
        })
    }
}

/// Looks up a run-scoped parameter; unknown names read as `Null`.
pub struct ContextParam {
    name: String,
}

impl ContextParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ValueParser for ContextParam {
    fn evaluate(&self, _source: &dyn SourceData, _row_index: usize, context: &Context) -> EvalResult {
        Ok(context.param(&self.name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use transform_api::format::DecodedRows;

    use super::*;
    use crate::node::testing::context;

    #[test]
    fn short_rows_and_empty_cells_are_null() {
        let rows = DecodedRows::single(vec![Value::from("7"), Value::from("")]);
        let ctx = context();
        let typed = ColumnRef::new(0, FieldType::Int);
        assert_eq!(typed.evaluate(&rows, 0, &ctx).unwrap(), Value::Int(7));
        assert_eq!(ColumnRef::new(1, FieldType::String).evaluate(&rows, 0, &ctx).unwrap(), Value::Null);
        assert_eq!(ColumnRef::new(5, FieldType::String).evaluate(&rows, 0, &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn context_param_lookup() {
        let rows = DecodedRows::single(Vec::new());
        let ctx = context();
        let p = ContextParam::new("processing_time");
        assert_eq!(p.evaluate(&rows, 0, &ctx).unwrap(), Value::from("2024-03-15 10:30:45"));
        assert_eq!(ContextParam::new("nope").evaluate(&rows, 0, &ctx).unwrap(), Value::Null);
    }
}
