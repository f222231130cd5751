use transform_api::format::SourceData;
use transform_api::value::Value;

use super::ValueParser;
use crate::context::Context;
use crate::error::EvalResult;

pub struct Literal {
    value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl ValueParser for Literal {
    fn evaluate(&self, _source: &dyn SourceData, _row_index: usize, _context: &Context) -> EvalResult {
        Ok(self.value.clone())
    }

    fn constant(&self) -> Option<&Value> {
        Some(&self.value)
    }
}
