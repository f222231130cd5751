use transform_api::config::ConfigValues;
use transform_api::error::CodecError;
use transform_api::format::{SinkData, SinkEncoder};
use transform_api::schema::Field;
use transform_api::value::Value;

use crate::parser::{CsvOptions, write_field};

/// Renders a row as one delimited line in declared field order. With no
/// declared fields, the row's own order is used.
pub struct CsvEncoder {
    fields: Vec<Field>,
    options: CsvOptions,
}

impl CsvEncoder {
    pub fn new(fields: Vec<Field>, options: CsvOptions) -> Self {
        Self { fields, options }
    }

    pub fn from_config(fields: Vec<Field>, config: &ConfigValues) -> Result<Self, CodecError> {
        Ok(Self::new(fields, CsvOptions::from_config(config)?))
    }

    fn push(&self, out: &mut String, index: usize, value: &Value) {
        if index > 0 {
            out.push(self.options.delimiter);
        }
        if !value.is_null() {
            write_field(out, &value.to_string(), &self.options);
        }
    }
}

impl SinkEncoder<String> for CsvEncoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn encode(&self, data: &SinkData) -> Result<String, CodecError> {
        let mut out = String::new();
        if self.fields.is_empty() {
            data.iter().enumerate().for_each(|(i, (_, v))| self.push(&mut out, i, v));
        } else {
            data.project(&self.fields).enumerate().for_each(|(i, (_, v))| self.push(&mut out, i, v));
        }
        Ok(out)
    }
}
