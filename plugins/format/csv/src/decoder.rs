use transform_api::config::ConfigValues;
use transform_api::error::CodecError;
use transform_api::format::{DecodedRows, SourceData, SourceDecoder};
use transform_api::schema::Field;
use transform_api::value::Value;

use crate::parser::{CsvOptions, parse_fields};

/// Decodes one delimited line into a single row. Cells are positional:
/// the n-th declared field reads the n-th cell, as text.
pub struct CsvDecoder {
    fields: Vec<Field>,
    options: CsvOptions,
}

impl CsvDecoder {
    pub fn new(fields: Vec<Field>, options: CsvOptions) -> Self {
        Self { fields, options }
    }

    pub fn from_config(fields: Vec<Field>, config: &ConfigValues) -> Result<Self, CodecError> {
        Ok(Self::new(fields, CsvOptions::from_config(config)?))
    }
}

impl SourceDecoder<str> for CsvDecoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn decode(&self, input: &str) -> Result<Box<dyn SourceData>, CodecError> {
        let line = input.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(CodecError::malformed("csv", "empty line"));
        }
        let cells = parse_fields(line, &self.options);
        if cells.len() != self.fields.len() {
            tracing::debug!(
                expected = self.fields.len(),
                found = cells.len(),
                "CSV: cell count differs from declared fields"
            );
        }
        let mut row: Vec<Value> = cells.into_iter().map(Value::String).collect();
        row.truncate(self.fields.len());
        Ok(Box::new(DecodedRows::single(row)))
    }
}

impl SourceDecoder<[u8]> for CsvDecoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn decode(&self, input: &[u8]) -> Result<Box<dyn SourceData>, CodecError> {
        let text = std::str::from_utf8(input).map_err(|e| CodecError::not_utf8("csv", &e))?;
        SourceDecoder::<str>::decode(self, text)
    }
}

#[cfg(test)]
mod tests {
    use transform_api::schema::string_fields;

    use super::*;

    #[test]
    fn decodes_positional_cells() {
        let decoder = CsvDecoder::new(string_fields(&["a", "b", "c"]), CsvOptions::default());
        let rows = SourceDecoder::<str>::decode(&decoder, "1|x|\n").unwrap();
        assert_eq!(rows.row_count(), 1);
        assert_eq!(rows.get(0, 0), Some(&Value::from("1")));
        assert_eq!(rows.get(0, 1), Some(&Value::from("x")));
        assert_eq!(rows.get(0, 2), Some(&Value::from("")));
    }

    #[test]
    fn short_lines_leave_fields_missing() {
        let decoder = CsvDecoder::new(string_fields(&["a", "b"]), CsvOptions::default());
        let rows = SourceDecoder::<[u8]>::decode(&decoder, b"1").unwrap();
        assert_eq!(rows.get(0, 1), None);
    }

    #[test]
    fn rejects_empty_and_invalid_input() {
        let decoder = CsvDecoder::new(string_fields(&["a"]), CsvOptions::default());
        assert!(SourceDecoder::<str>::decode(&decoder, "\r\n").is_err());
        assert!(SourceDecoder::<[u8]>::decode(&decoder, &[0xff, 0xfe]).is_err());
    }
}
