//! Avro decoder.
//!
//! Without a configured schema the input is an object container file
//! (schema embedded) and every datum in it becomes one row. With `schema`
//! (inline JSON) or `schema_path`, the input is a single bare datum.
//! Declared fields are looked up by record field name.

mod convert;

use apache_avro::Schema;
use apache_avro::types::Value as Avro;
use transform_api::config::ConfigValues;
use transform_api::error::{CodecError, Location};
use transform_api::format::{DecodedRows, SourceData, SourceDecoder};
use transform_api::schema::Field;
use transform_api::seekable::SeekableBytes;
use transform_api::value::Value;

use crate::convert::avro_to_value;

// ═══════════════════════════════════════════════════════════════
//  Decoder
// ═══════════════════════════════════════════════════════════════

pub struct AvroDecoder {
    fields: Vec<Field>,
    /// Writer schema for bare datums; `None` reads container files.
    schema: Option<Schema>,
}

impl AvroDecoder {
    pub fn container(fields: Vec<Field>) -> Self {
        Self { fields, schema: None }
    }

    pub fn datum(fields: Vec<Field>, schema: Schema) -> Self {
        Self { fields, schema: Some(schema) }
    }

    pub fn from_config(fields: Vec<Field>, config: &ConfigValues) -> Result<Self, CodecError> {
        let text = match (config.get_str("schema"), config.get_str("schema_path")) {
            (Some(inline), _) => inline.to_string(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                CodecError::config("avro", "schema_path", format!("cannot read '{path}': {e}"))
            })?,
            (None, None) => return Ok(Self::container(fields)),
        };
        let schema = Schema::parse_str(&text)
            .map_err(|e| CodecError::config("avro", "schema", e.to_string()))?;
        Ok(Self::datum(fields, schema))
    }

    fn row(&self, datum: &Avro) -> Result<Vec<Value>, CodecError> {
        let Avro::Record(entries) = datum else {
            return Err(CodecError::malformed("avro", "datum is not a record"));
        };
        Ok(self
            .fields
            .iter()
            .map(|f| {
                entries
                    .iter()
                    .find(|(name, _)| name == f.path())
                    .map_or(Value::Null, |(_, v)| avro_to_value(v))
            })
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Container and datum decoding
// ═══════════════════════════════════════════════════════════════

impl SourceDecoder<[u8]> for AvroDecoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn decode(&self, input: &[u8]) -> Result<Box<dyn SourceData>, CodecError> {
        let mut rows = DecodedRows::new(self.fields.len());
        let mut bytes = SeekableBytes::new(input);
        match &self.schema {
            Some(schema) => {
                let datum = apache_avro::from_avro_datum(schema, &mut bytes, None).map_err(|e| {
                    CodecError::malformed("avro", e.to_string()).at(Location::Byte(bytes.position()))
                })?;
                rows.push(self.row(&datum)?);
            }
            None => {
                let reader = apache_avro::Reader::new(&mut bytes)
                    .map_err(|e| CodecError::malformed("avro", format!("container header: {e}")))?;
                for datum in reader {
                    let at = Location::Row(rows.row_count());
                    let datum = datum.map_err(|e| CodecError::malformed("avro", e.to_string()).at(at))?;
                    rows.push(self.row(&datum).map_err(|e| e.at(at))?);
                }
            }
        }
        tracing::trace!(rows = rows.row_count(), length = bytes.length(), "avro decoded");
        Ok(Box::new(rows))
    }
}

#[cfg(test)]
mod tests {
    use apache_avro::Writer;
    use apache_avro::types::Record;
    use transform_api::config::ParamValue;
    use transform_api::schema::string_fields;

    use super::*;

    const SCHEMA: &str = r#"{
        "type": "record",
        "name": "quote",
        "fields": [
            {"name": "symbol", "type": "string"},
            {"name": "qty", "type": "long"}
        ]
    }"#;

    fn record<'a>(schema: &'a Schema, symbol: &str, qty: i64) -> Record<'a> {
        let mut record = Record::new(schema).unwrap();
        record.put("symbol", symbol);
        record.put("qty", qty);
        record
    }

    #[test]
    fn container_yields_one_row_per_datum() {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let mut writer = Writer::new(&schema, Vec::new());
        writer.append(record(&schema, "AAA", 1)).unwrap();
        writer.append(record(&schema, "BBB", 2)).unwrap();
        let bytes = writer.into_inner().unwrap();

        let decoder = AvroDecoder::container(string_fields(&["qty", "symbol", "missing"]));
        let rows = decoder.decode(&bytes).unwrap();
        assert_eq!(rows.row_count(), 2);
        assert_eq!(rows.get(1, 0), Some(&Value::Int(2)));
        assert_eq!(rows.get(1, 1), Some(&Value::from("BBB")));
        assert_eq!(rows.get(0, 2), Some(&Value::Null));
    }

    #[test]
    fn bare_datum_with_configured_schema() {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let bytes = apache_avro::to_avro_datum(&schema, record(&schema, "CCC", 5)).unwrap();
        let config = ConfigValues::new().with("schema", ParamValue::Str(SCHEMA.to_string()));
        let decoder = AvroDecoder::from_config(string_fields(&["symbol"]), &config).unwrap();
        let rows = decoder.decode(&bytes).unwrap();
        assert_eq!(rows.get(0, 0), Some(&Value::from("CCC")));
    }

    #[test]
    fn truncated_datum_reports_byte_offset() {
        let schema = Schema::parse_str(SCHEMA).unwrap();
        let bytes = apache_avro::to_avro_datum(&schema, record(&schema, "CCC", 5)).unwrap();
        let decoder = AvroDecoder::datum(string_fields(&["symbol"]), schema);
        let err = decoder.decode(&bytes[..2]).err().unwrap();
        assert_eq!(err.codec(), Some("avro"));
        assert!(matches!(err.location(), Location::Byte(_)));
    }

    #[test]
    fn garbage_is_a_format_error() {
        let decoder = AvroDecoder::container(string_fields(&["a"]));
        assert!(matches!(decoder.decode(b"not avro"), Err(CodecError::Malformed { codec: "avro", .. })));
        let bad = ConfigValues::new().with("schema", ParamValue::Str("{".to_string()));
        assert!(AvroDecoder::from_config(Vec::new(), &bad).is_err());
    }
}
