//! JSON codec.
//!
//! The decoder reads declared fields by path from one JSON document. With
//! `rows_path` set, every element of the array at that path becomes a row;
//! field paths then resolve against the element, except those prefixed
//! `$root.`, which resolve against the whole document. The encoder writes
//! one JSON object per row.

mod path;

use transform_api::config::ConfigValues;
use serde_json::error::Category;
use transform_api::error::{CodecError, Location};
use transform_api::format::{DecodedRows, SinkData, SinkEncoder, SourceData, SourceDecoder};
use transform_api::schema::Field;
use transform_api::value::Value;

use crate::path::JsonPath;

pub struct JsonDecoder {
    fields: Vec<Field>,
    paths: Vec<JsonPath>,
    rows_path: Option<JsonPath>,
}

impl JsonDecoder {
    pub fn new(fields: Vec<Field>, rows_path: Option<&str>) -> Result<Self, CodecError> {
        let paths = fields
            .iter()
            .map(|f| JsonPath::parse(f.path()))
            .collect::<Result<Vec<_>, _>>()?;
        let rows_path = rows_path.map(JsonPath::parse).transpose()?;
        Ok(Self { fields, paths, rows_path })
    }

    pub fn from_config(fields: Vec<Field>, config: &ConfigValues) -> Result<Self, CodecError> {
        Self::new(fields, config.get_str("rows_path"))
    }

    fn row(&self, root: &serde_json::Value, element: &serde_json::Value) -> Vec<Value> {
        self.paths
            .iter()
            .map(|path| {
                let base = if path.from_root() { root } else { element };
                path.resolve(base).map_or(Value::Null, Value::from_json)
            })
            .collect()
    }
}

impl SourceDecoder<str> for JsonDecoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn decode(&self, input: &str) -> Result<Box<dyn SourceData>, CodecError> {
        let doc: serde_json::Value = serde_json::from_str(input).map_err(|e| parse_error(&e))?;
        let mut rows = DecodedRows::new(self.fields.len());
        match &self.rows_path {
            None => rows.push(self.row(&doc, &doc)),
            Some(rows_path) => match rows_path.resolve(&doc) {
                Some(serde_json::Value::Array(items)) => {
                    items.iter().for_each(|item| rows.push(self.row(&doc, item)));
                }
                Some(serde_json::Value::Null) | None => {
                    tracing::debug!("JSON: rows_path absent, record yields no rows");
                }
                Some(_) => return Err(CodecError::malformed("json", "rows_path does not point to an array")),
            },
        }
        Ok(Box::new(rows))
    }
}

fn parse_error(e: &serde_json::Error) -> CodecError {
    let detail = match e.classify() {
        Category::Eof => "unexpected end of input",
        Category::Syntax => "syntax error",
        Category::Data => "unexpected value",
        Category::Io => "read failure",
    };
    CodecError::malformed("json", detail).at(Location::Line { line: e.line(), column: e.column() })
}

impl SourceDecoder<[u8]> for JsonDecoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn decode(&self, input: &[u8]) -> Result<Box<dyn SourceData>, CodecError> {
        let text = std::str::from_utf8(input).map_err(|e| CodecError::not_utf8("json", &e))?;
        SourceDecoder::<str>::decode(self, text)
    }
}

/// Writes each row as a compact JSON object, declared fields only when any
/// are declared.
pub struct JsonEncoder {
    fields: Vec<Field>,
}

impl JsonEncoder {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }
}

impl SinkEncoder<String> for JsonEncoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn encode(&self, data: &SinkData) -> Result<String, CodecError> {
        let object: serde_json::Map<String, serde_json::Value> = if self.fields.is_empty() {
            data.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect()
        } else {
            data.project(&self.fields).map(|(k, v)| (k.to_string(), v.to_json())).collect()
        };
        serde_json::to_string(&serde_json::Value::Object(object))
            .map_err(|e| CodecError::unencodable("json", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use transform_api::schema::{FieldType, string_fields};

    use super::*;

    #[test]
    fn single_document() {
        let fields = vec![Field::new("id"), Field::new("price").with_path("quote.bid")];
        let decoder = JsonDecoder::new(fields, None).unwrap();
        let rows = SourceDecoder::<str>::decode(&decoder, r#"{"id": "a1", "quote": {"bid": 1.5}}"#).unwrap();
        assert_eq!(rows.row_count(), 1);
        assert_eq!(rows.get(0, 0), Some(&Value::from("a1")));
        assert_eq!(rows.get(0, 1).map(|v| v.to_string()), Some("1.5".to_string()));
    }

    #[test]
    fn rows_path_expands_elements() {
        let fields = vec![Field::new("sku"), Field::typed("batch", FieldType::Int).with_path("$root.batch")];
        let decoder = JsonDecoder::new(fields, Some("items")).unwrap();
        let input = br#"{"batch": 9, "items": [{"sku": "x"}, {"sku": "y"}, {}]}"#;
        let rows = SourceDecoder::<[u8]>::decode(&decoder, input).unwrap();
        assert_eq!(rows.row_count(), 3);
        assert_eq!(rows.get(1, 0), Some(&Value::from("y")));
        assert_eq!(rows.get(2, 0), Some(&Value::Null));
        assert_eq!(rows.get(2, 1), Some(&Value::Int(9)));
    }

    #[test]
    fn rows_path_errors() {
        let decoder = JsonDecoder::new(string_fields(&["a"]), Some("a")).unwrap();
        assert!(SourceDecoder::<str>::decode(&decoder, r#"{"a": 1}"#).is_err());
        assert_eq!(SourceDecoder::<str>::decode(&decoder, "{}").unwrap().row_count(), 0);
        assert!(SourceDecoder::<str>::decode(&decoder, "{").is_err());
    }

    #[test]
    fn encodes_objects() {
        let mut data = SinkData::with_capacity(2);
        data.push("n", Value::Int(2));
        data.push("s", Value::Null);
        let encoder = JsonEncoder::new(string_fields(&["s", "n"]));
        let json: serde_json::Value = serde_json::from_str(&encoder.encode(&data).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"n": 2, "s": null}));
    }
}
