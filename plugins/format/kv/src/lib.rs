//! Key-value text codec: `k1=v1&k2=v2`.
//!
//! Options: `entry_delimiter` (default `&`) and `kv_delimiter` (default `=`).
//! The decoder matches declared fields by key (the field path); the encoder
//! writes the declared fields in order.

use transform_api::config::ConfigValues;
use transform_api::error::CodecError;
use transform_api::format::{DecodedRows, SinkData, SinkEncoder, SourceData, SourceDecoder};
use transform_api::schema::Field;
use transform_api::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvOptions {
    pub entry_delimiter: String,
    pub kv_delimiter: String,
}

impl Default for KvOptions {
    fn default() -> Self {
        Self { entry_delimiter: "&".to_string(), kv_delimiter: "=".to_string() }
    }
}

impl KvOptions {
    pub fn from_config(config: &ConfigValues) -> Result<Self, CodecError> {
        let defaults = Self::default();
        let pick = |key: &str, default: String| -> Result<String, CodecError> {
            match config.get_str(key) {
                Some("") => Err(CodecError::config("kv", key, "must not be empty")),
                Some(d) => Ok(d.to_string()),
                None => Ok(default),
            }
        };
        let options = Self {
            entry_delimiter: pick("entry_delimiter", defaults.entry_delimiter)?,
            kv_delimiter: pick("kv_delimiter", defaults.kv_delimiter)?,
        };
        if options.entry_delimiter == options.kv_delimiter {
            return Err(CodecError::config("kv", "kv_delimiter", "must differ from entry_delimiter"));
        }
        Ok(options)
    }
}

pub struct KvDecoder {
    fields: Vec<Field>,
    options: KvOptions,
}

impl KvDecoder {
    pub fn new(fields: Vec<Field>, options: KvOptions) -> Self {
        Self { fields, options }
    }

    pub fn from_config(fields: Vec<Field>, config: &ConfigValues) -> Result<Self, CodecError> {
        Ok(Self::new(fields, KvOptions::from_config(config)?))
    }
}

impl SourceDecoder<str> for KvDecoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Entries without the kv delimiter are ignored; on duplicate keys the
    /// first one wins. Absent keys read as `Null`.
    fn decode(&self, input: &str) -> Result<Box<dyn SourceData>, CodecError> {
        let line = input.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(CodecError::malformed("kv", "empty record"));
        }
        let entries: Vec<(&str, &str)> = line
            .split(self.options.entry_delimiter.as_str())
            .filter_map(|entry| entry.split_once(self.options.kv_delimiter.as_str()))
            .collect();
        let row = self
            .fields
            .iter()
            .map(|f| {
                entries
                    .iter()
                    .find(|(k, _)| *k == f.path())
                    .map_or(Value::Null, |(_, v)| Value::from(*v))
            })
            .collect();
        Ok(Box::new(DecodedRows::single(row)))
    }
}

impl SourceDecoder<[u8]> for KvDecoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn decode(&self, input: &[u8]) -> Result<Box<dyn SourceData>, CodecError> {
        let text = std::str::from_utf8(input).map_err(|e| CodecError::not_utf8("kv", &e))?;
        SourceDecoder::<str>::decode(self, text)
    }
}

pub struct KvEncoder {
    fields: Vec<Field>,
    options: KvOptions,
}

impl KvEncoder {
    pub fn new(fields: Vec<Field>, options: KvOptions) -> Self {
        Self { fields, options }
    }

    pub fn from_config(fields: Vec<Field>, config: &ConfigValues) -> Result<Self, CodecError> {
        Ok(Self::new(fields, KvOptions::from_config(config)?))
    }
}

impl SinkEncoder<String> for KvEncoder {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn encode(&self, data: &SinkData) -> Result<String, CodecError> {
        let render = |(name, value): (&str, &Value)| format!("{name}{}{value}", self.options.kv_delimiter);
        let entries: Vec<String> = if self.fields.is_empty() {
            data.iter().map(render).collect()
        } else {
            data.project(&self.fields).map(render).collect()
        };
        Ok(entries.join(&self.options.entry_delimiter))
    }
}
