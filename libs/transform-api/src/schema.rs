use crate::value::{Value, parse_decimal};

/// Declared type of a source or sink field.
///
/// Text decoders hand every cell over as `String`; the column reader
/// coerces it to the declared type on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Int,
    Decimal,
    Float,
    Bool,
}

impl FieldType {
    /// Convert a raw value to this type. Empty or unparseable text becomes `Null`.
    pub fn coerce(&self, value: &Value) -> Value {
        if let Value::String(s) = value {
            if s.is_empty() && *self != FieldType::String {
                return Value::Null;
            }
        }
        match self {
            FieldType::String => match value {
                Value::Null | Value::String(_) => value.clone(),
                other => Value::String(other.to_string()),
            },
            FieldType::Int => match value {
                Value::Int(_) | Value::Null => value.clone(),
                other => other.to_i64().map_or(Value::Null, Value::Int),
            },
            FieldType::Decimal => match value {
                Value::Decimal(_) | Value::Null => value.clone(),
                Value::String(s) => parse_decimal(s).map_or(Value::Null, Value::Decimal),
                other => other.to_decimal().map_or(Value::Null, Value::Decimal),
            },
            FieldType::Float => match value {
                Value::Float(_) | Value::Null => value.clone(),
                other => other.to_f64().map_or(Value::Null, Value::Float),
            },
            FieldType::Bool => value.to_bool().map_or(Value::Null, Value::Bool),
        }
    }
}

/// A single named field of a source or sink record.
///
/// For hierarchical formats (JSON) `path` locates the value inside the
/// document; it defaults to the name.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub path: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), field_type: FieldType::String, path: None }
    }

    pub fn typed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type, path: None }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Shorthand for a list of untyped text fields.
pub fn string_fields<S: AsRef<str>>(names: &[S]) -> Vec<Field> {
    names.iter().map(|n| Field::new(n.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_becomes_null_for_typed_fields() {
        assert_eq!(FieldType::Int.coerce(&Value::from("")), Value::Null);
        assert_eq!(FieldType::String.coerce(&Value::from("")), Value::from(""));
    }

    #[test]
    fn text_is_parsed_to_declared_type() {
        assert_eq!(FieldType::Int.coerce(&Value::from(" 42 ")), Value::Int(42));
        assert_eq!(FieldType::Float.coerce(&Value::from("2.5")), Value::Float(2.5));
        assert_eq!(FieldType::Bool.coerce(&Value::from("TRUE")), Value::Bool(true));
        assert_eq!(FieldType::Int.coerce(&Value::from("x")), Value::Null);
    }

    #[test]
    fn path_defaults_to_name() {
        assert_eq!(Field::new("id").path(), "id");
        assert_eq!(Field::new("id").with_path("order.id").path(), "order.id");
    }
}
