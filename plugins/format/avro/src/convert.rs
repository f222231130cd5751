use apache_avro::types::Value as Avro;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use transform_api::value::{Value, parse_decimal};

/// Avro datum to engine value. Binary payloads become base64 text,
/// logical date/time types their underlying integer, maps and records
/// `Row`s (map entries sorted by key).
pub(crate) fn avro_to_value(value: &Avro) -> Value {
    match value {
        Avro::Null | Avro::Duration(_) => Value::Null,
        Avro::Boolean(b) => Value::Bool(*b),
        Avro::Int(i) | Avro::Date(i) | Avro::TimeMillis(i) => Value::Int(i64::from(*i)),
        Avro::Long(l)
        | Avro::TimeMicros(l)
        | Avro::TimestampMillis(l)
        | Avro::TimestampMicros(l)
        | Avro::TimestampNanos(l)
        | Avro::LocalTimestampMillis(l)
        | Avro::LocalTimestampMicros(l)
        | Avro::LocalTimestampNanos(l) => Value::Int(*l),
        Avro::Float(f) => Value::finite(f64::from(*f)),
        Avro::Double(d) => Value::finite(*d),
        Avro::Bytes(b) | Avro::Fixed(_, b) => Value::String(STANDARD.encode(b)),
        Avro::String(s) | Avro::Enum(_, s) => Value::String(s.clone()),
        Avro::Union(_, inner) => avro_to_value(inner),
        Avro::Array(items) => Value::Array(items.iter().map(avro_to_value).collect()),
        Avro::Map(entries) => {
            let mut row: Vec<(String, Value)> =
                entries.iter().map(|(k, v)| (k.clone(), avro_to_value(v))).collect();
            row.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Row(row)
        }
        Avro::Record(fields) => {
            Value::Row(fields.iter().map(|(k, v)| (k.clone(), avro_to_value(v))).collect())
        }
        Avro::Decimal(d) => {
            let bytes: Vec<u8> = d.try_into().unwrap_or_default();
            Value::String(STANDARD.encode(bytes))
        }
        Avro::BigDecimal(d) => parse_decimal(&d.to_string()).map_or(Value::Null, Value::Decimal),
        Avro::Uuid(u) => Value::String(u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_and_containers() {
        assert_eq!(avro_to_value(&Avro::Long(7)), Value::Int(7));
        assert_eq!(avro_to_value(&Avro::Bytes(vec![1, 2, 3])), Value::from("AQID"));
        assert_eq!(avro_to_value(&Avro::Union(1, Box::new(Avro::Null))), Value::Null);
        assert_eq!(avro_to_value(&Avro::Double(f64::NAN)), Value::Null);
        let record = Avro::Record(vec![
            ("a".to_string(), Avro::Boolean(true)),
            ("b".to_string(), Avro::Array(vec![Avro::Int(1)])),
        ]);
        assert_eq!(
            avro_to_value(&record),
            Value::Row(vec![
                ("a".to_string(), Value::Bool(true)),
                ("b".to_string(), Value::Array(vec![Value::Int(1)])),
            ])
        );
    }
}
