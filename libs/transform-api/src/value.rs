use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_traits::{FromPrimitive, ToPrimitive};

/// Canonical runtime value.
///
/// Strategy by type:
/// - Scalars (Int, Float, Bool): kept as parsed
/// - Decimal: arbitrary precision, numeric input is normalized through it
///   before a function narrows to `i64` / `f64`
/// - String: raw field values from text decoders land here untouched
/// - Array, Row: recursive
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Decimal(BigDecimal),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Structured value, ordered `(name, value)` pairs.
    Row(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Decimal(_) | Value::Float(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Row(_) => "row",
        }
    }

    /// Parse into an arbitrary precision decimal.
    ///
    /// Text is trimmed first. Floats go through their shortest decimal
    /// rendering, so `0.1f64` becomes `0.1` and not its binary expansion.
    pub fn to_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Int(i) => Some(BigDecimal::from(*i)),
            Value::Decimal(d) => Some(d.clone()),
            Value::Float(f) if f.is_finite() => BigDecimal::from_str(&f.to_string()).ok(),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => i.to_f64(),
            other => other.to_decimal()?.to_f64(),
        }
    }

    /// Narrow to `i64`, truncating any fractional part.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() => f.trunc().to_i64(),
            other => {
                let d = other.to_decimal()?;
                // digits left of the point, decided before any rescaling
                let whole_digits = i64::try_from(d.digits()).ok()? - d.fractional_digit_count();
                match whole_digits {
                    ..=0 => Some(0),
                    1..=19 => d.with_scale(0).to_i64(),
                    _ => None,
                }
            }
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::String(s) => match s.trim() {
                t if t.eq_ignore_ascii_case("true") || t == "1" => Some(true),
                t if t.eq_ignore_ascii_case("false") || t == "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text form of a scalar; `None` for `Null`.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric ordering, available when both sides parse as numbers.
    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (a, b) => Some(a.to_decimal()?.cmp(&b.to_decimal()?)),
        }
    }

    /// SQL equality: `Null` equals nothing, numbers compare by value
    /// across `Int` / `Decimal` / `Float`.
    pub fn sql_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (a, b) if a.is_numeric() && b.is_numeric() => {
                a.numeric_cmp(b) == Some(Ordering::Equal)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.not_distinct(y))
            }
            (Value::Row(a), Value::Row(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.not_distinct(vb))
            }
            (a, b) => a == b,
        }
    }

    /// Like [`Value::sql_eq`] but two `Null`s match. Used for collection
    /// membership and de-duplication.
    pub fn not_distinct(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (a, b) => a.sql_eq(b),
        }
    }

    /// Ordering between comparable values of the same family.
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (a, b) if a.is_numeric() && b.is_numeric() => a.numeric_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(d) = parse_decimal(&n.to_string()) {
                    Value::Decimal(d)
                } else {
                    n.as_f64().map_or(Value::Null, Value::Float)
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Row(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Decimal(d) => match (d.is_integer(), d.to_i64()) {
                (true, Some(i)) => serde_json::Value::from(i),
                _ => d
                    .to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or_else(|| serde_json::Value::String(d.to_string()), serde_json::Value::Number),
            },
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Row(fields) => serde_json::Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Wrap a float, mapping NaN and infinities to `Null`.
    pub fn finite(f: f64) -> Self {
        if f.is_finite() { Value::Float(f) } else { Value::Null }
    }
}

/// Largest decimal exponent, either sign, accepted from text. `1e5000`
/// would expand to thousands of digits on the first rescale.
pub const MAX_DECIMAL_EXPONENT: i64 = 4096;

/// Trimmed decimal parse; `None` for empty or malformed text and for
/// exponents beyond [`MAX_DECIMAL_EXPONENT`].
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed)
        .ok()
        .filter(|d| d.fractional_digit_count().abs() <= MAX_DECIMAL_EXPONENT)
}

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("NaN")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "Infinity" } else { "-Infinity" })
    } else if x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Float(x) => write_float(f, *x),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Value::Null => f.write_str("null")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("]")
            }
            Value::Row(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or_else(
            |_| BigDecimal::from_usize(n).map_or(Value::Null, Value::Decimal),
            Value::Int,
        )
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
