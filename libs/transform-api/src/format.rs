use crate::error::CodecError;
use crate::schema::Field;
use crate::value::Value;

/// Read-only positional access into one decoded record.
///
/// A record may expand into several rows (e.g. a JSON array), each one
/// addressed by `row_index`. Field indices follow the decoder's
/// [`SourceDecoder::fields`] order.
pub trait SourceData {
    fn row_count(&self) -> usize;
    fn field_count(&self) -> usize;
    fn get(&self, row_index: usize, field_index: usize) -> Option<&Value>;
}

/// Decoder, turns one raw input record into [`SourceData`].
pub trait SourceDecoder<I: ?Sized>: Send + Sync {
    /// Declared field layout; column names in a statement bind against it.
    fn fields(&self) -> &[Field];
    fn decode(&self, input: &I) -> Result<Box<dyn SourceData>, CodecError>;
}

/// Encoder, turns one [`SinkData`] into an output record.
pub trait SinkEncoder<O>: Send + Sync {
    fn fields(&self) -> &[Field];
    fn encode(&self, data: &SinkData) -> Result<O, CodecError>;
}

/// Row-major decoded values. Shared by all bundled decoders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRows {
    field_count: usize,
    rows: Vec<Vec<Value>>,
}

impl DecodedRows {
    pub fn new(field_count: usize) -> Self {
        Self { field_count, rows: Vec::new() }
    }

    pub fn single(row: Vec<Value>) -> Self {
        Self { field_count: row.len(), rows: vec![row] }
    }

    pub fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }
}

impl SourceData for DecodedRows {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn field_count(&self) -> usize {
        self.field_count
    }

    fn get(&self, row_index: usize, field_index: usize) -> Option<&Value> {
        self.rows.get(row_index)?.get(field_index)
    }
}

/// One output record: ordered `name -> value` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkData {
    entries: Vec<(String, Value)>,
}

impl SinkData {
    pub fn with_capacity(n: usize) -> Self {
        Self { entries: Vec::with_capacity(n) }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for each encoder field, by name. Missing names yield `Null`.
    pub fn project<'a>(&'a self, fields: &'a [Field]) -> impl Iterator<Item = (&'a str, &'a Value)> {
        static NULL: Value = Value::Null;
        fields
            .iter()
            .map(move |f| (f.name.as_str(), self.get(&f.name).unwrap_or(&NULL)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_access_is_none() {
        let rows = DecodedRows::single(vec![Value::from("a")]);
        assert_eq!(rows.get(0, 0), Some(&Value::from("a")));
        assert_eq!(rows.get(0, 1), None);
        assert_eq!(rows.get(1, 0), None);
    }

    #[test]
    fn project_follows_field_order() {
        let mut sink = SinkData::default();
        sink.push("b", Value::Int(2));
        sink.push("a", Value::Int(1));
        let fields = vec![Field::new("a"), Field::new("missing"), Field::new("b")];
        let projected: Vec<_> = sink.project(&fields).collect();
        assert_eq!(
            projected,
            vec![("a", &Value::Int(1)), ("missing", &Value::Null), ("b", &Value::Int(2))]
        );
    }
}
