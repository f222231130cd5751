use crate::value::Value;

/// Typed config value, as read from TOML tables.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
}

impl From<&ParamValue> for Value {
    fn from(p: &ParamValue) -> Self {
        match p {
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::I64(i) => Value::Int(*i),
            ParamValue::F64(f) => Value::Float(*f),
            ParamValue::Str(s) => Value::String(s.clone()),
        }
    }
}

/// Codec options handed to a decoder or encoder at creation time.
///
/// Codecs read values through typed getters; the runner fills this from
/// the `options` table of the codec section.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(from = "std::collections::BTreeMap<String, ParamValue>")]
pub struct ConfigValues {
    entries: Vec<(String, ParamValue)>,
}

impl From<std::collections::BTreeMap<String, ParamValue>> for ConfigValues {
    fn from(map: std::collections::BTreeMap<String, ParamValue>) -> Self {
        Self { entries: map.into_iter().collect() }
    }
}

impl ConfigValues {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParamValue::Str(v)) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_existing_entry() {
        let cfg = ConfigValues::new()
            .with("delimiter", ParamValue::Str(",".into()))
            .with("delimiter", ParamValue::Str("|".into()));
        assert_eq!(cfg.get_str("delimiter"), Some("|"));
        assert_eq!(cfg.get_bool("delimiter"), None);
    }

    #[test]
    fn params_convert_to_values() {
        assert_eq!(Value::from(&ParamValue::I64(3)), Value::Int(3));
        assert_eq!(Value::from(&ParamValue::Str("a".into())), Value::from("a"));
    }
}
