use transform_api::error::CodecError;

/// Prefix that anchors a field path at the document root even when rows
/// are taken from a nested array.
pub(crate) const ROOT_PREFIX: &str = "$root.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
}

/// Compiled field path: `a.b.c`, with `(n)` or `[n]` indexing into arrays,
/// e.g. `items(0).price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JsonPath {
    steps: Vec<Step>,
    from_root: bool,
}

impl JsonPath {
    pub fn parse(path: &str) -> Result<Self, CodecError> {
        let (from_root, body) = match path.strip_prefix(ROOT_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, path),
        };
        let mut steps = Vec::new();
        for segment in body.split('.') {
            let key_end = segment.find(['(', '[']).unwrap_or(segment.len());
            let key = &segment[..key_end];
            if !key.is_empty() {
                steps.push(Step::Key(key.to_string()));
            }
            let mut rest = &segment[key_end..];
            while !rest.is_empty() {
                let close = match rest.as_bytes()[0] {
                    b'(' => ')',
                    b'[' => ']',
                    _ => return Err(invalid(path)),
                };
                let end = rest.find(close).ok_or_else(|| invalid(path))?;
                let index = rest[1..end].trim().parse::<usize>().map_err(|_| invalid(path))?;
                steps.push(Step::Index(index));
                rest = &rest[end + 1..];
            }
        }
        if steps.is_empty() {
            return Err(invalid(path));
        }
        Ok(Self { steps, from_root })
    }

    pub fn from_root(&self) -> bool {
        self.from_root
    }

    pub fn resolve<'a>(&self, mut node: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        for step in &self.steps {
            node = match step {
                Step::Key(key) => node.get(key.as_str())?,
                Step::Index(i) => node.get(*i)?,
            };
        }
        Some(node)
    }
}

fn invalid(path: &str) -> CodecError {
    CodecError::config("json", "path", format!("invalid field path {path:?}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_keys_and_indexes() {
        let doc = json!({"a": {"b": [10, {"c": "x"}]}});
        assert_eq!(JsonPath::parse("a.b(0)").unwrap().resolve(&doc), Some(&json!(10)));
        assert_eq!(JsonPath::parse("a.b[1].c").unwrap().resolve(&doc), Some(&json!("x")));
        assert_eq!(JsonPath::parse("a.zz").unwrap().resolve(&doc), None);
        assert_eq!(JsonPath::parse("a.b(5)").unwrap().resolve(&doc), None);
    }

    #[test]
    fn root_prefix() {
        let path = JsonPath::parse("$root.meta.id").unwrap();
        assert!(path.from_root());
        assert_eq!(path.resolve(&json!({"meta": {"id": 7}})), Some(&json!(7)));
    }

    #[test]
    fn malformed_paths() {
        assert!(JsonPath::parse("a(x)").is_err());
        assert!(JsonPath::parse("a(1").is_err());
        assert!(JsonPath::parse("").is_err());
    }
}
