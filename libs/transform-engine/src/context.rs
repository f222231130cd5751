use std::collections::HashMap;

use chrono::{DateTime, Utc};
use transform_api::value::Value;

/// Name of the intrinsic parameter holding the pass timestamp.
pub const PROCESSING_TIME: &str = "processing_time";

/// Run-scoped parameters, read-only for one evaluation pass.
///
/// Lookup order on name clash: intrinsics, then caller params, then
/// static config params.
#[derive(Debug, Clone)]
pub struct Context {
    params: HashMap<String, Value>,
    processing_time: DateTime<Utc>,
}

impl Context {
    pub fn new(processing_time: DateTime<Utc>) -> Self {
        let mut params = HashMap::new();
        params.insert(
            PROCESSING_TIME.to_string(),
            Value::String(processing_time.format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        Self { params, processing_time }
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Layer `params` under the intrinsics; later layers win over earlier ones.
    pub fn with_params<'a>(mut self, params: impl IntoIterator<Item = (&'a String, &'a Value)>) -> Self {
        for (name, value) in params {
            if name != PROCESSING_TIME {
                self.params.insert(name.clone(), value.clone());
            }
        }
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Every visible parameter, intrinsics included.
    pub fn params(&self) -> &HashMap<String, Value> {
        &self.params
    }

    pub fn processing_time(&self) -> DateTime<Utc> {
        self.processing_time
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn caller_params_override_static_but_not_intrinsics() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let statics = HashMap::from([("region".to_string(), Value::from("eu"))]);
        let extra = HashMap::from([
            ("region".to_string(), Value::from("us")),
            (PROCESSING_TIME.to_string(), Value::from("bogus")),
        ]);
        let ctx = Context::new(ts).with_params(&statics).with_params(&extra);
        assert_eq!(ctx.param("region"), Some(&Value::from("us")));
        assert_eq!(ctx.param(PROCESSING_TIME), Some(&Value::from("2024-05-01 12:00:00")));
        assert_eq!(ctx.param("missing"), None);
    }
}
