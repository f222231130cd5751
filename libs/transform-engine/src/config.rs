use std::collections::BTreeMap;

use serde::Deserialize;
use transform_api::config::ParamValue;

use crate::error::ConfigError;

/// What to do when a projection or predicate faults at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// The `transform` call fails.
    #[default]
    Abort,
    /// The faulting field becomes `Null`.
    NullField,
    /// The row produces no output.
    SkipRow,
}

/// Transform configuration, parsed from TOML.
///
/// ```toml
/// sql = "select atan2d(numeric1, numeric2) as result from source"
/// fault_policy = "skip_row"
///
/// [params]
/// region = "eu"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    pub sql: String,

    #[serde(default)]
    pub fault_policy: FaultPolicy,

    /// Static parameters, visible as `$name` / `"$ctx.name"` in the statement.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl TransformConfig {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            fault_policy: FaultPolicy::default(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }
}
