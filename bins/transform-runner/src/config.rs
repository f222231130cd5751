use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use transform_api::config::ConfigValues;
use transform_api::schema::Field;
use transform_engine::TransformConfig;

use crate::error::RunnerError;

#[derive(Parser)]
#[command(name = "transform-runner", about = "Row transforms driven by a SQL statement")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transform records from stdin or a file, writing results to stdout
    Run(RunArgs),
    /// List the built-in functions
    Functions(FunctionsArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "transform.toml", env = "TRANSFORM_CONFIG")]
    pub config: String,

    /// Read records from this file instead of stdin
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct FunctionsArgs {
    /// Only functions of this category (array, arithmetic, string, temporal, conditional)
    #[arg(long)]
    pub category: Option<String>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Page size; 0 lists everything
    #[arg(long, default_value_t = 0)]
    pub size: usize,
}

/// How the input stream is cut into records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// One record per line; blank lines are skipped.
    #[default]
    Lines,
    /// The whole input is one record (binary containers, JSON documents).
    Whole,
}

/// Fields and options shared by every codec section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodecSection {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub options: ConfigValues,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum SourceConfig {
    Csv(CodecSection),
    Kv(CodecSection),
    Json(CodecSection),
    Avro(CodecSection),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum SinkConfig {
    Csv(CodecSection),
    Kv(CodecSection),
    Json(CodecSection),
}

/// Runner configuration.
///
/// ```toml
/// framing = "lines"
///
/// [transform]
/// sql = "select atan2d(numeric1, numeric2) as result from source"
///
/// [source]
/// format = "csv"
/// fields = [{ name = "numeric1" }, { name = "numeric2" }]
/// options = { delimiter = "|" }
///
/// [sink]
/// format = "kv"
/// fields = [{ name = "result" }]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub transform: TransformConfig,
    #[serde(default)]
    pub framing: Framing,
    pub source: SourceConfig,
    pub sink: SinkConfig,
}

impl RunnerConfig {
    pub fn load(path: &str) -> Result<Self, RunnerError> {
        let content = std::fs::read_to_string(path).map_err(|e| RunnerError::Config {
            context: "read",
            detail: format!("'{path}': {e}"),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, RunnerError> {
        toml::from_str(content).map_err(|e| RunnerError::Config {
            context: "parse",
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use transform_engine::FaultPolicy;

    use super::*;

    const CONFIG: &str = r#"
        [transform]
        sql = "select upper(name) as result from source"
        fault_policy = "null_field"

        [source]
        format = "csv"
        fields = [{ name = "name" }, { name = "qty", type = "int" }]
        options = { delimiter = ",", quoting = false }

        [sink]
        format = "kv"
        fields = [{ name = "result" }]
    "#;

    #[test]
    fn parses_full_config() {
        let config = RunnerConfig::parse(CONFIG).unwrap();
        assert_eq!(config.framing, Framing::Lines);
        assert_eq!(config.transform.fault_policy, FaultPolicy::NullField);
        let SourceConfig::Csv(source) = &config.source else {
            panic!("expected csv source");
        };
        assert_eq!(source.fields.len(), 2);
        assert_eq!(source.options.get_str("delimiter"), Some(","));
        assert_eq!(source.options.get_bool("quoting"), Some(false));
        assert!(matches!(config.sink, SinkConfig::Kv(_)));
    }

    #[test]
    fn load_from_file_and_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap();
        assert!(RunnerConfig::load(path).is_ok());

        assert!(matches!(
            RunnerConfig::load("/nonexistent/transform.toml"),
            Err(RunnerError::Config { context: "read", .. })
        ));
        assert!(matches!(
            RunnerConfig::parse("[transform]\nsql = 'x'\n[source]\nformat = 'xml'"),
            Err(RunnerError::Config { context: "parse", .. })
        ));
    }
}
