use transform_api::error::CodecError;
use transform_api::value::Value;

/// Statement compilation failure. No partial tree survives one.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("function '{name}' does not accept {given} argument(s), expected {expected}")]
    ArityMismatch {
        name: String,
        given: usize,
        expected: String,
    },

    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

/// Per-record runtime fault. Malformed data never ends up here, it
/// evaluates to `Null` instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow in {0}")]
    Overflow(&'static str),

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

pub type EvalResult = Result<Value, EvalError>;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("decode error: {0}")]
    Decode(CodecError),

    #[error("encode error: {0}")]
    Encode(CodecError),

    #[error("evaluation of '{field}' failed at row {row}: {source}")]
    Eval {
        field: String,
        row: usize,
        #[source]
        source: EvalError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
