//! Row-transform engine: compiles one `SELECT ... FROM source [WHERE ...]`
//! statement into a tree of value nodes and evaluates it against decoded
//! records.

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
mod function;
pub mod node;
mod numeric;
pub mod processor;
pub mod registry;
pub mod statement;

pub use builder::TreeBuilder;
pub use config::{FaultPolicy, TransformConfig};
pub use context::Context;
pub use error::{CompileError, ConfigError, EvalError, TransformError};
pub use node::{BoxedParser, ValueParser};
pub use processor::TransformProcessor;
pub use registry::{FunctionCategory, FunctionDoc, FunctionRegistry, Page, paginate, registry};
pub use statement::{CompiledStatement, OutputColumn, compile};
