pub mod config;
pub mod error;
pub mod format;
pub mod schema;
pub mod seekable;
pub mod value;

pub use config::{ConfigValues, ParamValue};
pub use error::{CodecError, Location};
pub use format::{DecodedRows, SinkData, SinkEncoder, SourceData, SourceDecoder};
pub use schema::{Field, FieldType};
pub use seekable::SeekableBytes;
pub use value::Value;
