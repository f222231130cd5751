//! Delimiter-separated text codec: one record per line.
//!
//! Options (all optional):
//!
//! | key         | default | meaning                                   |
//! |-------------|---------|-------------------------------------------|
//! | `delimiter` | `\|`    | single character, `\t` for tab            |
//! | `quoting`   | `true`  | RFC 4180 double-quote handling            |
//! | `escape`    | none    | character that makes the next one literal |

mod decoder;
mod encoder;
mod parser;

pub use decoder::CsvDecoder;
pub use encoder::CsvEncoder;
pub use parser::CsvOptions;
