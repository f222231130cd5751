use std::fmt;

/// Where in a record a codec gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Location {
    /// The record as a whole.
    #[default]
    Record,
    /// 0-based row of a multi-row record.
    Row(usize),
    /// Byte offset into the raw input.
    Byte(u64),
    /// 1-based position in a text document.
    Line { line: usize, column: usize },
}

/// Renders as a suffix: empty for `Record`, ` at ...` otherwise.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Record => Ok(()),
            Location::Row(row) => write!(f, " at row {row}"),
            Location::Byte(offset) => write!(f, " at byte {offset}"),
            Location::Line { line, column } => write!(f, " at line {line} column {column}"),
        }
    }
}

/// Decoder / encoder failure. `codec` names the format (`csv`, `json`, ...).
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Option rejected while building the codec.
    #[error("{codec}: option '{option}': {detail}")]
    Config {
        codec: &'static str,
        option: String,
        detail: String,
    },

    #[error("{codec}: malformed input{location}: {detail}")]
    Malformed {
        codec: &'static str,
        location: Location,
        detail: String,
    },

    #[error("{codec}: input is not UTF-8{location}")]
    NotUtf8 { codec: &'static str, location: Location },

    #[error("{codec}: cannot encode{location}: {detail}")]
    Unencodable {
        codec: &'static str,
        location: Location,
        detail: String,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub fn config(codec: &'static str, option: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Config { codec, option: option.into(), detail: detail.into() }
    }

    pub fn malformed(codec: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed { codec, location: Location::Record, detail: detail.into() }
    }

    pub fn unencodable(codec: &'static str, detail: impl Into<String>) -> Self {
        Self::Unencodable { codec, location: Location::Record, detail: detail.into() }
    }

    /// The offset is where the valid prefix ends.
    pub fn not_utf8(codec: &'static str, error: &std::str::Utf8Error) -> Self {
        Self::NotUtf8 { codec, location: Location::Byte(error.valid_up_to() as u64) }
    }

    /// Pin the error to `location`. A location the codec already set is kept.
    pub fn at(mut self, location: Location) -> Self {
        match &mut self {
            Self::Malformed { location: current, .. }
            | Self::NotUtf8 { location: current, .. }
            | Self::Unencodable { location: current, .. } => {
                if *current == Location::Record {
                    *current = location;
                }
            }
            Self::Config { .. } | Self::Io(_) => {}
        }
        self
    }

    pub fn codec(&self) -> Option<&'static str> {
        match self {
            Self::Config { codec, .. }
            | Self::Malformed { codec, .. }
            | Self::NotUtf8 { codec, .. }
            | Self::Unencodable { codec, .. } => Some(codec),
            Self::Io(_) => None,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Self::Malformed { location, .. }
            | Self::NotUtf8 { location, .. }
            | Self::Unencodable { location, .. } => *location,
            Self::Config { .. } | Self::Io(_) => Location::Record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_codec_and_location() {
        let err = CodecError::malformed("csv", "empty line");
        assert_eq!(err.to_string(), "csv: malformed input: empty line");
        let err = CodecError::unencodable("json", "bad float").at(Location::Row(3));
        assert_eq!(err.to_string(), "json: cannot encode at row 3: bad float");
        let err = CodecError::config("kv", "kv_delimiter", "must not be empty");
        assert_eq!(err.to_string(), "kv: option 'kv_delimiter': must not be empty");
    }

    #[test]
    fn codec_set_location_wins() {
        let err = CodecError::malformed("avro", "truncated")
            .at(Location::Byte(17))
            .at(Location::Row(0));
        assert_eq!(err.location(), Location::Byte(17));
        assert_eq!(err.codec(), Some("avro"));
    }

    #[test]
    fn utf8_offset_is_the_valid_prefix() {
        let bytes = [b'a', b'b', 0xff, b'c'];
        let Err(e) = std::str::from_utf8(&bytes) else {
            panic!("invalid UTF-8 expected");
        };
        let err = CodecError::not_utf8("kv", &e);
        assert_eq!(err.location(), Location::Byte(2));
        assert_eq!(err.to_string(), "kv: input is not UTF-8 at byte 2");
    }

    #[test]
    fn io_errors_have_no_codec() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err = CodecError::from(io);
        assert_eq!(err.codec(), None);
        assert!(matches!(err, CodecError::Io(_)));
    }
}
