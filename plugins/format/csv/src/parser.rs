use std::iter::Peekable;
use std::str::Chars;

use transform_api::config::ConfigValues;
use transform_api::error::CodecError;

// ═══════════════════════════════════════════════════════════════
//  Options
// ═══════════════════════════════════════════════════════════════

/// Line layout shared by the decoder and the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: char,
    pub quoting: bool,
    pub escape: Option<char>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: '|', quoting: true, escape: None }
    }
}

impl CsvOptions {
    pub fn from_config(config: &ConfigValues) -> Result<Self, CodecError> {
        let defaults = Self::default();
        let delimiter = match config.get_str("delimiter") {
            Some(d) => parse_char("delimiter", d)?,
            None => defaults.delimiter,
        };
        let escape = config.get_str("escape").map(|e| parse_char("escape", e)).transpose()?;
        if escape == Some(delimiter) {
            return Err(CodecError::config("csv", "escape", "must differ from the delimiter"));
        }
        Ok(Self {
            delimiter,
            quoting: config.get_bool("quoting").unwrap_or(defaults.quoting),
            escape,
        })
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
}

pub(crate) fn parse_char(key: &str, s: &str) -> Result<char, CodecError> {
    match s {
        "\\t" | "\t" => Ok('\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(CodecError::config(
                    "csv",
                    key,
                    format!("must be a single character, got {s:?}"),
                )),
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  RFC 4180 field parser
// ═══════════════════════════════════════════════════════════════

/// Split one line into fields. With quoting, RFC 4180 rules apply: a field
/// opening with `"` runs to the matching quote and `""` is a literal quote.
/// The escape character, when set, makes the following character literal.
pub(crate) fn parse_fields(line: &str, options: &CsvOptions) -> Vec<String> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        let field = if options.quoting && chars.peek() == Some(&'"') {
            chars.next();
            quoted_field(&mut chars, options)
        } else {
            plain_field(&mut chars, options)
        };
        fields.push(field);
        // the field reader consumed the delimiter, if any
        if chars.peek().is_none() {
            if ends_with_delimiter(line, options) {
                fields.push(String::new());
            }
            break;
        }
    }
    fields
}

fn plain_field(chars: &mut Peekable<Chars<'_>>, options: &CsvOptions) -> String {
    let mut field = String::new();
    while let Some(c) = chars.next() {
        if c == options.delimiter {
            break;
        }
        if Some(c) == options.escape {
            if let Some(next) = chars.next() {
                field.push(next);
            }
            continue;
        }
        field.push(c);
    }
    field
}

fn quoted_field(chars: &mut Peekable<Chars<'_>>, options: &CsvOptions) -> String {
    let mut field = String::new();
    while let Some(c) = chars.next() {
        match c {
            '"' if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => break,
            c if Some(c) == options.escape => {
                if let Some(next) = chars.next() {
                    field.push(next);
                }
            }
            c => field.push(c),
        }
    }
    // text between the closing quote and the delimiter is dropped
    for c in chars.by_ref() {
        if c == options.delimiter {
            break;
        }
    }
    field
}

/// A trailing delimiter opens one more, empty, field. An escaped trailing
/// delimiter does not.
fn ends_with_delimiter(line: &str, options: &CsvOptions) -> bool {
    if !line.ends_with(options.delimiter) {
        return false;
    }
    let Some(escape) = options.escape else {
        return true;
    };
    let body = &line[..line.len() - options.delimiter.len_utf8()];
    body.chars().rev().take_while(|&c| c == escape).count() % 2 == 0
}

// ═══════════════════════════════════════════════════════════════
//  Field writer
// ═══════════════════════════════════════════════════════════════

/// Render one field, quoting or escaping it when it contains layout
/// characters.
pub(crate) fn write_field(out: &mut String, value: &str, options: &CsvOptions) {
    let special = |c: char| c == options.delimiter || c == '"' || c == '\n' || c == '\r';
    if !value.chars().any(special) {
        out.push_str(value);
    } else if options.quoting {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else if let Some(escape) = options.escape {
        for c in value.chars() {
            if c == options.delimiter || c == escape {
                out.push(escape);
            }
            out.push(c);
        }
    } else {
        out.push_str(value);
    }
}

#[cfg(test)]
mod tests {
    use transform_api::config::ParamValue;

    use super::*;

    fn opts(delimiter: char) -> CsvOptions {
        CsvOptions::default().with_delimiter(delimiter)
    }

    #[test]
    fn plain_split_keeps_empty_fields() {
        assert_eq!(parse_fields("1|2||3", &opts('|')), vec!["1", "2", "", "3"]);
        assert_eq!(parse_fields("a,", &opts(',')), vec!["a", ""]);
        assert_eq!(parse_fields("", &opts(',')), vec![""]);
    }

    #[test]
    fn quoted_fields() {
        let fields = parse_fields(r#""a,b",c,"say ""hi""""#, &opts(','));
        assert_eq!(fields, vec!["a,b", "c", r#"say "hi""#]);
    }

    #[test]
    fn escape_character() {
        let options = CsvOptions { delimiter: '|', quoting: false, escape: Some('\\') };
        assert_eq!(parse_fields(r"a\|b|c", &options), vec!["a|b", "c"]);
        assert_eq!(parse_fields(r"a|b\|", &options), vec!["a", "b|"]);

        let mut out = String::new();
        write_field(&mut out, "a|b", &options);
        assert_eq!(out, r"a\|b");
    }

    #[test]
    fn quoting_on_write() {
        let mut out = String::new();
        write_field(&mut out, "x,\"y\"", &opts(','));
        assert_eq!(out, r#""x,""y""""#);
    }

    #[test]
    fn options_from_config() {
        let cfg = ConfigValues::new()
            .with("delimiter", ParamValue::Str("\\t".into()))
            .with("quoting", ParamValue::Bool(false));
        let options = CsvOptions::from_config(&cfg).unwrap();
        assert_eq!(options.delimiter, '\t');
        assert!(!options.quoting);

        let bad = ConfigValues::new().with("delimiter", ParamValue::Str("||".into()));
        assert!(CsvOptions::from_config(&bad).is_err());
        assert_eq!(CsvOptions::from_config(&ConfigValues::new()).unwrap(), CsvOptions::default());
    }
}
