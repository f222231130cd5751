use regex::{Regex, RegexBuilder};
use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{BoxedParser, ValueParser, required};
use crate::context::Context;
use crate::error::{EvalError, EvalResult};

/// Translate a SQL `LIKE` pattern into an anchored regex.
///
/// `%` matches any run, `_` one character, `\` escapes the next one.
pub(crate) fn like_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, EvalError> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(&escaped.to_string())),
                None => out.push_str(r"\\"),
            },
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    RegexBuilder::new(&out)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| EvalError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

enum LikePattern {
    Fixed(Regex),
    Dynamic(BoxedParser),
}

/// `expr [NOT] LIKE pattern` / `ILIKE`.
pub struct Like {
    expr: BoxedParser,
    pattern: LikePattern,
    negated: bool,
    case_insensitive: bool,
}

impl Like {
    /// Literal patterns are compiled here, once.
    pub fn new(
        expr: BoxedParser,
        pattern: BoxedParser,
        negated: bool,
        case_insensitive: bool,
    ) -> Self {
        let fixed = pattern
            .constant()
            .and_then(Value::as_str)
            .and_then(|text| like_regex(text, case_insensitive).ok());
        let pattern = match fixed {
            Some(re) => LikePattern::Fixed(re),
            None => LikePattern::Dynamic(pattern),
        };
        Self { expr, pattern, negated, case_insensitive }
    }
}

impl ValueParser for Like {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = required!(self.expr, source, row_index, context);
        let Some(text) = value.to_text() else {
            return Ok(Value::Null);
        };
        let matched = match &self.pattern {
            LikePattern::Fixed(re) => re.is_match(&text),
            LikePattern::Dynamic(parser) => {
                let pattern = required!(parser, source, row_index, context);
                let Some(p) = pattern.to_text() else {
                    return Ok(Value::Null);
                };
                like_regex(&p, self.case_insensitive)?.is_match(&text)
            }
        };
        Ok(Value::Bool(matched != self.negated))
    }
}

/// `a || b`.
pub struct Concat {
    left: BoxedParser,
    right: BoxedParser,
}

impl Concat {
    pub fn new(left: BoxedParser, right: BoxedParser) -> Self {
        Self { left, right }
    }
}

impl ValueParser for Concat {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let left = required!(self.left, source, row_index, context);
        let right = required!(self.right, source, row_index, context);
        Ok(Value::String(format!("{left}{right}")))
    }
}
