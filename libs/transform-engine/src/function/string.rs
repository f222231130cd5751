use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{Nulls, opt, scalar};
use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::node::{BoxedParser, ValueParser, evaluate_all};
use crate::registry::{Arity, FunctionCategory::String as Str, FunctionDoc, FunctionRegistry};

// ═══════════════════════════════════════════════════════════════
//  Registration
// ═══════════════════════════════════════════════════════════════

pub(super) fn register(registry: &mut FunctionRegistry) {
    scalar(
        registry,
        &["upper", "ucase"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "upper(string)", "Upper-cases the string.", "upper('ab') = AB"),
        |args| text1(&args[0], |s| s.to_uppercase()),
    );
    scalar(
        registry,
        &["lower", "lcase"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "lower(string)", "Lower-cases the string.", "lower('AB') = ab"),
        |args| text1(&args[0], |s| s.to_lowercase()),
    );
    scalar(
        registry,
        &["length", "char_length"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "length(string)", "Number of characters.", "length('héllo') = 5"),
        |args| Ok(args[0].to_text().map_or(Value::Null, |s| Value::from(s.chars().count()))),
    );
    scalar(
        registry,
        &["concat"],
        Arity::AtLeast(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "concat(string1, string2, ...)", "Concatenates the arguments; null if any is null.", "concat('a', 1) = a1"),
        |args| Ok(Value::String(args.iter().map(ToString::to_string).collect())),
    );
    scalar(
        registry,
        &["concat_ws"],
        Arity::AtLeast(1),
        Nulls::PassThrough,
        FunctionDoc::new(Str, "concat_ws(separator, string1, ...)", "Joins the non-null arguments with separator.", "concat_ws('-', 'a', null, 'b') = a-b"),
        |args| {
            let Some(sep) = args[0].to_text() else {
                return Ok(Value::Null);
            };
            let parts: Vec<String> = args[1..]
                .iter()
                .filter(|v| !v.is_null())
                .map(ToString::to_string)
                .collect();
            Ok(Value::String(parts.join(&*sep)))
        },
    );
    scalar(
        registry,
        &["substring", "substr"],
        Arity::Range(2, 3),
        Nulls::Strict,
        FunctionDoc::new(Str, "substring(string, start[, length])", "Characters from 1-based start (negative counts from the end).", "substring('hello', 2, 3) = ell"),
        substring,
    );
    scalar(
        registry,
        &["trim"],
        Arity::Range(1, 2),
        Nulls::Strict,
        FunctionDoc::new(Str, "trim(string[, characters])", "Strips whitespace, or the given characters, from both ends.", "trim('  a  ') = a"),
        |args| trim(args, Side::Both),
    );
    scalar(
        registry,
        &["ltrim"],
        Arity::Range(1, 2),
        Nulls::Strict,
        FunctionDoc::new(Str, "ltrim(string[, characters])", "Strips leading whitespace or characters.", "ltrim('  a') = a"),
        |args| trim(args, Side::Leading),
    );
    scalar(
        registry,
        &["rtrim"],
        Arity::Range(1, 2),
        Nulls::Strict,
        FunctionDoc::new(Str, "rtrim(string[, characters])", "Strips trailing whitespace or characters.", "rtrim('a  ') = a"),
        |args| trim(args, Side::Trailing),
    );
    scalar(
        registry,
        &["replace"],
        Arity::Exact(3),
        Nulls::Strict,
        FunctionDoc::new(Str, "replace(string, search, replacement)", "Replaces every occurrence of search.", "replace('aXbX', 'X', '-') = a-b-"),
        |args| {
            let (Some(s), Some(from), Some(to)) = (args[0].to_text(), args[1].to_text(), args[2].to_text()) else {
                return Ok(Value::Null);
            };
            Ok(Value::String(if from.is_empty() { s.into_owned() } else { s.replace(&*from, &to) }))
        },
    );
    scalar(
        registry,
        &["reverse"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "reverse(string)", "Characters in reverse order.", "reverse('abc') = cba"),
        |args| text1(&args[0], |s| s.chars().rev().collect()),
    );
    scalar(
        registry,
        &["left"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Str, "left(string, n)", "First n characters.", "left('hello', 2) = he"),
        |args| {
            let (Some(s), Some(n)) = (args[0].to_text(), args[1].to_i64()) else {
                return Ok(Value::Null);
            };
            Ok(Value::String(s.chars().take(clamp(n)).collect()))
        },
    );
    scalar(
        registry,
        &["right"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Str, "right(string, n)", "Last n characters.", "right('hello', 2) = lo"),
        |args| {
            let (Some(s), Some(n)) = (args[0].to_text(), args[1].to_i64()) else {
                return Ok(Value::Null);
            };
            let len = s.chars().count();
            Ok(Value::String(s.chars().skip(len.saturating_sub(clamp(n))).collect()))
        },
    );
    scalar(
        registry,
        &["lpad"],
        Arity::Exact(3),
        Nulls::Strict,
        FunctionDoc::new(Str, "lpad(string, length, pad)", "Left-pads to length with pad; longer strings are cut. Null above 1 MiB.", "lpad('7', 3, '0') = 007"),
        |args| Ok(pad(args, true)),
    );
    scalar(
        registry,
        &["rpad"],
        Arity::Exact(3),
        Nulls::Strict,
        FunctionDoc::new(Str, "rpad(string, length, pad)", "Right-pads to length with pad; longer strings are cut. Null above 1 MiB.", "rpad('7', 3, '0') = 700"),
        |args| Ok(pad(args, false)),
    );
    scalar(
        registry,
        &["locate"],
        Arity::Range(2, 3),
        Nulls::Strict,
        FunctionDoc::new(Str, "locate(substring, string[, start])", "1-based position of substring at or after start, 0 when absent.", "locate('l', 'hello') = 3"),
        |args| Ok(locate(&args[0], &args[1], opt(args, 2))),
    );
    scalar(
        registry,
        &["instr"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Str, "instr(string, substring)", "1-based position of substring, 0 when absent.", "instr('hello', 'l') = 3"),
        |args| Ok(locate(&args[1], &args[0], None)),
    );
    scalar(
        registry,
        &["repeat"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Str, "repeat(string, n)", "The string repeated n times; null when the result would exceed 1 MiB.", "repeat('ab', 2) = abab"),
        |args| {
            let (Some(s), Some(n)) = (args[0].to_text(), args[1].to_i64()) else {
                return Ok(Value::Null);
            };
            let fits = s.len().checked_mul(clamp(n)).is_some_and(|len| len <= MAX_BUILT_LEN);
            Ok(if fits { Value::String(s.repeat(clamp(n))) } else { Value::Null })
        },
    );
    scalar(
        registry,
        &["split_index"],
        Arity::Exact(3),
        Nulls::Strict,
        FunctionDoc::new(Str, "split_index(string, separator, index)", "The 0-based index-th piece after splitting by separator.", "split_index('a,b,c', ',', 1) = b"),
        |args| {
            let (Some(s), Some(sep), Some(i)) = (args[0].to_text(), args[1].to_text(), args[2].to_i64()) else {
                return Ok(Value::Null);
            };
            if sep.is_empty() || i < 0 {
                return Ok(Value::Null);
            }
            Ok(s.split(&*sep)
                .nth(clamp(i))
                .map_or(Value::Null, Value::from))
        },
    );
    register_regex(registry, &["regexp_like", "regexp"], Arity::Exact(2), RegexOp::Like,
        FunctionDoc::new(Str, "regexp_like(string, pattern)", "Whether the string contains a match of pattern.", "regexp_like('abc123', '[0-9]+') = true"));
    register_regex(registry, &["regexp_replace"], Arity::Exact(3), RegexOp::Replace,
        FunctionDoc::new(Str, "regexp_replace(string, pattern, replacement)", "Replaces every match of pattern.", "regexp_replace('a1b22', '[0-9]+', '#') = a#b#"));
    register_regex(registry, &["regexp_extract"], Arity::Range(2, 3), RegexOp::Extract,
        FunctionDoc::new(Str, "regexp_extract(string, pattern[, group])", "The given capture group (default 1, or 0 without groups) of the first match.", "regexp_extract('foo123', '([a-z]+)([0-9]+)', 2) = 123"));
    scalar(
        registry,
        &["to_base64"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "to_base64(string)", "Base64 encoding of the UTF-8 bytes.", "to_base64('hi') = aGk="),
        |args| text1(&args[0], |s| STANDARD.encode(s.as_bytes())),
    );
    scalar(
        registry,
        &["from_base64"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "from_base64(string)", "Decodes base64 text; null when invalid.", "from_base64('aGk=') = hi"),
        |args| {
            Ok(args[0]
                .to_text()
                .and_then(|s| STANDARD.decode(s.trim()).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .map_or(Value::Null, Value::String))
        },
    );
    scalar(
        registry,
        &["ascii"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "ascii(string)", "Code of the first byte, 0 for an empty string.", "ascii('A') = 65"),
        |args| Ok(args[0].to_text().map_or(Value::Null, |s| Value::Int(s.bytes().next().map_or(0, i64::from)))),
    );
    scalar(
        registry,
        &["initcap"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Str, "initcap(string)", "Upper-cases the first letter of each word, lower-cases the rest.", "initcap('hELLO wORLD') = Hello World"),
        |args| text1(&args[0], initcap),
    );
}

// ═══════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════

fn text1(v: &Value, f: impl FnOnce(&str) -> String) -> EvalResult {
    Ok(v.to_text().map_or(Value::Null, |s| Value::String(f(&s))))
}

/// Negative counts read as zero.
/// Upper bound, in bytes for `repeat` and characters for `lpad`/`rpad`,
/// of a string built from a data-supplied count. Larger results are `Null`.
const MAX_BUILT_LEN: usize = 1 << 20;

fn clamp(n: i64) -> usize {
    usize::try_from(n.max(0)).unwrap_or(usize::MAX)
}

// ═══════════════════════════════════════════════════════════════
//  Substring, trim, pad
// ═══════════════════════════════════════════════════════════════

fn substring(args: &[Value]) -> EvalResult {
    let (Some(s), Some(start)) = (args[0].to_text(), args[1].to_i64()) else {
        return Ok(Value::Null);
    };
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let from = match start {
        0 => return Ok(Value::from("")),
        i if i > 0 => i - 1,
        i => (len + i).max(0),
    };
    let take = match opt(args, 2).map(Value::to_i64) {
        Some(Some(n)) => clamp(n),
        Some(None) => return Ok(Value::Null),
        None => usize::MAX,
    };
    Ok(Value::String(chars.iter().skip(clamp(from)).take(take).collect()))
}

#[derive(Clone, Copy)]
enum Side {
    Both,
    Leading,
    Trailing,
}

fn trim(args: &[Value], side: Side) -> EvalResult {
    let Some(s) = args[0].to_text() else {
        return Ok(Value::Null);
    };
    let set: Option<Vec<char>> = opt(args, 1).and_then(Value::to_text).map(|c| c.chars().collect());
    let strip = |c: char| match &set {
        Some(set) => set.contains(&c),
        None => c.is_whitespace(),
    };
    let out = match side {
        Side::Both => s.trim_matches(strip),
        Side::Leading => s.trim_start_matches(strip),
        Side::Trailing => s.trim_end_matches(strip),
    };
    Ok(Value::from(out))
}

fn pad(args: &[Value], left: bool) -> Value {
    let (Some(s), Some(len), Some(fill)) = (args[0].to_text(), args[1].to_i64(), args[2].to_text()) else {
        return Value::Null;
    };
    let target = clamp(len);
    if target > MAX_BUILT_LEN {
        return Value::Null;
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() >= target {
        return Value::String(chars[..target].iter().collect());
    }
    if fill.is_empty() {
        return Value::Null;
    }
    let filler: String = fill.chars().cycle().take(target - chars.len()).collect();
    let body: String = chars.into_iter().collect();
    Value::String(if left { filler + &body } else { body + &filler })
}

// ═══════════════════════════════════════════════════════════════
//  Search
// ═══════════════════════════════════════════════════════════════

fn locate(needle: &Value, haystack: &Value, start: Option<&Value>) -> Value {
    let (Some(needle), Some(haystack)) = (needle.to_text(), haystack.to_text()) else {
        return Value::Null;
    };
    let skip = match start.map(Value::to_i64) {
        Some(Some(p)) if p < 1 => return Value::Int(0),
        Some(Some(p)) => clamp(p - 1),
        Some(None) => return Value::Null,
        None => 0,
    };
    let Some((offset, _)) = haystack.char_indices().nth(skip).or_else(|| {
        (skip == haystack.chars().count()).then_some((haystack.len(), ' '))
    }) else {
        return Value::Int(0);
    };
    match haystack[offset..].find(&*needle) {
        Some(byte) => {
            let chars_before = haystack[..offset + byte].chars().count();
            Value::from(chars_before + 1)
        }
        None => Value::Int(0),
    }
}

fn initcap(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════
//  Regular expressions
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegexOp {
    Like,
    Replace,
    Extract,
}

fn compile_regex(pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|e| EvalError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Regex functions. A literal pattern is compiled once when the call is
/// built; a computed one on every evaluation.
struct RegexFunction {
    op: RegexOp,
    args: Vec<BoxedParser>,
    compiled: Option<Regex>,
}

impl RegexFunction {
    fn new(op: RegexOp, args: Vec<BoxedParser>) -> Self {
        let compiled = args[1]
            .constant()
            .and_then(Value::as_str)
            .and_then(|p| Regex::new(p).ok());
        Self { op, args, compiled }
    }

    fn apply(&self, re: &Regex, values: &[Value]) -> Value {
        let Some(subject) = values[0].to_text() else {
            return Value::Null;
        };
        match self.op {
            RegexOp::Like => Value::Bool(re.is_match(&subject)),
            RegexOp::Replace => match values[2].to_text() {
                Some(rep) => Value::String(re.replace_all(&subject, &*rep).into_owned()),
                None => Value::Null,
            },
            RegexOp::Extract => {
                let default_group = if re.captures_len() > 1 { 1 } else { 0 };
                let group = match opt(values, 2).map(Value::to_i64) {
                    Some(Some(g)) if g >= 0 => g as usize,
                    Some(_) => return Value::Null,
                    None => default_group,
                };
                re.captures(&subject)
                    .and_then(|caps| caps.get(group))
                    .map_or(Value::Null, |m| Value::from(m.as_str()))
            }
        }
    }
}

impl ValueParser for RegexFunction {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let values = evaluate_all(&self.args, source, row_index, context)?;
        if values.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
        match &self.compiled {
            Some(re) => Ok(self.apply(re, &values)),
            None => {
                let Some(pattern) = values[1].to_text() else {
                    return Ok(Value::Null);
                };
                let re = compile_regex(&pattern)?;
                Ok(self.apply(&re, &values))
            }
        }
    }
}

fn register_regex(registry: &mut FunctionRegistry, names: &[&str], arity: Arity, op: RegexOp, doc: FunctionDoc) {
    registry.register(names, doc, arity, move |args| Box::new(RegexFunction::new(op, args)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::testing::{call, call_ok};

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn substring_positions() {
        assert_eq!(call_ok("substring", vec![s("hello"), Value::Int(2), Value::Int(3)]), s("ell"));
        assert_eq!(call_ok("substr", vec![s("hello"), Value::Int(-3)]), s("llo"));
        assert_eq!(call_ok("substring", vec![s("hello"), Value::Int(0)]), s(""));
        assert_eq!(call_ok("substring", vec![s("hello"), Value::Int(9)]), s(""));
    }

    #[test]
    fn concat_variants() {
        assert_eq!(call_ok("concat", vec![s("a"), Value::Int(1)]), s("a1"));
        assert_eq!(call_ok("concat", vec![s("a"), Value::Null]), Value::Null);
        assert_eq!(call_ok("concat_ws", vec![s("-"), s("a"), Value::Null, s("b")]), s("a-b"));
    }

    #[test]
    fn trims_and_pads() {
        assert_eq!(call_ok("trim", vec![s("  a b  ")]), s("a b"));
        assert_eq!(call_ok("ltrim", vec![s("xxaxx"), s("x")]), s("axx"));
        assert_eq!(call_ok("lpad", vec![s("7"), Value::Int(3), s("0")]), s("007"));
        assert_eq!(call_ok("rpad", vec![s("hello"), Value::Int(2), s("0")]), s("he"));
        assert_eq!(call_ok("lpad", vec![s("7"), Value::Int(3), s("")]), Value::Null);
    }

    #[test]
    fn built_strings_are_bounded() {
        assert_eq!(call_ok("repeat", vec![s("ab"), Value::Int(i64::MAX)]), Value::Null);
        assert_eq!(call_ok("repeat", vec![s("ab"), Value::Int(-1)]), s(""));
        assert_eq!(call_ok("lpad", vec![s("7"), Value::Int(i64::MAX), s("0")]), Value::Null);
        assert_eq!(call_ok("rpad", vec![s("7"), Value::Int(1 << 21), s("0")]), Value::Null);
        let Value::String(wide) = call_ok("repeat", vec![s("a"), Value::Int(1 << 20)]) else {
            panic!("string expected");
        };
        assert_eq!(wide.len(), 1 << 20);
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(call_ok("locate", vec![s("l"), s("hello")]), Value::Int(3));
        assert_eq!(call_ok("locate", vec![s("l"), s("hello"), Value::Int(4)]), Value::Int(4));
        assert_eq!(call_ok("locate", vec![s("z"), s("hello")]), Value::Int(0));
        assert_eq!(call_ok("instr", vec![s("héllo"), s("l")]), Value::Int(3));
    }

    #[test]
    fn regex_family() {
        assert_eq!(call_ok("regexp_like", vec![s("abc123"), s("[0-9]+")]), Value::Bool(true));
        assert_eq!(call_ok("regexp_replace", vec![s("a1b22"), s("[0-9]+"), s("#")]), s("a#b#"));
        assert_eq!(
            call_ok("regexp_extract", vec![s("foo123"), s("([a-z]+)([0-9]+)"), Value::Int(2)]),
            s("123")
        );
        assert_eq!(call_ok("regexp_extract", vec![s("foo123"), s("[0-9]+")]), s("123"));
        assert!(matches!(
            call("regexp_like", vec![s("a"), s("(")]),
            Err(EvalError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn misc() {
        assert_eq!(call_ok("split_index", vec![s("a,b,c"), s(","), Value::Int(1)]), s("b"));
        assert_eq!(call_ok("split_index", vec![s("a,b,c"), s(","), Value::Int(5)]), Value::Null);
        assert_eq!(call_ok("to_base64", vec![s("hi")]), s("aGk="));
        assert_eq!(call_ok("from_base64", vec![s("aGk=")]), s("hi"));
        assert_eq!(call_ok("from_base64", vec![s("%%%")]), Value::Null);
        assert_eq!(call_ok("ascii", vec![s("A")]), Value::Int(65));
        assert_eq!(call_ok("initcap", vec![s("hELLO wORLD")]), s("Hello World"));
        assert_eq!(call_ok("length", vec![s("héllo")]), Value::Int(5));
        assert_eq!(call_ok("upper", vec![s("ab")]), s("AB"));
        assert_eq!(call_ok("right", vec![s("hello"), Value::Int(2)]), s("lo"));
        assert_eq!(call_ok("replace", vec![s("aXbX"), s("X"), s("-")]), s("a-b-"));
    }
}
