//! Date and time functions.
//!
//! Timestamps travel as text, `yyyy-MM-dd HH:mm:ss` for date-times and
//! `yyyy-MM-dd` for dates, interpreted in UTC. Format arguments use
//! Java-style patterns and are translated to chrono specifiers.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{Nulls, contextual, opt, scalar};
use crate::context::Context;
use crate::error::EvalResult;
use crate::node::{BoxedParser, ValueParser, required};
use crate::registry::{Arity, FunctionCategory::Temporal, FunctionDoc, FunctionRegistry};

// ═══════════════════════════════════════════════════════════════
//  Formats
// ═══════════════════════════════════════════════════════════════

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

// ═══════════════════════════════════════════════════════════════
//  Registration
// ═══════════════════════════════════════════════════════════════

pub(super) fn register(registry: &mut FunctionRegistry) {
    contextual(
        registry,
        &["now", "localtimestamp", "current_timestamp"],
        Arity::Exact(0),
        FunctionDoc::new(Temporal, "now()", "Processing time of the current pass; identical for every row of it.", "now() = 2024-03-15 10:30:45"),
        |_, ctx| Ok(Value::String(ctx.processing_time().naive_utc().format(DATETIME_FORMAT).to_string())),
    );
    contextual(
        registry,
        &["current_date"],
        Arity::Exact(0),
        FunctionDoc::new(Temporal, "current_date()", "Date of the processing time.", "current_date() = 2024-03-15"),
        |_, ctx| Ok(Value::String(ctx.processing_time().date_naive().format(DATE_FORMAT).to_string())),
    );
    contextual(
        registry,
        &["unix_timestamp"],
        Arity::Range(0, 2),
        FunctionDoc::new(Temporal, "unix_timestamp([timestamp[, format]])", "Seconds since the epoch, of the processing time or of the given timestamp.", "unix_timestamp('1970-01-01 00:01:00') = 60"),
        unix_timestamp,
    );
    scalar(
        registry,
        &["from_unixtime"],
        Arity::Range(1, 2),
        Nulls::Strict,
        FunctionDoc::new(Temporal, "from_unixtime(seconds[, format])", "Formats epoch seconds, default yyyy-MM-dd HH:mm:ss.", "from_unixtime(60) = 1970-01-01 00:01:00"),
        |args| {
            let dt = args[0].to_i64().and_then(|s| DateTime::from_timestamp(s, 0));
            Ok(dt.map_or(Value::Null, |dt| format_with(&dt.naive_utc(), opt(args, 1))))
        },
    );
    scalar(
        registry,
        &["to_date"],
        Arity::Range(1, 2),
        Nulls::Strict,
        FunctionDoc::new(Temporal, "to_date(string[, format])", "Parses a date, returned as yyyy-MM-dd.", "to_date('20240315', 'yyyyMMdd') = 2024-03-15"),
        |args| Ok(date_value(parse_arg(&args[0], opt(args, 1)).map(|dt| dt.date()))),
    );
    scalar(
        registry,
        &["date_format"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Temporal, "date_format(timestamp, format)", "Formats a timestamp with a Java-style pattern.", "date_format('2024-03-15 10:30:45', 'yyyy/MM/dd HH') = 2024/03/15 10"),
        |args| Ok(parse_arg(&args[0], None).map_or(Value::Null, |dt| format_with(&dt, Some(&args[1])))),
    );
    for (name, signature, explanation, example, field) in FIELDS {
        let field = *field;
        registry.register(
            &[*name],
            FunctionDoc::new(Temporal, signature, explanation, example),
            Arity::Exact(1),
            move |args| Box::new(FieldFunction { args, field }),
        );
    }
    scalar(
        registry,
        &["date_add"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Temporal, "date_add(date, days)", "Date shifted forward by days.", "date_add('2024-02-28', 2) = 2024-03-01"),
        |args| Ok(shift_days(&args[0], args[1].to_i64())),
    );
    scalar(
        registry,
        &["date_sub"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Temporal, "date_sub(date, days)", "Date shifted back by days.", "date_sub('2024-03-01', 1) = 2024-02-29"),
        |args| Ok(shift_days(&args[0], args[1].to_i64().and_then(i64::checked_neg))),
    );
    scalar(
        registry,
        &["datediff"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Temporal, "datediff(end, start)", "Days from start to end.", "datediff('2024-03-15', '2024-03-01') = 14"),
        |args| {
            Ok(match (parse_arg(&args[0], None), parse_arg(&args[1], None)) {
                (Some(a), Some(b)) => Value::Int((a.date() - b.date()).num_days()),
                _ => Value::Null,
            })
        },
    );
}

// ═══════════════════════════════════════════════════════════════
//  Field extraction
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
enum Field {
    Year,
    Quarter,
    Month,
    Week,
    DayOfYear,
    DayOfMonth,
    DayOfWeek,
    Hour,
    Minute,
    Second,
}

impl Field {
    fn extract(self, dt: &NaiveDateTime) -> i64 {
        let v = match self {
            Field::Year => return i64::from(dt.year()),
            Field::Quarter => (dt.month() - 1) / 3 + 1,
            Field::Month => dt.month(),
            Field::Week => dt.iso_week().week(),
            Field::DayOfYear => dt.ordinal(),
            Field::DayOfMonth => dt.day(),
            Field::DayOfWeek => dt.weekday().number_from_sunday(),
            Field::Hour => dt.hour(),
            Field::Minute => dt.minute(),
            Field::Second => dt.second(),
        };
        i64::from(v)
    }
}

const FIELDS: &[(&str, &str, &str, &str, Field)] = &[
    ("year", "year(timestamp)", "Year of the timestamp.", "year('2024-03-15') = 2024", Field::Year),
    ("quarter", "quarter(timestamp)", "Quarter of the year, 1 to 4.", "quarter('2024-03-15') = 1", Field::Quarter),
    ("month", "month(timestamp)", "Month, 1 to 12.", "month('2024-03-15') = 3", Field::Month),
    ("week", "week(timestamp)", "ISO week of the year.", "week('2024-03-15') = 11", Field::Week),
    ("dayofyear", "dayofyear(timestamp)", "Day of the year, 1 to 366.", "dayofyear('2024-03-15') = 75", Field::DayOfYear),
    ("dayofmonth", "dayofmonth(timestamp)", "Day of the month.", "dayofmonth('2024-03-15') = 15", Field::DayOfMonth),
    ("dayofweek", "dayofweek(timestamp)", "Day of the week, 1 = Sunday to 7 = Saturday.", "dayofweek('2024-03-15') = 6", Field::DayOfWeek),
    ("hour", "hour(timestamp)", "Hour, 0 to 23.", "hour('2024-03-15 10:30:45') = 10", Field::Hour),
    ("minute", "minute(timestamp)", "Minute, 0 to 59.", "minute('2024-03-15 10:30:45') = 30", Field::Minute),
    ("second", "second(timestamp)", "Second, 0 to 59.", "second('2024-03-15 10:30:45') = 45", Field::Second),
];

struct FieldFunction {
    args: Vec<BoxedParser>,
    field: Field,
}

impl ValueParser for FieldFunction {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = required!(self.args[0], source, row_index, context);
        Ok(parse_arg(&value, None).map_or(Value::Null, |dt| Value::Int(self.field.extract(&dt))))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Parsing and Java patterns
// ═══════════════════════════════════════════════════════════════

/// Lenient timestamp parse: date-times, dates (at midnight) and RFC 3339.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Translate a Java date pattern (`yyyy-MM-dd HH:mm:ss.SSS`) into chrono
/// strftime syntax. Quoted text (`'T'`) is copied literally.
pub(crate) fn java_to_chrono(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            i += 1;
            if chars.get(i) == Some(&'\'') {
                out.push('\'');
                i += 1;
                continue;
            }
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            continue;
        }
        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let spec = match (c, run) {
            ('y' | 'u', 2) => "%y",
            ('y' | 'u', _) => "%Y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('D', _) => "%j",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', 1..=3) => "%3f",
            ('S', _) => "%6f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('Z', _) => "%z",
            ('X', _) => "%:z",
            _ => "",
        };
        if spec.is_empty() {
            chars[i..i + run].iter().for_each(|&x| push_literal(&mut out, x));
        } else {
            out.push_str(spec);
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Chrono format for an optional Java pattern argument; `None` if the
/// translation contains a specifier chrono rejects.
fn chrono_format(pattern: Option<&Value>, default: &str) -> Option<String> {
    let fmt = match pattern {
        Some(p) => java_to_chrono(&p.to_text()?),
        None => default.to_string(),
    };
    let valid = !StrftimeItems::new(&fmt).any(|item| matches!(item, Item::Error));
    valid.then_some(fmt)
}

// ═══════════════════════════════════════════════════════════════
//  Formatting and day arithmetic
// ═══════════════════════════════════════════════════════════════

/// Render in UTC, so offset specifiers print `+0000`. A format chrono
/// cannot render yields `Null`.
fn format_with(dt: &NaiveDateTime, pattern: Option<&Value>) -> Value {
    let Some(fmt) = chrono_format(pattern, DATETIME_FORMAT) else {
        return Value::Null;
    };
    let mut out = String::new();
    match write!(out, "{}", dt.and_utc().format(&fmt)) {
        Ok(()) => Value::String(out),
        Err(_) => Value::Null,
    }
}

/// Timestamp argument, with an optional Java pattern to parse it by.
fn parse_arg(value: &Value, pattern: Option<&Value>) -> Option<NaiveDateTime> {
    let text = value.to_text()?;
    let Some(pattern) = pattern else {
        return parse_datetime(&text);
    };
    let fmt = chrono_format(Some(pattern), DATETIME_FORMAT)?;
    NaiveDateTime::parse_from_str(&text, &fmt).ok().or_else(|| {
        NaiveDate::parse_from_str(&text, &fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

fn date_value(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, |d| Value::String(d.format(DATE_FORMAT).to_string()))
}

fn shift_days(value: &Value, days: Option<i64>) -> Value {
    let shifted = parse_arg(value, None).zip(days).and_then(|(dt, n)| {
        dt.date().checked_add_signed(TimeDelta::try_days(n)?)
    });
    date_value(shifted)
}

fn unix_timestamp(args: &[Value], ctx: &Context) -> EvalResult {
    if args.is_empty() {
        return Ok(Value::Int(ctx.processing_time().timestamp()));
    }
    Ok(parse_arg(&args[0], opt(args, 1)).map_or(Value::Null, |dt| Value::Int(dt.and_utc().timestamp())))
}
