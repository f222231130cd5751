use std::cmp::Ordering;

use transform_api::value::Value;

use super::{Nulls, opt, scalar};
use crate::error::EvalResult;
use crate::node::compare;
use crate::registry::{Arity, FunctionCategory::Array, FunctionDoc, FunctionRegistry};

// ═══════════════════════════════════════════════════════════════
//  Registration
// ═══════════════════════════════════════════════════════════════

pub(super) fn register(registry: &mut FunctionRegistry) {
    scalar(
        registry,
        &["array"],
        Arity::AtLeast(0),
        Nulls::PassThrough,
        FunctionDoc::new(Array, "array(value1, value2, ...)", "Builds an array from the arguments, nulls included.", "array('he', 7, 'xxd') = [he, 7, xxd]"),
        |args| Ok(Value::Array(args.to_vec())),
    );
    scalar(
        registry,
        &["array_except"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_except(array1, array2)", "Elements of array1 absent from array2, without duplicates, in array1 order. Null when either array is empty or nothing is left.", "array_except(array(1, 2, 2, 3), array(3)) = [1, 2]"),
        array_except,
    );
    scalar(
        registry,
        &["array_position"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_position(array, element)", "1-based position of the first occurrence of element, 0 when absent. Null elements are skipped.", "array_position(array('he', 7, 'xxd'), 'he') = 1"),
        array_position,
    );
    scalar(
        registry,
        &["array_contains"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_contains(array, element)", "Whether the array holds element.", "array_contains(array(1, 2), 2) = true"),
        |args| Ok(with_array(&args[0], |a| Value::Bool(contains(a, &args[1])))),
    );
    scalar(
        registry,
        &["array_distinct"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_distinct(array)", "Removes duplicates, keeping first occurrences.", "array_distinct(array(1, 1, 2)) = [1, 2]"),
        |args| Ok(with_array(&args[0], |a| Value::Array(distinct(a.iter())))),
    );
    scalar(
        registry,
        &["array_intersect"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_intersect(array1, array2)", "Distinct elements of array1 also present in array2.", "array_intersect(array(1, 2, 3), array(3, 1)) = [1, 3]"),
        |args| {
            Ok(with_arrays(&args[0], &args[1], |a, b| {
                Value::Array(distinct(a.iter().filter(|v| contains(b, v))))
            }))
        },
    );
    scalar(
        registry,
        &["array_union"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_union(array1, array2)", "Distinct elements of both arrays.", "array_union(array(1, 2), array(2, 3)) = [1, 2, 3]"),
        |args| Ok(with_arrays(&args[0], &args[1], |a, b| Value::Array(distinct(a.iter().chain(b))))),
    );
    scalar(
        registry,
        &["array_concat"],
        Arity::AtLeast(1),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_concat(array1, array2, ...)", "Concatenates arrays.", "array_concat(array(1), array(2, 3)) = [1, 2, 3]"),
        |args| {
            let mut out = Vec::new();
            for arg in args {
                match arg.as_array() {
                    Some(items) => out.extend_from_slice(items),
                    None => return Ok(Value::Null),
                }
            }
            Ok(Value::Array(out))
        },
    );
    scalar(
        registry,
        &["array_append"],
        Arity::Exact(2),
        Nulls::PassThrough,
        FunctionDoc::new(Array, "array_append(array, element)", "Appends element, which may be null.", "array_append(array(1), 2) = [1, 2]"),
        |args| {
            Ok(with_array(&args[0], |a| {
                let mut out = a.to_vec();
                out.push(args[1].clone());
                Value::Array(out)
            }))
        },
    );
    scalar(
        registry,
        &["array_prepend"],
        Arity::Exact(2),
        Nulls::PassThrough,
        FunctionDoc::new(Array, "array_prepend(array, element)", "Prepends element, which may be null.", "array_prepend(array(1), 0) = [0, 1]"),
        |args| {
            Ok(with_array(&args[0], |a| {
                let mut out = Vec::with_capacity(a.len() + 1);
                out.push(args[1].clone());
                out.extend_from_slice(a);
                Value::Array(out)
            }))
        },
    );
    scalar(
        registry,
        &["array_remove"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_remove(array, element)", "Removes every occurrence of element.", "array_remove(array(1, 2, 1), 1) = [2]"),
        |args| {
            Ok(with_array(&args[0], |a| {
                Value::Array(a.iter().filter(|v| !v.sql_eq(&args[1])).cloned().collect())
            }))
        },
    );
    scalar(
        registry,
        &["array_reverse"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_reverse(array)", "Elements in reverse order.", "array_reverse(array(1, 2)) = [2, 1]"),
        |args| Ok(with_array(&args[0], |a| Value::Array(a.iter().rev().cloned().collect()))),
    );
    scalar(
        registry,
        &["array_slice"],
        Arity::Range(2, 3),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_slice(array, start[, length])", "Sub-array from 1-based start (negative counts from the end), up to length elements.", "array_slice(array(1, 2, 3, 4), 2, 2) = [2, 3]"),
        array_slice,
    );
    scalar(
        registry,
        &["array_max"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_max(array)", "Largest non-null element.", "array_max(array(1, 3, 2)) = 3"),
        |args| Ok(with_array(&args[0], |a| extreme(a, Ordering::Greater))),
    );
    scalar(
        registry,
        &["array_min"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Array, "array_min(array)", "Smallest non-null element.", "array_min(array(1, 3, 2)) = 1"),
        |args| Ok(with_array(&args[0], |a| extreme(a, Ordering::Less))),
    );
    scalar(
        registry,
        &["array_join"],
        Arity::Range(2, 3),
        Nulls::PassThrough,
        FunctionDoc::new(Array, "array_join(array, delimiter[, null_replacement])", "Joins elements as text. Null elements are skipped unless a replacement is given.", "array_join(array('a', 'b'), '-') = a-b"),
        array_join,
    );
    scalar(
        registry,
        &["cardinality", "array_length"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Array, "cardinality(array)", "Number of elements.", "cardinality(array(1, 2)) = 2"),
        |args| Ok(with_array(&args[0], |a| Value::from(a.len()))),
    );
    scalar(
        registry,
        &["element_at"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Array, "element_at(array, index)", "Element at 1-based index, negative counts from the end. Null when out of range.", "element_at(array('a', 'b'), -1) = b"),
        |args| {
            let Some(items) = args[0].as_array() else {
                return Ok(Value::Null);
            };
            Ok(args[1]
                .to_i64()
                .and_then(|i| resolve_index(i, items.len()))
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default())
        },
    );
}

// ═══════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════

fn with_array(v: &Value, f: impl FnOnce(&[Value]) -> Value) -> Value {
    v.as_array().map_or(Value::Null, f)
}

fn with_arrays(a: &Value, b: &Value, f: impl FnOnce(&[Value], &[Value]) -> Value) -> Value {
    match (a.as_array(), b.as_array()) {
        (Some(a), Some(b)) => f(a, b),
        _ => Value::Null,
    }
}

fn contains(items: &[Value], needle: &Value) -> bool {
    items.iter().any(|v| v.not_distinct(needle))
}

fn distinct<'a>(items: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !contains(&out, item) {
            out.push(item.clone());
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════
//  Set operations and lookup
// ═══════════════════════════════════════════════════════════════

fn array_except(args: &[Value]) -> EvalResult {
    let (Some(left), Some(right)) = (args[0].as_array(), args[1].as_array()) else {
        return Ok(Value::Null);
    };
    if left.is_empty() || right.is_empty() {
        return Ok(Value::Null);
    }
    let rest = distinct(left.iter().filter(|v| !contains(right, v)));
    Ok(if rest.is_empty() { Value::Null } else { Value::Array(rest) })
}

fn array_position(args: &[Value]) -> EvalResult {
    let Some(items) = args[0].as_array() else {
        return Ok(Value::Null);
    };
    if items.is_empty() {
        return Ok(Value::Null);
    }
    let position = items
        .iter()
        .position(|v| !v.is_null() && v.sql_eq(&args[1]))
        .map_or(0, |i| i + 1);
    Ok(Value::from(position))
}

// ═══════════════════════════════════════════════════════════════
//  Slicing, extremes, joining
// ═══════════════════════════════════════════════════════════════

/// 1-based (negative from the end) index to a 0-based one.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let zero_based = match index {
        0 => return None,
        i if i > 0 => i - 1,
        i => len + i,
    };
    (0..len).contains(&zero_based).then_some(zero_based as usize)
}

fn array_slice(args: &[Value]) -> EvalResult {
    let Some(items) = args[0].as_array() else {
        return Ok(Value::Null);
    };
    let Some(start) = args[1].to_i64() else {
        return Ok(Value::Null);
    };
    let Some(from) = resolve_index(start, items.len()) else {
        return Ok(Value::Array(Vec::new()));
    };
    let take = match opt(args, 2).map(Value::to_i64) {
        Some(Some(n)) if n < 0 => return Ok(Value::Null),
        Some(Some(n)) => usize::try_from(n).unwrap_or(usize::MAX),
        Some(None) => return Ok(Value::Null),
        None => usize::MAX,
    };
    Ok(Value::Array(items.iter().skip(from).take(take).cloned().collect()))
}

fn extreme(items: &[Value], want: Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for item in items.iter().filter(|v| !v.is_null()) {
        best = match best {
            None => Some(item),
            Some(current) => match compare(item, current) {
                Some(ord) if ord == want => Some(item),
                Some(_) => Some(current),
                None => return Value::Null,
            },
        };
    }
    best.cloned().unwrap_or_default()
}

fn array_join(args: &[Value]) -> EvalResult {
    let (Some(items), Some(delimiter)) = (args[0].as_array(), args[1].to_text()) else {
        return Ok(Value::Null);
    };
    let replacement = opt(args, 2).and_then(Value::to_text);
    let parts: Vec<String> = items
        .iter()
        .filter_map(|v| match v {
            Value::Null => replacement.as_ref().map(|r| r.to_string()),
            other => Some(other.to_string()),
        })
        .collect();
    Ok(Value::String(parts.join(&*delimiter)))
}
