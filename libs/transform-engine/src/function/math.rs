use std::cmp::Ordering;

use bigdecimal::{BigDecimal, RoundingMode};
use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{Nulls, opt, scalar};
use crate::context::Context;
use crate::error::EvalResult;
use crate::node::{ArithOp, BoxedParser, ValueParser, arith, compare, required};
use crate::numeric::narrow;
use crate::registry::{Arity, FunctionCategory::Arithmetic, FunctionDoc, FunctionRegistry};

// ═══════════════════════════════════════════════════════════════
//  Float functions
// ═══════════════════════════════════════════════════════════════

/// `f(x)` over one float argument. NaN and infinities (domain errors) read as `Null`.
struct FloatFunction {
    arg: BoxedParser,
    f: fn(f64) -> f64,
}

impl ValueParser for FloatFunction {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let value = required!(self.arg, source, row_index, context);
        Ok(value.to_f64().map_or(Value::Null, |x| Value::finite((self.f)(x))))
    }
}

const FLOAT_FUNCTIONS: &[(&[&str], FunctionDoc, fn(f64) -> f64)] = &[
    (&["sqrt"], FunctionDoc::new(Arithmetic, "sqrt(numeric)", "Square root; null for negative input.", "sqrt(16) = 4.0"), f64::sqrt),
    (&["cbrt"], FunctionDoc::new(Arithmetic, "cbrt(numeric)", "Real cube root, sign preserving.", "cbrt(-27) = -3.0"), f64::cbrt),
    (&["exp"], FunctionDoc::new(Arithmetic, "exp(numeric)", "e raised to the power of numeric.", "exp(0) = 1.0"), f64::exp),
    (&["ln"], FunctionDoc::new(Arithmetic, "ln(numeric)", "Natural logarithm; null for non-positive input.", "ln(1) = 0.0"), f64::ln),
    (&["log"], FunctionDoc::new(Arithmetic, "log(numeric)", "Natural logarithm; null for non-positive input.", "log(1) = 0.0"), f64::ln),
    (&["log10"], FunctionDoc::new(Arithmetic, "log10(numeric)", "Base 10 logarithm.", "log10(100) = 2.0"), f64::log10),
    (&["log2"], FunctionDoc::new(Arithmetic, "log2(numeric)", "Base 2 logarithm.", "log2(8) = 3.0"), f64::log2),
    (&["sin"], FunctionDoc::new(Arithmetic, "sin(numeric)", "Sine of an angle in radians.", "sin(0) = 0.0"), f64::sin),
    (&["cos"], FunctionDoc::new(Arithmetic, "cos(numeric)", "Cosine of an angle in radians.", "cos(0) = 1.0"), f64::cos),
    (&["tan"], FunctionDoc::new(Arithmetic, "tan(numeric)", "Tangent of an angle in radians.", "tan(0) = 0.0"), f64::tan),
    (&["cot"], FunctionDoc::new(Arithmetic, "cot(numeric)", "Cotangent of an angle in radians.", "cot(1) = 0.6420926159343306"), |x| 1.0 / x.tan()),
    (&["asin"], FunctionDoc::new(Arithmetic, "asin(numeric)", "Arc sine in radians.", "asin(1) = 1.5707963267948966"), f64::asin),
    (&["acos"], FunctionDoc::new(Arithmetic, "acos(numeric)", "Arc cosine in radians.", "acos(1) = 0.0"), f64::acos),
    (&["atan"], FunctionDoc::new(Arithmetic, "atan(numeric)", "Arc tangent in radians.", "atan(0) = 0.0"), f64::atan),
    (&["sind"], FunctionDoc::new(Arithmetic, "sind(numeric)", "Sine of an angle in degrees.", "sind(30) = 0.49999999999999994"), |x| x.to_radians().sin()),
    (&["cosd"], FunctionDoc::new(Arithmetic, "cosd(numeric)", "Cosine of an angle in degrees.", "cosd(0) = 1.0"), |x| x.to_radians().cos()),
    (&["tand"], FunctionDoc::new(Arithmetic, "tand(numeric)", "Tangent of an angle in degrees.", "tand(0) = 0.0"), |x| x.to_radians().tan()),
    (&["asind"], FunctionDoc::new(Arithmetic, "asind(numeric)", "Arc sine in degrees.", "asind(1) = 90.0"), |x| x.asin().to_degrees()),
    (&["acosd"], FunctionDoc::new(Arithmetic, "acosd(numeric)", "Arc cosine in degrees.", "acosd(1) = 0.0"), |x| x.acos().to_degrees()),
    (&["atand"], FunctionDoc::new(Arithmetic, "atand(numeric)", "Arc tangent in degrees.", "atand(1) = 45.0"), |x| x.atan().to_degrees()),
    (&["sinh"], FunctionDoc::new(Arithmetic, "sinh(numeric)", "Hyperbolic sine.", "sinh(0) = 0.0"), f64::sinh),
    (&["cosh"], FunctionDoc::new(Arithmetic, "cosh(numeric)", "Hyperbolic cosine.", "cosh(0) = 1.0"), f64::cosh),
    (&["tanh"], FunctionDoc::new(Arithmetic, "tanh(numeric)", "Hyperbolic tangent.", "tanh(0) = 0.0"), f64::tanh),
    (&["degrees"], FunctionDoc::new(Arithmetic, "degrees(numeric)", "Radians to degrees.", "degrees(pi()) = 180.0"), f64::to_degrees),
    (&["radians"], FunctionDoc::new(Arithmetic, "radians(numeric)", "Degrees to radians.", "radians(180) = 3.141592653589793"), f64::to_radians),
];

// ═══════════════════════════════════════════════════════════════
//  Registration
// ═══════════════════════════════════════════════════════════════

pub(super) fn register(registry: &mut FunctionRegistry) {
    for (names, doc, f) in FLOAT_FUNCTIONS {
        let f = *f;
        registry.register(names, doc.clone(), Arity::Exact(1), move |mut args| {
            Box::new(FloatFunction { arg: args.remove(0), f })
        });
    }
    scalar(
        registry,
        &["log"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "log(base, numeric)", "Logarithm of numeric in the given base.", "log(2, 8) = 3.0"),
        |args| float2(&args[0], &args[1], |base, n| n.ln() / base.ln()),
    );
    scalar(
        registry,
        &["atan2"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "atan2(y, x)", "Angle of the point (x, y) in radians.", "atan2(1, 1) = 0.7853981633974483"),
        |args| float2(&args[0], &args[1], f64::atan2),
    );
    scalar(
        registry,
        &["atan2d"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "atan2d(y, x)", "Angle of the point (x, y) in degrees.", "atan2d(1, 1) = 45.0"),
        |args| float2(&args[0], &args[1], |y, x| y.atan2(x).to_degrees()),
    );
    scalar(
        registry,
        &["power", "pow"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "power(base, exponent)", "base raised to exponent.", "power(2, 10) = 1024.0"),
        |args| float2(&args[0], &args[1], f64::powf),
    );
    scalar(
        registry,
        &["abs"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "abs(numeric)", "Absolute value.", "abs(-3) = 3"),
        |args| {
            Ok(match &args[0] {
                Value::Int(i) => i
                    .checked_abs()
                    .map_or_else(|| Value::Decimal(BigDecimal::from(*i).abs()), Value::Int),
                Value::Float(f) => Value::Float(f.abs()),
                other => other.to_decimal().map_or(Value::Null, |d| Value::Decimal(d.abs())),
            })
        },
    );
    scalar(
        registry,
        &["mod"],
        Arity::Exact(2),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "mod(dividend, divisor)", "Remainder of the division.", "mod(7, 3) = 1"),
        |args| arith(ArithOp::Mod, &args[0], &args[1]),
    );
    scalar(
        registry,
        &["ceil", "ceiling"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "ceil(numeric)", "Smallest integer not less than numeric.", "ceil(1.2) = 2"),
        |args| Ok(integral(&args[0], f64::ceil, RoundingMode::Ceiling)),
    );
    scalar(
        registry,
        &["floor"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "floor(numeric)", "Largest integer not greater than numeric.", "floor(1.8) = 1"),
        |args| Ok(integral(&args[0], f64::floor, RoundingMode::Floor)),
    );
    scalar(
        registry,
        &["round"],
        Arity::Range(1, 2),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "round(numeric[, scale])", "Rounds half away from zero to scale decimal places (default 0, at most 1000 either way).", "round(3.14159, 2) = 3.14"),
        |args| Ok(rescale(args, RoundingMode::HalfUp)),
    );
    scalar(
        registry,
        &["truncate"],
        Arity::Range(1, 2),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "truncate(numeric[, scale])", "Drops digits beyond scale decimal places (default 0, at most 1000 either way).", "truncate(3.789, 1) = 3.7"),
        |args| Ok(rescale(args, RoundingMode::Down)),
    );
    scalar(
        registry,
        &["sign"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "sign(numeric)", "-1, 0 or 1 by the sign of numeric.", "sign(-8) = -1"),
        |args| {
            Ok(match &args[0] {
                Value::Int(i) => Value::Int(i.signum()),
                other => other.to_decimal().map_or(Value::Null, |d| {
                    Value::Int(match d.sign() {
                        bigdecimal::num_bigint::Sign::Minus => -1,
                        bigdecimal::num_bigint::Sign::NoSign => 0,
                        bigdecimal::num_bigint::Sign::Plus => 1,
                    })
                }),
            })
        },
    );
    scalar(
        registry,
        &["pi"],
        Arity::Exact(0),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "pi()", "The constant pi.", "pi() = 3.141592653589793"),
        |_| Ok(Value::Float(std::f64::consts::PI)),
    );
    scalar(
        registry,
        &["greatest"],
        Arity::AtLeast(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "greatest(value1, value2, ...)", "Largest argument; null if any argument is null.", "greatest(1, 5, 3) = 5"),
        |args| Ok(pick(args, Ordering::Greater)),
    );
    scalar(
        registry,
        &["least"],
        Arity::AtLeast(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "least(value1, value2, ...)", "Smallest argument; null if any argument is null.", "least(1, 5, 3) = 1"),
        |args| Ok(pick(args, Ordering::Less)),
    );
    scalar(
        registry,
        &["bin"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "bin(integer)", "Binary representation of an integer.", "bin(4) = 100"),
        |args| Ok(args[0].to_i64().map_or(Value::Null, |i| Value::String(format!("{i:b}")))),
    );
    scalar(
        registry,
        &["hex"],
        Arity::Exact(1),
        Nulls::Strict,
        FunctionDoc::new(Arithmetic, "hex(value)", "Hexadecimal form of an integer, or of the bytes of a string.", "hex(255) = FF"),
        |args| {
            let whole = args[0].to_decimal().filter(BigDecimal::is_integer);
            Ok(match whole.and_then(|_| args[0].to_i64()) {
                Some(i) => Value::String(format!("{i:X}")),
                None => args[0].to_text().map_or(Value::Null, |t| {
                    Value::String(t.bytes().map(|b| format!("{b:02X}")).collect())
                }),
            })
        },
    );
}

// ═══════════════════════════════════════════════════════════════
//  Numeric helpers
// ═══════════════════════════════════════════════════════════════

fn float2(a: &Value, b: &Value, f: impl FnOnce(f64, f64) -> f64) -> EvalResult {
    Ok(match (a.to_f64(), b.to_f64()) {
        (Some(x), Some(y)) => Value::finite(f(x, y)),
        _ => Value::Null,
    })
}

fn integral(v: &Value, float: fn(f64) -> f64, mode: RoundingMode) -> Value {
    match v {
        Value::Int(_) => v.clone(),
        Value::Float(f) => Value::finite(float(*f)),
        other => other
            .to_decimal()
            .map_or(Value::Null, |d| narrow(d.with_scale_round(0, mode))),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Rounding
// ═══════════════════════════════════════════════════════════════

/// Widest `round` / `truncate` scale, either sign; beyond it the result is `Null`.
const MAX_SCALE: i64 = 1000;

/// `round` / `truncate`: the result keeps the input's numeric family.
fn rescale(args: &[Value], mode: RoundingMode) -> Value {
    let scale = match opt(args, 1).map(Value::to_i64) {
        Some(Some(s)) if (-MAX_SCALE..=MAX_SCALE).contains(&s) => s,
        Some(_) => return Value::Null,
        None => 0,
    };
    let Some(d) = args[0].to_decimal() else {
        return Value::Null;
    };
    let rounded = d.with_scale_round(scale, mode);
    match &args[0] {
        Value::Float(_) => rounded.to_string().parse().map_or(Value::Null, Value::Float),
        _ if scale <= 0 => narrow(rounded),
        _ => Value::Decimal(rounded),
    }
}

// ═══════════════════════════════════════════════════════════════
//  greatest / least
// ═══════════════════════════════════════════════════════════════

fn pick(args: &[Value], want: Ordering) -> Value {
    let mut best = &args[0];
    for candidate in &args[1..] {
        match compare(candidate, best) {
            Some(ord) if ord == want => best = candidate,
            Some(_) => {}
            None => return Value::Null,
        }
    }
    best.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::function::testing::{call, call_ok};

    fn f(x: f64) -> Value {
        Value::Float(x)
    }

    #[test]
    fn atan2d_scenarios() {
        assert_eq!(call_ok("atan2d", vec![Value::from("1"), Value::from("1")]).to_string(), "45.0");
        assert_eq!(call_ok("atan2d", vec![Value::from("1"), Value::from("0")]).to_string(), "90.0");
        assert_eq!(call_ok("atan2d", vec![Value::from("0"), Value::from("-1")]).to_string(), "180.0");
    }

    #[test]
    fn log_forms() {
        assert_eq!(call_ok("log", vec![Value::from("1")]).to_string(), "0.0");
        assert_eq!(call_ok("log", vec![Value::from("2"), Value::from("8")]).to_string(), "3.0");
        assert_eq!(call_ok("log", vec![Value::from("10"), Value::from("100")]).to_string(), "2.0");
        assert_eq!(call_ok("log", vec![Value::Null, Value::from("100")]), Value::Null);
        assert_eq!(call_ok("log", vec![Value::Int(0)]), Value::Null);
    }

    #[test]
    fn cbrt_preserves_sign() {
        for n in [27.0, -27.0, 2.0, -0.001] {
            let Value::Float(r) = call_ok("cbrt", vec![f(n)]) else {
                panic!("float expected");
            };
            assert!((r * r * r - n).abs() < 1e-9, "cbrt({n}) = {r}");
        }
        assert_eq!(call_ok("cbrt", vec![Value::Null]), Value::Null);
    }

    #[test]
    fn domain_errors_are_null() {
        assert_eq!(call_ok("sqrt", vec![Value::Int(-1)]), Value::Null);
        assert_eq!(call_ok("ln", vec![Value::Int(0)]), Value::Null);
        assert_eq!(call_ok("sqrt", vec![Value::from("abc")]), Value::Null);
    }

    #[test]
    fn rounding_keeps_family() {
        assert_eq!(call_ok("round", vec![Value::from("3.14159"), Value::Int(2)]).to_string(), "3.14");
        assert_eq!(call_ok("round", vec![f(2.5)]), f(3.0));
        assert_eq!(call_ok("round", vec![Value::from("-2.5")]), Value::Int(-3));
        assert_eq!(call_ok("truncate", vec![Value::from("3.789"), Value::Int(1)]).to_string(), "3.7");
        assert_eq!(call_ok("ceil", vec![Value::from("1.2")]), Value::Int(2));
        assert_eq!(call_ok("floor", vec![f(-1.5)]), f(-2.0));
    }

    #[test]
    fn rounding_scale_is_bounded() {
        assert_eq!(call_ok("round", vec![Value::from("1.5"), Value::Int(20_000_000)]), Value::Null);
        assert_eq!(call_ok("truncate", vec![Value::from("1.5"), Value::Int(-1001)]), Value::Null);
        let Value::Decimal(wide) = call_ok("round", vec![Value::from("1.5"), Value::Int(1000)]) else {
            panic!("decimal expected");
        };
        assert_eq!(wide.fractional_digit_count(), 1000);
        assert_eq!(call_ok("round", vec![Value::from("1e2000000")]), Value::Null);
    }

    #[test]
    fn integer_helpers() {
        assert_eq!(call_ok("abs", vec![Value::Int(-3)]), Value::Int(3));
        assert_eq!(call_ok("sign", vec![Value::from("-0.5")]), Value::Int(-1));
        assert_eq!(call_ok("mod", vec![Value::Int(7), Value::Int(3)]), Value::Int(1));
        assert_eq!(call("mod", vec![Value::Int(7), Value::Int(0)]), Err(EvalError::DivisionByZero));
        assert_eq!(call_ok("bin", vec![Value::Int(4)]), Value::from("100"));
        assert_eq!(call_ok("hex", vec![Value::Int(255)]), Value::from("FF"));
        assert_eq!(call_ok("hex", vec![Value::from("ab")]), Value::from("6162"));
    }

    #[test]
    fn greatest_and_least() {
        let args = vec![Value::Int(1), Value::from("5"), f(3.5)];
        assert_eq!(call_ok("greatest", args.clone()), Value::from("5"));
        assert_eq!(call_ok("least", args), Value::Int(1));
        assert_eq!(call_ok("greatest", vec![Value::Int(1), Value::Null]), Value::Null);
    }

    #[test]
    fn degree_trig() {
        assert_eq!(call_ok("atand", vec![Value::Int(1)]), f(45.0));
        assert_eq!(call_ok("cosd", vec![Value::Int(0)]), f(1.0));
        assert_eq!(call_ok("pi", vec![]), f(std::f64::consts::PI));
    }
}
