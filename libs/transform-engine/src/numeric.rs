//! Decimal helpers shared by operators and numeric functions.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{ToPrimitive, Zero};
use transform_api::value::Value;

/// Scale kept for non-terminating decimal division.
pub(crate) const DIVISION_SCALE: i64 = 16;

/// Drop trailing fractional zeros: `3.5000` -> `3.5`, `2.00` -> `2`.
pub(crate) fn trim_zeros(d: BigDecimal) -> BigDecimal {
    let (mut digits, mut scale) = d.as_bigint_and_exponent();
    if scale <= 0 {
        return d;
    }
    let ten = BigInt::from(10);
    while scale > 0 && (&digits % &ten).is_zero() {
        digits /= &ten;
        scale -= 1;
    }
    BigDecimal::new(digits, scale)
}

pub(crate) fn divide(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    trim_zeros((a / b).with_scale_round(DIVISION_SCALE, RoundingMode::HalfUp))
}

/// Integral decimals that fit come back as `Int`.
pub(crate) fn narrow(d: BigDecimal) -> Value {
    if d.is_integer() {
        if let Some(i) = d.to_i64() {
            return Value::Int(i);
        }
    }
    Value::Decimal(d)
}

/// Whether a value takes the float path in arithmetic.
pub(crate) fn is_float(v: &Value) -> bool {
    matches!(v, Value::Float(_))
}
