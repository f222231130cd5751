use bigdecimal::BigDecimal;
use num_traits::Zero;
use transform_api::format::SourceData;
use transform_api::value::Value;

use super::{BoxedParser, ValueParser, required};
use crate::context::Context;
use crate::error::{EvalError, EvalResult};
use crate::numeric::{divide, is_float, narrow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "addition",
            ArithOp::Sub => "subtraction",
            ArithOp::Mul => "multiplication",
            ArithOp::Div => "division",
            ArithOp::Mod => "modulo",
        }
    }
}

/// Apply a binary arithmetic operator.
///
/// `Int op Int` stays integral unless it overflows (then decimal) or, for
/// division, the quotient is inexact. A float operand makes the result
/// float; anything else goes through decimal. Non-numeric operands give
/// `Null`; a zero divisor is a fault.
pub(crate) fn arith(op: ArithOp, left: &Value, right: &Value) -> EvalResult {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        if let Some(v) = int_arith(op, *a, *b)? {
            return Ok(Value::Int(v));
        }
    }
    if is_float(left) || is_float(right) {
        let (Some(a), Some(b)) = (left.to_f64(), right.to_f64()) else {
            return Ok(Value::Null);
        };
        return float_arith(op, a, b);
    }
    let (Some(a), Some(b)) = (left.to_decimal(), right.to_decimal()) else {
        return Ok(Value::Null);
    };
    decimal_arith(op, &a, &b)
}

/// `Ok(None)` means "retry in decimal".
fn int_arith(op: ArithOp, a: i64, b: i64) -> Result<Option<i64>, EvalError> {
    Ok(match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b),
                _ => None,
            }
        }
        ArithOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_rem(b)
        }
    })
}

fn float_arith(op: ArithOp, a: f64, b: f64) -> EvalResult {
    let v = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div | ArithOp::Mod if b == 0.0 => return Err(EvalError::DivisionByZero),
        ArithOp::Div => a / b,
        ArithOp::Mod => a % b,
    };
    if v.is_finite() {
        Ok(Value::Float(v))
    } else {
        Err(EvalError::Overflow(op.name()))
    }
}

fn decimal_arith(op: ArithOp, a: &BigDecimal, b: &BigDecimal) -> EvalResult {
    let v = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div | ArithOp::Mod if b.is_zero() => return Err(EvalError::DivisionByZero),
        ArithOp::Div => divide(a, b),
        ArithOp::Mod => a % b,
    };
    Ok(Value::Decimal(v))
}

pub struct Arithmetic {
    op: ArithOp,
    left: BoxedParser,
    right: BoxedParser,
}

impl Arithmetic {
    pub fn new(op: ArithOp, left: BoxedParser, right: BoxedParser) -> Self {
        Self { op, left, right }
    }
}

impl ValueParser for Arithmetic {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        let left = required!(self.left, source, row_index, context);
        let right = required!(self.right, source, row_index, context);
        arith(self.op, &left, &right)
    }
}

/// Unary minus.
pub struct Negate {
    inner: BoxedParser,
}

impl Negate {
    pub fn new(inner: BoxedParser) -> Self {
        Self { inner }
    }
}

impl ValueParser for Negate {
    fn evaluate(&self, source: &dyn SourceData, row_index: usize, context: &Context) -> EvalResult {
        Ok(match required!(self.inner, source, row_index, context) {
            Value::Int(i) => i
                .checked_neg()
                .map_or_else(|| Value::Decimal(-BigDecimal::from(i)), Value::Int),
            Value::Float(f) => Value::Float(-f),
            other => other.to_decimal().map_or(Value::Null, |d| narrow(-d)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::node::testing::{eval, lit};

    fn dec(s: &str) -> Value {
        Value::Decimal(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn int_arithmetic_stays_integral() {
        assert_eq!(arith(ArithOp::Add, &Value::Int(2), &Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(arith(ArithOp::Div, &Value::Int(8), &Value::Int(2)), Ok(Value::Int(4)));
        assert_eq!(arith(ArithOp::Mod, &Value::Int(7), &Value::Int(3)), Ok(Value::Int(1)));
    }

    #[test]
    fn inexact_int_division_goes_decimal() {
        assert_eq!(arith(ArithOp::Div, &Value::Int(7), &Value::Int(2)), Ok(dec("3.5")));
    }

    #[test]
    fn overflow_promotes_to_decimal() {
        let r = arith(ArithOp::Add, &Value::Int(i64::MAX), &Value::Int(1)).unwrap();
        assert_eq!(r, dec("9223372036854775808"));
    }

    #[test]
    fn text_operands_parse_as_decimal() {
        let r = arith(ArithOp::Mul, &Value::from("1.5"), &Value::from("2")).unwrap();
        assert!(r.sql_eq(&Value::Int(3)));
        assert_eq!(arith(ArithOp::Add, &Value::from("abc"), &Value::Int(1)), Ok(Value::Null));
    }

    #[test]
    fn float_operand_wins() {
        assert_eq!(arith(ArithOp::Sub, &Value::Float(1.5), &Value::Int(1)), Ok(Value::Float(0.5)));
    }

    #[test]
    fn zero_divisor_faults() {
        assert_eq!(arith(ArithOp::Div, &Value::Int(1), &Value::Int(0)), Err(EvalError::DivisionByZero));
        assert_eq!(arith(ArithOp::Mod, &dec("1.5"), &Value::from("0")), Err(EvalError::DivisionByZero));
        assert_eq!(arith(ArithOp::Div, &Value::Float(1.0), &Value::Int(0)), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn null_operand_short_circuits() {
        let node = Arithmetic::new(ArithOp::Div, lit(Value::Null), lit(0));
        assert_eq!(eval(&node), Ok(Value::Null));
    }

    #[test]
    fn negate_handles_min_int() {
        assert_eq!(eval(&Negate::new(lit(5))), Ok(Value::Int(-5)));
        assert_eq!(eval(&Negate::new(lit("2.5"))), Ok(dec("-2.5")));
        assert_eq!(
            eval(&Negate::new(lit(i64::MIN))),
            Ok(dec("9223372036854775808"))
        );
    }
}
