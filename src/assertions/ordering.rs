//! Ordering and range predicates
//!
//! Operands must share a class: both numeric or both strings. When both read
//! as numbers they are compared numerically (so `"10" > "9"`), otherwise
//! lexically.

use std::cmp::Ordering;

use super::{check, need, negate, Failure, Outcome};
use crate::value::coerce::to_float;
use crate::value::Value;

const SAME_TYPE: &str = "This assertion requires 2 values of same types.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Numeric,
    Text,
}

fn class(value: &Value) -> Option<Class> {
    match value {
        Value::Int(_) | Value::Float(_) => Some(Class::Numeric),
        Value::String(_) => Some(Class::Text),
        _ => None,
    }
}

fn same_class(a: &Value, b: &Value) -> Result<(), Failure> {
    match (class(a), class(b)) {
        (Some(x), Some(y)) if x == y => Ok(()),
        _ => Err(Failure::argument(SAME_TYPE)),
    }
}

/// Order two values of the same class
fn compare(a: &Value, b: &Value) -> Result<Ordering, Failure> {
    same_class(a, b)?;
    if let (Ok(x), Ok(y)) = (to_float(a), to_float(b)) {
        return x
            .partial_cmp(&y)
            .ok_or_else(|| Failure::argument(format!("cannot order {} and {}", a, b)));
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(Failure::argument(SAME_TYPE)),
    }
}

pub fn should_be_greater_than(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let ord = compare(actual, &expected[0])?;
    check(ord == Ordering::Greater, || {
        format!("expected: greater than {} but got: {}", expected[0], actual)
    })
}

pub fn should_be_greater_than_or_equal_to(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let ord = compare(actual, &expected[0])?;
    check(ord != Ordering::Less, || {
        format!(
            "expected: greater than or equal to {} but got: {}",
            expected[0], actual
        )
    })
}

pub fn should_be_less_than(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let ord = compare(actual, &expected[0])?;
    check(ord == Ordering::Less, || {
        format!("expected: less than {} but got: {}", expected[0], actual)
    })
}

pub fn should_be_less_than_or_equal_to(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let ord = compare(actual, &expected[0])?;
    check(ord != Ordering::Greater, || {
        format!(
            "expected: less than or equal to {} but got: {}",
            expected[0], actual
        )
    })
}

/// Position of `actual` relative to the bounds `expected[0]` and `expected[1]`
fn bounds(actual: &Value, expected: &[Value]) -> Result<(Ordering, Ordering), Failure> {
    need(2, expected)?;
    same_class(&expected[0], &expected[1])?;
    let low = compare(actual, &expected[0])?;
    let high = compare(actual, &expected[1])?;
    Ok((low, high))
}

pub fn should_be_between(actual: &Value, expected: &[Value]) -> Outcome {
    let (low, high) = bounds(actual, expected)?;
    check(low == Ordering::Greater && high == Ordering::Less, || {
        format!(
            "expected: between {} and {} but got: {}",
            expected[0], expected[1], actual
        )
    })
}

pub fn should_not_be_between(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_be_between(actual, expected), || {
        format!(
            "expected: not between {} and {} but got: {}",
            expected[0], expected[1], actual
        )
    })
}

pub fn should_be_between_or_equal(actual: &Value, expected: &[Value]) -> Outcome {
    let (low, high) = bounds(actual, expected)?;
    check(low != Ordering::Less && high != Ordering::Greater, || {
        format!(
            "expected: between or equal to {} and {} but got: {}",
            expected[0], expected[1], actual
        )
    })
}

pub fn should_not_be_between_or_equal(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_be_between_or_equal(actual, expected), || {
        format!(
            "expected: not between or equal to {} and {} but got: {}",
            expected[0], expected[1], actual
        )
    })
}
