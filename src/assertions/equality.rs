//! Equality and boolean predicates

use super::{check, need, negate, Outcome};
use crate::value::coerce::{to_bool, to_float, to_time};
use crate::value::Value;

/// Equality used by `ShouldEqual` and every predicate built on it.
///
/// Structural equality first. When either side is a time instant and the
/// other reads as one, the instants are compared. Failing both, two values
/// are equal when their textual forms are equal, so `42` equals `"42"`.
/// Suites depend on that fallback.
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    if matches!(actual, Value::Time(_)) || matches!(expected, Value::Time(_)) {
        if let (Ok(a), Ok(b)) = (to_time(actual), to_time(expected)) {
            return a == b;
        }
    }
    actual.to_string() == expected.to_string()
}

pub fn should_equal(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    check(values_equal(actual, &expected[0]), || {
        format!("expected: {} but got: {}", expected[0], actual)
    })
}

pub fn should_not_equal(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_equal(actual, expected), || {
        format!("expected: not {} but got: {}", expected[0], actual)
    })
}

/// Distance between `actual` and `expected[0]`, with `expected[1]` as delta
fn distance(actual: &Value, expected: &[Value]) -> Result<(f64, f64), super::Failure> {
    need(2, expected)?;
    let a = to_float(actual)?;
    let e = to_float(&expected[0])?;
    let delta = to_float(&expected[1])?;
    Ok(((a - e).abs(), delta))
}

pub fn should_almost_equal(actual: &Value, expected: &[Value]) -> Outcome {
    let (diff, delta) = distance(actual, expected)?;
    check(diff <= delta, || {
        format!(
            "expected: {} (+/- {}) but got: {} (off by {})",
            expected[0], delta, actual, diff
        )
    })
}

/// Holds when the values are at least `delta` apart
pub fn should_not_almost_equal(actual: &Value, expected: &[Value]) -> Outcome {
    let (diff, delta) = distance(actual, expected)?;
    check(diff >= delta, || {
        format!(
            "expected: not {} (+/- {}) but got: {} (off by {})",
            expected[0], delta, actual, diff
        )
    })
}

pub fn should_be_true(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    check(to_bool(actual)?, || format!("expected: true but got: {}", actual))
}

pub fn should_be_false(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    check(!to_bool(actual)?, || format!("expected: false but got: {}", actual))
}
