//! Membership, size and shape predicates over sequences and mappings

use super::equality::values_equal;
use super::{at_least, check, need, negate, Failure, Outcome};
use crate::value::coerce::{to_int, to_sequence, to_string, to_string_map};
use crate::value::Value;

pub fn should_contain(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let items = to_sequence(actual)?;
    check(items.iter().any(|item| values_equal(item, &expected[0])), || {
        format!("expected: to contain {} but got: {}", expected[0], actual)
    })
}

pub fn should_not_contain(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_contain(actual, expected), || {
        format!("expected: not to contain {} but got: {}", expected[0], actual)
    })
}

pub fn should_contain_key(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let map = to_string_map(actual)?;
    let key = to_string(&expected[0])?;
    check(map.contains_key(&key), || {
        format!("expected: to contain key {} but got: {}", key, actual)
    })
}

pub fn should_not_contain_key(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_contain_key(actual, expected), || {
        format!("expected: not to contain key {} but got: {}", expected[0], actual)
    })
}

fn render_list(items: &[Value]) -> String {
    Value::Seq(items.to_vec()).to_string()
}

pub fn should_be_in(actual: &Value, expected: &[Value]) -> Outcome {
    at_least(1, expected)?;
    check(expected.iter().any(|item| values_equal(item, actual)), || {
        format!("expected: in {} but got: {}", render_list(expected), actual)
    })
}

pub fn should_not_be_in(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_be_in(actual, expected), || {
        format!(
            "expected: not in {} but got: {}",
            render_list(expected),
            actual
        )
    })
}

/// Length of a string (in characters), sequence or mapping. The null value
/// has length zero.
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Null => Some(0),
        Value::String(s) => Some(s.chars().count()),
        Value::Seq(items) => Some(items.len()),
        Value::Map(map) => Some(map.len()),
        Value::Opaque(o) if o.is_absent() => Some(0),
        _ => None,
    }
}

/// Values without a length (numbers, booleans, times) are never empty
pub fn should_be_empty(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    check(length(actual) == Some(0), || {
        format!("expected: empty but got: {}", actual)
    })
}

pub fn should_not_be_empty(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_be_empty(actual, expected), || {
        format!("expected: not empty but got: {}", actual)
    })
}

pub fn should_have_length(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let want = to_int(&expected[0])?;
    match length(actual) {
        Some(len) => check(i64::try_from(len).ok() == Some(want), || {
            format!(
                "expected: length of {} but got: {} (length {})",
                want, actual, len
            )
        }),
        None => Err(Failure::assertion(format!(
            "expected: length of {} but got: {} (type {} has no length)",
            want,
            actual,
            actual.type_name()
        ))),
    }
}

pub fn should_be_array(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    check(to_sequence(actual).is_ok(), || {
        format!("expected: an array but got: {}", actual)
    })
}

pub fn should_be_map(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    check(to_string_map(actual).is_ok(), || {
        format!("expected: a map but got: {}", actual)
    })
}
