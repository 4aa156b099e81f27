//! JSON-aware equality predicates
//!
//! Mapping and sequence actuals are compared against the argument parsed as
//! JSON; key order does not matter and `1` equals `1.0`. Scalar actuals are
//! compared against the argument's text the way a JSON document would
//! render them.

use super::{check, need, negate, Failure, Outcome};
use crate::value::coerce::{to_bool, to_float, to_sequence, to_string};
use crate::value::Value;

fn parse_json(text: &str) -> Result<Value, Failure> {
    Value::from_json_str(text)
        .map_err(|e| Failure::argument(format!("invalid JSON {:?}: {}", text, e)))
}

/// Structural equality in which numbers compare by value
fn same_json(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            matches!((to_float(a), to_float(b)), (Ok(x), Ok(y)) if x == y)
        }
        (Value::Seq(x), Value::Seq(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| same_json(l, r))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, l)| y.get(k).is_some_and(|r| same_json(l, r)))
        }
        _ => a == b,
    }
}

/// Whether `actual` is JSON-equal to the document `expected`
pub fn json_equal(actual: &Value, expected: &Value) -> Result<bool, Failure> {
    match actual {
        Value::Map(_) | Value::Seq(_) => {
            let doc = parse_json(&to_string(expected)?)?;
            Ok(same_json(actual, &doc))
        }
        // An absent JSON value reads as the empty string or `null`
        Value::Null => {
            let text = to_string(expected)?;
            Ok(text.is_empty() || text == "null")
        }
        Value::String(s) => {
            let text = to_string(expected)?;
            Ok(*s == text || (s.is_empty() && text == "null"))
        }
        Value::Int(_) | Value::Float(_) => Ok(to_float(actual)? == to_float(expected)?),
        Value::Bool(b) => Ok(*b == to_bool(expected)?),
        other => Err(Failure::argument(format!(
            "unexpected type for actual: {}",
            other.type_name()
        ))),
    }
}

pub fn should_json_equal(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    check(json_equal(actual, &expected[0])?, || {
        format!("expected: JSON equal to {} but got: {}", expected[0], actual)
    })
}

pub fn should_not_json_equal(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_json_equal(actual, expected), || {
        format!("expected: not JSON equal to {} but got: {}", expected[0], actual)
    })
}

pub fn should_json_contain(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let items = to_sequence(actual)?;
    for item in items {
        if json_equal(item, &expected[0])? {
            return Ok(());
        }
    }
    Err(Failure::assertion(format!(
        "expected: to contain JSON {} but got: {}",
        expected[0], actual
    )))
}

pub fn should_not_json_contain(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_json_contain(actual, expected), || {
        format!("expected: not to contain JSON {} but got: {}", expected[0], actual)
    })
}

/// For every mapping in the sequence `actual` that has the key
/// `expected[0]`, whether its value is JSON-equal to `expected[1]`
fn keyed_matches(actual: &Value, expected: &[Value]) -> Result<Vec<bool>, Failure> {
    need(2, expected)?;
    let items = to_sequence(actual)?;
    let key = match &expected[0] {
        Value::String(key) => key,
        other => return Err(Failure::argument(format!("expected '{}' to be a string", other))),
    };
    let mut matches = Vec::new();
    for item in items {
        let map = item.as_map().ok_or_else(|| {
            Failure::argument(format!("expected '{}' to be a mapping", item))
        })?;
        if let Some(value) = map.get(key) {
            matches.push(json_equal(value, &expected[1])?);
        }
    }
    Ok(matches)
}

pub fn should_json_contain_with_key(actual: &Value, expected: &[Value]) -> Outcome {
    let matches = keyed_matches(actual, expected)?;
    check(matches.iter().any(|m| *m), || {
        format!(
            "expected: an element with {} equal to {} but got: {}",
            expected[0], expected[1], actual
        )
    })
}

pub fn should_json_contain_all_with_key(actual: &Value, expected: &[Value]) -> Outcome {
    let matches = keyed_matches(actual, expected)?;
    check(matches.iter().all(|m| *m), || {
        format!(
            "expected: every element with {} equal to {} but got: {}",
            expected[0], expected[1], actual
        )
    })
}

pub fn should_not_json_contain_with_key(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_json_contain_with_key(actual, expected), || {
        format!(
            "expected: no element with {} equal to {} but got: {}",
            expected[0], expected[1], actual
        )
    })
}
