//! Nil, zero-value and existence predicates

use super::{check, need, negate, Outcome};
use crate::value::Value;

// Seconds from the Unix epoch to 0001-01-01T00:00:00Z, the zero instant.
const ZERO_INSTANT_SECS: i64 = -62_135_596_800;

/// Null, or a reference whose storage is absent
pub fn is_nil(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Opaque(o) => o.is_absent(),
        _ => false,
    }
}

/// A value nobody assigned: null, `false`, `0`, `""` or the zero instant.
/// Sequences and mappings, even empty ones, were constructed and are not zero.
pub fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Float(x) => *x == 0.0,
        Value::String(s) => s.is_empty(),
        Value::Time(t) => t.timestamp() == ZERO_INSTANT_SECS && t.timestamp_subsec_nanos() == 0,
        Value::Seq(_) | Value::Map(_) => false,
        Value::Opaque(o) => o.is_absent(),
    }
}

pub fn should_be_nil(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    check(is_nil(actual), || format!("expected: nil but got: {}", actual))
}

pub fn should_not_be_nil(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_be_nil(actual, expected), || {
        "expected: not nil but got: nil".to_string()
    })
}

pub fn should_be_zero_value(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    check(is_zero_value(actual), || {
        format!("expected: zero value but got: {}", actual)
    })
}

/// Holds when the value is nil, blank or a zero value
pub fn should_not_exist(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    let blank = super::strings::should_be_blank(actual, &[]).is_ok();
    check(is_nil(actual) || blank || is_zero_value(actual), || {
        format!("expected: not to exist but got: {}", actual)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::test_support::{is_argument, is_assertion, v};
    use crate::value::{coerce::parse_time, Map, Opaque};

    #[test]
    fn test_should_be_nil() {
        assert_eq!(should_be_nil(&Value::Null, &[]), Ok(()));
        assert_eq!(should_be_nil(&v(Opaque::absent("chan")), &[]), Ok(()));
        assert!(is_assertion(should_be_nil(&v(Opaque::new("chan", "c")), &[])));
        assert!(is_assertion(should_be_nil(&v(""), &[])));
        assert!(is_argument(should_be_nil(&Value::Null, &[v(1)])));
    }

    #[test]
    fn test_should_not_be_nil() {
        assert_eq!(should_not_be_nil(&v(0), &[]), Ok(()));
        assert!(is_assertion(should_not_be_nil(&Value::Null, &[])));
    }

    #[test]
    fn test_zero_value_distinguishes_empty_containers() {
        assert_eq!(should_be_zero_value(&v(0), &[]), Ok(()));
        assert_eq!(should_be_zero_value(&v(""), &[]), Ok(()));
        assert_eq!(should_be_zero_value(&v(false), &[]), Ok(()));
        assert_eq!(should_be_zero_value(&Value::Null, &[]), Ok(()));
        assert!(is_assertion(should_be_zero_value(&Value::Seq(vec![]), &[])));
        assert!(is_assertion(should_be_zero_value(&Value::Map(Map::new()), &[])));
        assert!(is_assertion(should_be_zero_value(&v(0.5), &[])));
    }

    #[test]
    fn test_zero_instant() {
        let zero = parse_time("0001-01-01T00:00:00Z").unwrap();
        assert_eq!(should_be_zero_value(&Value::Time(zero), &[]), Ok(()));
        let other = parse_time("2006-01-02T15:04:05+07:00").unwrap();
        assert!(is_assertion(should_be_zero_value(&Value::Time(other), &[])));
    }

    #[test]
    fn test_should_not_exist_is_wider_than_nil() {
        assert_eq!(should_not_exist(&Value::Null, &[]), Ok(()));
        assert_eq!(should_not_exist(&v(""), &[]), Ok(()));
        assert_eq!(should_not_exist(&v(0), &[]), Ok(()));
        assert!(is_assertion(should_not_exist(&v("x"), &[])));
        assert!(is_assertion(should_not_exist(&Value::Seq(vec![]), &[])));
        assert!(is_argument(should_not_exist(&Value::Null, &[v("x")])));
    }
}
