//! Best-effort conversions of a [`Value`] to a target semantic type
//!
//! Every function is pure and fails explicitly. Predicates call the same
//! coercion on their actual and expected operands before comparing.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use super::{format_instant, Map, Value};

/// A value could not be reinterpreted as the requested type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    #[error("unable to cast {value:?} of type {from} to {target}")]
    Unsupported {
        value: String,
        from: &'static str,
        target: &'static str,
    },

    #[error("invalid date provided: {0:?}")]
    InvalidDate(String),
}

impl CoercionError {
    fn unsupported(value: &Value, target: &'static str) -> Self {
        Self::Unsupported {
            value: value.to_string(),
            from: value.type_name(),
            target,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoercionError>;

const TRUE_WORDS: &[&str] = &["1", "t", "T", "true", "TRUE", "True"];
const FALSE_WORDS: &[&str] = &["0", "f", "F", "false", "FALSE", "False"];

pub fn to_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(x) => Ok(*x != 0.0),
        Value::String(s) if TRUE_WORDS.contains(&s.as_str()) => Ok(true),
        Value::String(s) if FALSE_WORDS.contains(&s.as_str()) => Ok(false),
        other => Err(CoercionError::unsupported(other, "bool")),
    }
}

pub fn to_float(value: &Value) -> Result<f64> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(x) => Ok(*x),
        Value::String(s) => parse_decimal(s).ok_or_else(|| CoercionError::unsupported(value, "float")),
        other => Err(CoercionError::unsupported(other, "float")),
    }
}

/// Integer view of a value, accepting floats and numeric strings with no
/// fractional part
pub fn to_int(value: &Value) -> Result<i64> {
    if let Value::Int(i) = value {
        return Ok(*i);
    }
    if let Value::String(s) = value {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(i);
        }
    }
    let x = to_float(value).map_err(|_| CoercionError::unsupported(value, "int"))?;
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
        Ok(x as i64)
    } else {
        Err(CoercionError::unsupported(value, "int"))
    }
}

/// Textual form of a scalar. The null value reads as the empty string;
/// sequences and mappings are refused.
pub fn to_string(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(x) => Ok(x.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Time(t) => Ok(format_instant(t)),
        Value::Opaque(o) => o
            .text
            .clone()
            .ok_or_else(|| CoercionError::unsupported(value, "string")),
        Value::Seq(_) | Value::Map(_) => Err(CoercionError::unsupported(value, "string")),
    }
}

pub fn to_sequence(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Seq(items) => Ok(items),
        other => Err(CoercionError::unsupported(other, "sequence")),
    }
}

pub fn to_string_map(value: &Value) -> Result<&Map> {
    match value {
        Value::Map(map) => Ok(map),
        other => Err(CoercionError::unsupported(other, "mapping")),
    }
}

pub fn to_time(value: &Value) -> Result<DateTime<FixedOffset>> {
    match value {
        Value::Time(t) => Ok(*t),
        other => {
            let text = to_string(other).map_err(|_| CoercionError::InvalidDate(other.to_string()))?;
            parse_time(&text)
        }
    }
}

/// Parse `2006-01-02T15:04:05+07:00` style instants
pub fn parse_time(text: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).map_err(|_| CoercionError::InvalidDate(text.to_string()))
}

// Decimal text only: `inf`, `NaN` and friends are not numbers in a suite file.
fn parse_decimal(text: &str) -> Option<f64> {
    let x = text.parse::<f64>().ok()?;
    x.is_finite().then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bool_words() {
        for word in TRUE_WORDS {
            assert_eq!(to_bool(&Value::from(*word)), Ok(true));
        }
        for word in FALSE_WORDS {
            assert_eq!(to_bool(&Value::from(*word)), Ok(false));
        }
        assert_eq!(to_bool(&Value::Int(0)), Ok(false));
        assert_eq!(to_bool(&Value::Float(-2.5)), Ok(true));
        assert!(to_bool(&Value::from("yes")).is_err());
        assert!(to_bool(&Value::Null).is_err());
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(&Value::Int(3)), Ok(3.0));
        assert_eq!(to_float(&Value::from("1.25")), Ok(1.25));
        assert!(to_float(&Value::from("abc")).is_err());
        assert!(to_float(&Value::from("NaN")).is_err());
        assert!(to_float(&Value::Bool(true)).is_err());
    }

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&Value::from("12")), Ok(12));
        assert_eq!(to_int(&Value::Float(4.0)), Ok(4));
        assert!(to_int(&Value::Float(4.5)).is_err());
    }

    #[test]
    fn test_to_string_refuses_containers() {
        assert_eq!(to_string(&Value::Int(42)).unwrap(), "42");
        assert_eq!(to_string(&Value::Null).unwrap(), "");
        assert!(to_string(&Value::from(vec![1])).is_err());
        assert!(to_string(&Value::Map(Map::new())).is_err());
    }

    #[test]
    fn test_coercion_idempotence() {
        let t = parse_time("2006-01-02T15:04:05+07:00").unwrap();
        assert_eq!(to_time(&Value::Time(t)), Ok(t));
        assert_eq!(to_bool(&Value::Bool(true)), Ok(true));
        assert_eq!(to_float(&Value::Float(2.5)), Ok(2.5));
        assert_eq!(to_string(&Value::from("x")).unwrap(), "x");

        let seq = Value::from(vec![1, 2]);
        assert_eq!(to_sequence(&seq).unwrap(), &[Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_to_time_invalid_date() {
        match to_time(&Value::from("not a date")) {
            Err(CoercionError::InvalidDate(s)) => assert_eq!(s, "not a date"),
            other => panic!("Expected InvalidDate, got {:?}", other),
        }
        assert!(matches!(
            to_time(&Value::from(vec![1])),
            Err(CoercionError::InvalidDate(_))
        ));
        assert!(to_time(&Value::from("2006-01-02")).is_err());
    }
}
