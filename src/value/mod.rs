//! Dynamically shaped values
//!
//! Step descriptors, executor results and assertion arguments all travel as
//! [`Value`]. Nothing in this module knows the static type a suite author had
//! in mind; predicates work in terms of the coercions in [`coerce`], and
//! executor configurations are populated through the tolerant decoder in [`de`].

pub mod coerce;
pub mod de;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub use coerce::CoercionError;
pub use de::{from_value, DecodeError};

/// Keyed mapping from string to [`Value`]
pub type Map = BTreeMap<String, Value>;

/// An untyped datum
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Point in time carrying its original offset; equality is instant equality
    Time(DateTime<FixedOffset>),
    Seq(Vec<Value>),
    Map(Map),
    /// Host object the core cannot look inside
    Opaque(Opaque),
}

/// A host object known only by its type name and, when it has one, its
/// canonical textual form.
///
/// `text: None` models a reference whose underlying storage is absent
/// (a nil pointer, a closed channel handle, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    pub type_name: String,
    pub text: Option<String>,
}

impl Opaque {
    /// An opaque value with a textual form
    pub fn new(type_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            text: Some(text.into()),
        }
    }

    /// An opaque reference with no underlying storage
    pub fn absent(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            text: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.text.is_none()
    }
}

impl Value {
    /// Short name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Time(_) => "time",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Parse JSON text into a value
    pub fn from_json_str(text: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str::<serde_json::Value>(text).map(Value::from)
    }

    /// Serialize any serde type into a value
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }
}

/// Canonical RFC 3339 rendering of an instant, keeping its offset
pub(crate) fn format_instant(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// Textual form used by the equality fallback and by diagnostics.
// Sequences render as `[a b]` and mappings as `map[k:v]`, so the fallback
// behaves the same for existing suites.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Time(t) => write!(f, "{}", format_instant(t)),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "map[")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                write!(f, "]")
            }
            Value::Opaque(o) => match &o.text {
                Some(text) => write!(f, "{}", text),
                None => write!(f, "<nil>"),
            },
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::String(s) => serializer.serialize_str(s),
            Value::Time(t) => serializer.serialize_str(&format_instant(t)),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Opaque(o) => match &o.text {
                Some(text) => serializer.serialize_str(text),
                None => serializer.serialize_none(),
            },
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Time(t) => serde_json::Value::String(format_instant(t)),
            Value::Seq(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
            Value::Opaque(o) => match &o.text {
                Some(text) => serde_json::Value::String(text.clone()),
                None => serde_json::Value::Null,
            },
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(v: serde_yaml::Value) -> Self {
        match v {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Value::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

/// Mapping keys in suite files are usually strings, but YAML allows any
/// scalar; those are keyed by their textual form.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => Value::from(other).to_string(),
    }
}

impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(x) => Value::Float(x),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => {
                let text = dt.to_string();
                match DateTime::parse_from_rfc3339(&text) {
                    Ok(t) => Value::Time(t),
                    Err(_) => Value::String(text),
                }
            }
            toml::Value::Array(items) => Value::Seq(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => {
                Value::Map(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Value::Opaque(o)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_suite_text() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(42.0).to_string(), "42");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "<nil>");
        assert_eq!(Value::from(vec![1, 2, 3]).to_string(), "[1 2 3]");

        let mut map = Map::new();
        map.insert("b".to_string(), Value::Int(2));
        map.insert("a".to_string(), Value::from("x"));
        assert_eq!(Value::Map(map).to_string(), "map[a:x b:2]");
    }

    #[test]
    fn test_time_equality_is_instant_equality() {
        let a = DateTime::parse_from_rfc3339("2006-01-02T15:04:05+07:00").unwrap();
        let b = DateTime::parse_from_rfc3339("2006-01-02T08:04:05Z").unwrap();
        assert_eq!(Value::Time(a), Value::Time(b));
        assert_eq!(Value::Time(a).to_string(), "2006-01-02T15:04:05+07:00");
    }

    #[test]
    fn test_from_json() {
        let v = Value::from_json_str(r#"{"a": [1, 2.5, "x", null, true]}"#).unwrap();
        let items = match v.get("a") {
            Some(Value::Seq(items)) => items.clone(),
            other => panic!("Expected sequence, got {:?}", other),
        };
        assert_eq!(
            items,
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Null,
                Value::Bool(true)
            ]
        );
    }

    #[test]
    fn test_from_yaml_non_string_keys() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\nname: x").unwrap();
        let v = Value::from(yaml);
        assert_eq!(v.get("1"), Some(&Value::from("one")));
        assert_eq!(v.get("true"), Some(&Value::from("yes")));
        assert_eq!(v.get("name"), Some(&Value::from("x")));
    }

    #[test]
    fn test_opaque_rendering() {
        assert_eq!(Value::from(Opaque::new("Handle", "h#1")).to_string(), "h#1");
        assert_eq!(Value::from(Opaque::absent("Handle")).to_string(), "<nil>");
        assert!(Opaque::absent("Handle").is_absent());
    }

    #[test]
    fn test_serialize_round_trips_through_json() {
        let v = Value::from_json_str(r#"{"code": 0, "out": "ok"}"#).unwrap();
        let json = serde_json::Value::from(&v);
        assert_eq!(json["code"], serde_json::json!(0));
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"code":0,"out":"ok"}"#);
    }
}
