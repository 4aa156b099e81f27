//! Decoding a step descriptor into an executor configuration
//!
//! Values are layered, lowest first: the configuration's `Default` plus its
//! `set_defaults`, then the `[executors.<name>]` table from the config file,
//! then the step itself. The merged mapping is decoded tolerantly (see
//! [`crate::value::de`]); unknown keys such as `type` or `assertions` are
//! ignored.

use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};
use serde::Serializer;

use super::ExecutorConfig;
use crate::value::{from_value, DecodeError, Value};

/// Build an executor configuration from its layers
pub fn decode<E: ExecutorConfig>(
    step: &Value,
    overrides: Option<&Value>,
) -> Result<E, DecodeError> {
    let mut config = E::default();
    config.set_defaults();

    let mut merged = Value::from_serialize(&config).map_err(|e| {
        <DecodeError as de::Error>::custom(format!(
            "cannot serialize {} defaults: {}",
            E::NAME,
            e
        ))
    })?;
    if let Some(overrides) = overrides {
        merge(&mut merged, overrides);
    }
    merge(&mut merged, step);

    tracing::debug!(executor = E::NAME, "decoding step configuration");
    from_value(&merged)
}

/// Deep-merge `overlay` into `base`: mappings merge key by key, anything
/// else in the overlay replaces what was there. A null overlay is ignored.
pub fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Map(base), Value::Map(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Parse a duration such as `1m30s`, `250ms`, `2h` or `1.5s`.
///
/// Bare numbers are seconds.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = text.parse::<f64>() {
        return seconds(secs).ok_or_else(|| format!("invalid duration {:?}", text));
    }

    let mut total_nanos = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", text))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, text)),
        };
        rest = &rest[unit_len..];
        total_nanos += number * nanos_per_unit;
    }
    nanos(total_nanos).ok_or_else(|| format!("invalid duration {:?}", text))
}

fn seconds(secs: f64) -> Option<Duration> {
    nanos(secs * 1e9)
}

fn nanos(total: f64) -> Option<Duration> {
    let total = total.round();
    (total.is_finite() && total >= 0.0 && total < u64::MAX as f64)
        .then(|| Duration::from_nanos(total as u64))
}

/// Render a duration the way [`parse_duration`] reads it
pub fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else if d.subsec_nanos() % 1_000_000 == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}ns", d.as_nanos())
    }
}

/// `#[serde(with = "duration")]` for `Duration` fields: integer or float
/// seconds, or text like `1m30s`
pub mod duration {
    use super::*;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        deserializer.deserialize_any(DurationVisitor)
    }

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a duration in seconds or text such as \"1m30s\"")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("negative duration {}", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Duration, E> {
            seconds(v).ok_or_else(|| E::custom(format!("invalid duration {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
            parse_duration(v).map_err(E::custom)
        }

        // Null means "not set"
        fn visit_unit<E: de::Error>(self) -> Result<Duration, E> {
            Ok(Duration::ZERO)
        }
    }
}

/// `#[serde(with = "instant")]` for time instant fields, read from the
/// canonical `2006-01-02T15:04:05+07:00` form
pub mod instant {
    use chrono::{DateTime, FixedOffset};

    use super::*;
    use crate::value::coerce::parse_time;

    pub fn serialize<S: Serializer>(
        t: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::value::format_instant(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        parse_time(&text).map_err(de::Error::custom)
    }
}
