//! Path-addressable result tree
//!
//! A step's result is a mapping of named roots (`result`, and whatever else
//! the executor registers). Assertion paths start at a root and descend into
//! mappings by key and into sequences by decimal index.

use serde::Serialize;
use thiserror::Error;

use crate::value::{Map, Value};

/// Why a path did not lead to a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Empty path")]
    Empty,

    #[error("Unknown result root '{root}' (available: {available})")]
    UnknownRoot { root: String, available: String },

    #[error("Key '{key}' not found in '{at}'")]
    MissingKey { at: String, key: String },

    #[error("Index {index} out of range in '{at}' (length {len})")]
    IndexOutOfRange { at: String, index: usize, len: usize },

    #[error("'{at}' is a {kind}; cannot look up '{segment}' in it")]
    NotAContainer {
        at: String,
        segment: String,
        kind: &'static str,
    },
}

impl PathError {
    /// The path is well formed but names something the result lacks
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            PathError::MissingKey { .. } | PathError::IndexOutOfRange { .. }
        )
    }
}

/// Read-only output of one executor invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTree {
    roots: Map,
}

impl ResultTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, name: impl Into<String>, value: Value) -> Self {
        self.roots.insert(name.into(), value);
        self
    }

    pub fn root(&self, name: &str) -> Option<&Value> {
        self.roots.get(name)
    }

    /// Names of the registered roots, sorted
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    /// Walk `path`, root first
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Result<&Value, PathError> {
        let (first, rest) = path.split_first().ok_or(PathError::Empty)?;
        let root = first.as_ref();
        let mut current = self.roots.get(root).ok_or_else(|| PathError::UnknownRoot {
            root: root.to_string(),
            available: self.roots().collect::<Vec<_>>().join(", "),
        })?;

        let mut at = root.to_string();
        for segment in rest {
            let segment = segment.as_ref();
            current = match current {
                Value::Map(map) => map.get(segment).ok_or_else(|| PathError::MissingKey {
                    at: at.clone(),
                    key: segment.to_string(),
                })?,
                Value::Seq(items) => {
                    let index = segment.parse::<usize>().map_err(|_| PathError::NotAContainer {
                        at: at.clone(),
                        segment: segment.to_string(),
                        kind: "sequence",
                    })?;
                    items.get(index).ok_or_else(|| PathError::IndexOutOfRange {
                        at: at.clone(),
                        index,
                        len: items.len(),
                    })?
                }
                other => {
                    return Err(PathError::NotAContainer {
                        at,
                        segment: segment.to_string(),
                        kind: other.type_name(),
                    })
                }
            };
            at.push('.');
            at.push_str(segment);
        }
        Ok(current)
    }

    /// Resolve a dotted path such as `result.items.0.id`
    pub fn resolve_dotted(&self, path: &str) -> Result<&Value, PathError> {
        let segments: Vec<&str> = path.split('.').collect();
        self.resolve(&segments)
    }

    /// Add a `<key><suffix>` sibling for every string leaf that holds a JSON
    /// object or array, unless that key is already taken.
    pub fn expand_json(&mut self, suffix: &str) {
        expand_map(&mut self.roots, suffix);
    }

    /// The whole tree as one mapping value
    pub fn to_value(&self) -> Value {
        Value::Map(self.roots.clone())
    }
}

fn expand_map(map: &mut Map, suffix: &str) {
    let mut parsed = Vec::new();
    for (key, value) in map.iter_mut() {
        expand_value(value, suffix);
        if let Value::String(text) = value {
            if let Some(doc) = json_document(text) {
                parsed.push((format!("{}{}", key, suffix), doc));
            }
        }
    }
    for (key, doc) in parsed {
        map.entry(key).or_insert(doc);
    }
}

fn expand_value(value: &mut Value, suffix: &str) {
    match value {
        Value::Map(map) => expand_map(map, suffix),
        Value::Seq(items) => items.iter_mut().for_each(|item| expand_value(item, suffix)),
        _ => {}
    }
}

fn json_document(text: &str) -> Option<Value> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return None;
    }
    match Value::from_json_str(text) {
        Ok(doc @ (Value::Map(_) | Value::Seq(_))) => Some(doc),
        _ => None,
    }
}
