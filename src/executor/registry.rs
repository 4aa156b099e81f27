//! Executor registry
//!
//! Maps a step's `type` to a factory that decodes the step into that
//! executor's configuration. Built once before any step runs, then shared
//! read-only.

use std::collections::BTreeMap;
use std::fmt;

use super::decode::decode;
use super::{exec::Exec, readfile::ReadFile, Executor, ExecutorConfig};
use crate::value::{DecodeError, Value};

type Factory =
    Box<dyn Fn(&Value, Option<&Value>) -> Result<Box<dyn Executor>, DecodeError> + Send + Sync>;

/// Executors known by name
#[derive(Default)]
pub struct ExecutorRegistry {
    factories: BTreeMap<&'static str, Factory>,
}

impl ExecutorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `exec` and `readfile` executors
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register::<Exec>();
        registry.register::<ReadFile>();
        registry
    }

    /// Register an executor type under its `NAME`, replacing any previous one
    pub fn register<E: ExecutorConfig>(&mut self) -> &mut Self {
        let factory: Factory = Box::new(|step: &Value, overrides: Option<&Value>| {
            decode::<E>(step, overrides).map(|e| Box::new(e) as Box<dyn Executor>)
        });
        self.factories.insert(E::NAME, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Decode `step` into the executor registered as `name`.
    ///
    /// Returns `None` when no executor has that name.
    pub fn decode(
        &self,
        name: &str,
        step: &Value,
        overrides: Option<&Value>,
    ) -> Option<Result<Box<dyn Executor>, DecodeError>> {
        self.factories
            .get(name)
            .map(|factory| factory(step, overrides))
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = ExecutorRegistry::builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["exec", "readfile"]);
        assert!(registry.contains("exec"));
        assert!(!registry.contains("http"));
    }

    #[test]
    fn test_decode_by_name() {
        let registry = ExecutorRegistry::builtin();
        let step = Value::from_json_str(r#"{"type": "readfile", "path": "a.txt"}"#).unwrap();
        let executor = registry.decode("readfile", &step, None).unwrap().unwrap();
        assert_eq!(executor.name(), "readfile");
        assert!(executor.as_default_assertions().is_some());
        assert!(registry.decode("http", &step, None).is_none());
    }
}
