//! Configuration file handling

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};
use crate::executor::DEFAULT_ROOT;
use crate::value::Value;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Dispatcher settings
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Per-executor defaults, keyed by executor name. Applied after the
    /// executor's own defaults and before the step's values.
    #[serde(default)]
    pub executors: HashMap<String, toml::Table>,
}

/// Dispatcher settings
#[derive(Debug, Deserialize)]
pub struct DispatcherConfig {
    /// Root the executor's return value is exposed under
    #[serde(default = "default_root")]
    pub default_root: String,

    /// Suffix of the sibling key holding a string leaf's parsed JSON
    #[serde(default = "default_json_suffix")]
    pub json_suffix: String,

    /// Executor used when a step has no `type`
    #[serde(default = "default_executor")]
    pub default_executor: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_root: default_root(),
            json_suffix: default_json_suffix(),
            default_executor: default_executor(),
        }
    }
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_json_suffix() -> String {
    "json".to_string()
}

fn default_executor() -> String {
    "exec".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Configured defaults for an executor, as a value to merge
    pub fn executor_defaults(&self, name: &str) -> Option<Value> {
        self.executors
            .get(name)
            .map(|table| Value::from(toml::Value::Table(table.clone())))
    }
}
