//! Step descriptor types
//!
//! A step is a free-form mapping. Two keys belong to the dispatcher: `type`
//! names the executor and `assertions` lists the expressions to evaluate.
//! Everything else is decoded into the executor's configuration.

use serde::Deserialize;

use crate::common::{Error, Result};
use crate::value::{from_value, Value};

/// The keys of a step the dispatcher itself reads
#[derive(Deserialize, Debug, Default)]
struct StepHeader {
    /// Executor name
    #[serde(rename = "type")]
    kind: Option<String>,
    /// Assertion expressions, in evaluation order
    assertions: Option<Vec<String>>,
}

/// One step of a suite, as written in the suite file
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    fields: Value,
    header_kind: Option<String>,
    header_assertions: Option<Vec<String>>,
}

impl StepDescriptor {
    /// Build a descriptor from an already parsed mapping
    pub fn from_value(fields: Value) -> Result<Self> {
        if fields.as_map().is_none() {
            return Err(Error::Config(format!(
                "A step must be a mapping, got {}",
                fields.type_name()
            )));
        }

        let header: StepHeader = from_value(&fields)
            .map_err(|e| Error::Config(format!("Invalid step: {}", e)))?;

        Ok(Self {
            fields,
            header_kind: header.kind.filter(|kind| !kind.is_empty()),
            header_assertions: header.assertions,
        })
    }

    /// Parse a single step from YAML
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
        Self::from_value(Value::from(yaml))
    }

    /// Parse a YAML sequence of steps
    pub fn list_from_yaml_str(content: &str) -> Result<Vec<Self>> {
        let yaml: Vec<serde_yaml::Value> = serde_yaml::from_str(content)?;
        yaml.into_iter()
            .map(|step| Self::from_value(Value::from(step)))
            .collect()
    }

    /// Executor named by the step's `type`, if any
    pub fn executor(&self) -> Option<&str> {
        self.header_kind.as_deref()
    }

    /// The step's assertion list; `None` when the step has none
    pub fn assertions(&self) -> Option<&[String]> {
        self.header_assertions.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The whole mapping, as handed to executor decoding
    pub fn as_value(&self) -> &Value {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exec_step() {
        let step = StepDescriptor::from_yaml_str(
            r#"
type: exec
script: echo hello
assertions:
  - result.code ShouldEqual 0
  - result.systemout ShouldContainSubstring hello
"#,
        )
        .unwrap();

        assert_eq!(step.executor(), Some("exec"));
        assert_eq!(step.assertions().map(|a| a.len()), Some(2));
        assert_eq!(step.get("script"), Some(&Value::from("echo hello")));
    }

    #[test]
    fn test_step_without_type_or_assertions() {
        let step = StepDescriptor::from_yaml_str("script: 'true'").unwrap();
        assert_eq!(step.executor(), None);
        assert!(step.assertions().is_none());
    }

    #[test]
    fn test_empty_type_is_absent() {
        let step = StepDescriptor::from_yaml_str("type: ''\nscript: 'true'").unwrap();
        assert_eq!(step.executor(), None);
    }

    #[test]
    fn test_non_mapping_rejected() {
        let err = StepDescriptor::from_yaml_str("- a\n- b").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = StepDescriptor::from_yaml_str("type: [exec").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_list_from_yaml() {
        let steps = StepDescriptor::list_from_yaml_str(
            r#"
- type: exec
  script: 'true'
- type: readfile
  path: /etc/hostname
"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].executor(), Some("readfile"));
    }
}
