//! `readfile` executor: read a file into the result
//!
//! Read problems are reported in `result.err` rather than as executor
//! errors, so the default assertion `result.err ShouldBeEmpty` is what fails.

use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{DefaultAssertions, Executor, ExecutorConfig, ExecutorError, StepContext, ZeroValueResult};
use crate::value::{Map, Value};

/// Configuration of a `readfile` step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadFile {
    /// Relative paths resolve against the step's working directory
    pub path: PathBuf,
}

/// What a `readfile` step produces
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadFileResult {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contentjson: Option<serde_json::Value>,
    pub err: String,
    pub timeseconds: f64,
    /// Size in bytes, keyed by the path as written in the step
    pub size: Map,
    /// Modification time in Unix seconds, keyed like `size`
    pub modtime: Map,
    /// Permission string such as `-rw-r--r--`, keyed like `size`
    #[serde(rename = "mod")]
    pub mode: Map,
}

/// `ls -l` style rendering of a file's type and permission bits
fn mode_string(metadata: &std::fs::Metadata) -> String {
    #[cfg(unix)]
    let bits = {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode()
    };
    #[cfg(not(unix))]
    let bits: u32 = if metadata.permissions().readonly() { 0o444 } else { 0o666 };

    let mut out = String::with_capacity(10);
    out.push(if metadata.is_dir() { 'd' } else { '-' });
    for (i, c) in "rwxrwxrwx".chars().enumerate() {
        let set = bits & (1 << (8 - i)) != 0;
        out.push(if set { c } else { '-' });
    }
    out
}

impl ReadFile {
    async fn read(&self, path: &Path, result: &mut ReadFileResult) -> Result<(), String> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| format!("Invalid path '{}' or file not found: {}", path.display(), e))?;
        if metadata.is_dir() {
            return Err(format!("'{}' is a directory", path.display()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("Error while reading file '{}': {}", path.display(), e))?;
        result.content = String::from_utf8_lossy(&bytes).into_owned();
        result.contentjson = serde_json::from_str(&result.content).ok();

        let key = self.path.display().to_string();
        let size = i64::try_from(metadata.len()).unwrap_or(i64::MAX);
        result.size.insert(key.clone(), Value::Int(size));
        result.mode.insert(key.clone(), Value::from(mode_string(&metadata)));
        if let Ok(modified) = metadata.modified() {
            if let Ok(since_epoch) = modified.duration_since(UNIX_EPOCH) {
                let secs = i64::try_from(since_epoch.as_secs()).unwrap_or(i64::MAX);
                result.modtime.insert(key, Value::Int(secs));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for ReadFile {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: &StepContext) -> Result<Value, ExecutorError> {
        if self.path.as_os_str().is_empty() {
            return Err(ExecutorError::failed("Invalid path: path is empty"));
        }

        let start = Instant::now();
        let path = ctx.resolve_path(&self.path);
        tracing::debug!(path = %path.display(), "reading file");

        let mut result = ReadFileResult::default();
        if let Err(e) = self.read(&path, &mut result).await {
            tracing::debug!("{}", e);
            result.err = e;
        }
        result.timeseconds = start.elapsed().as_secs_f64();

        Value::from_serialize(&result)
            .map_err(|e| ExecutorError::failed(format!("cannot encode readfile result: {}", e)))
    }

    fn as_default_assertions(&self) -> Option<&dyn DefaultAssertions> {
        Some(self)
    }

    fn as_zero_value(&self) -> Option<&dyn ZeroValueResult> {
        Some(self)
    }
}

impl ExecutorConfig for ReadFile {
    const NAME: &'static str = "readfile";
}

impl DefaultAssertions for ReadFile {
    fn default_assertions(&self) -> Vec<String> {
        vec!["result.err ShouldBeEmpty".to_string()]
    }
}

impl ZeroValueResult for ReadFile {
    fn zero_value_result(&self) -> Value {
        Value::from_serialize(&ReadFileResult::default()).unwrap_or(Value::Null)
    }
}
