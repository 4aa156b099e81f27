//! `exec` executor: run a shell script
//!
//! The script is written to a scratch file and run with `/bin/sh`, or with
//! the interpreter named on its `#!` line. Standard output and error are
//! captured whole; the exit code is reported as text, as suites compare it
//! with `result.code ShouldEqual 0`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::decode::duration;
use super::{DefaultAssertions, Executor, ExecutorConfig, ExecutorError, StepContext, ZeroValueResult};
use crate::value::Value;

const DEFAULT_SHELL: &str = "/bin/sh";

/// Exit code reported when the interpreter cannot be started
const SPAWN_FAILURE_CODE: &str = "127";

/// Configuration of an `exec` step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Exec {
    pub script: String,
    /// Zero means no limit
    #[serde(with = "duration")]
    pub timeout: Duration,
    /// Overrides the step context's working directory
    pub workdir: Option<PathBuf>,
}

/// What an `exec` step produces
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecResult {
    pub systemout: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemoutjson: Option<serde_json::Value>,
    pub systemerr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemerrjson: Option<serde_json::Value>,
    pub err: String,
    pub code: String,
    pub timeseconds: f64,
}

impl ExecResult {
    fn into_value(self) -> Result<Value, ExecutorError> {
        Value::from_serialize(&self)
            .map_err(|e| ExecutorError::failed(format!("cannot encode exec result: {}", e)))
    }
}

impl Exec {
    /// Program and leading arguments that run the script
    fn interpreter(&self) -> (String, Vec<String>) {
        if let Some(line) = self.script.strip_prefix("#!") {
            let line = line.lines().next().unwrap_or_default();
            let mut words = line.split_whitespace().map(str::to_string);
            if let Some(program) = words.next() {
                return (program, words.collect());
            }
        }
        (DEFAULT_SHELL.to_string(), Vec::new())
    }

    fn working_dir(&self, ctx: &StepContext) -> Option<PathBuf> {
        match &self.workdir {
            Some(dir) => Some(ctx.resolve_path(dir)),
            None => ctx.workdir().map(Path::to_path_buf),
        }
    }

    async fn run_script(
        &self,
        ctx: &StepContext,
        script_path: &Path,
    ) -> Result<ExecResult, ExecutorError> {
        let (program, args) = self.interpreter();
        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .arg(script_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = self.working_dir(ctx) {
            cmd.current_dir(dir);
        }

        tracing::debug!(program = %program, script = %script_path.display(), "spawning script");
        let start = Instant::now();
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("failed to start {}: {}", program, e);
                return Ok(ExecResult {
                    err: e.to_string(),
                    code: SPAWN_FAILURE_CODE.to_string(),
                    timeseconds: start.elapsed().as_secs_f64(),
                    ..Default::default()
                });
            }
        };

        let timeout = self.timeout;
        let wait = async move {
            if timeout.is_zero() {
                return child.wait_with_output().await.map_err(ExecutorError::from);
            }
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(output) => output.map_err(ExecutorError::from),
                Err(_) => Err(ExecutorError::Timeout(timeout)),
            }
        };

        // Dropping the wait future kills the child
        let output = tokio::select! {
            output = wait => output?,
            _ = ctx.cancelled() => return Err(ExecutorError::Cancelled),
        };

        let systemout = capture(&output.stdout);
        let systemerr = capture(&output.stderr);
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-1".to_string());
        tracing::debug!(code = %code, "script finished");

        Ok(ExecResult {
            systemoutjson: serde_json::from_str(&systemout).ok(),
            systemerrjson: serde_json::from_str(&systemerr).ok(),
            systemout,
            systemerr,
            err: String::new(),
            code,
            timeseconds: start.elapsed().as_secs_f64(),
        })
    }
}

fn capture(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\n').to_string()
}

/// Write the script to a scratch file that is removed when the handle drops
async fn write_script(script: &str) -> Result<NamedTempFile, ExecutorError> {
    let file = tempfile::Builder::new()
        .prefix("stepcheck-")
        .tempfile()
        .map_err(|e| ExecutorError::failed(format!("cannot create script file: {}", e)))?;
    tokio::fs::write(file.path(), script).await.map_err(|e| {
        ExecutorError::failed(format!("cannot write script {}: {}", file.path().display(), e))
    })?;
    Ok(file)
}

#[async_trait]
impl Executor for Exec {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: &StepContext) -> Result<Value, ExecutorError> {
        if self.script.trim().is_empty() {
            return Err(ExecutorError::failed("Invalid command: script is empty"));
        }

        // Held across the run: dropping this future also removes the file
        let script = write_script(&self.script).await?;
        let result = self.run_script(ctx, script.path()).await;
        if let Err(e) = script.close() {
            tracing::debug!("cannot remove script file: {}", e);
        }
        result?.into_value()
    }

    fn as_default_assertions(&self) -> Option<&dyn DefaultAssertions> {
        Some(self)
    }

    fn as_zero_value(&self) -> Option<&dyn ZeroValueResult> {
        Some(self)
    }
}

impl ExecutorConfig for Exec {
    const NAME: &'static str = "exec";
}

impl DefaultAssertions for Exec {
    fn default_assertions(&self) -> Vec<String> {
        vec!["result.code ShouldEqual 0".to_string()]
    }
}

impl ZeroValueResult for Exec {
    fn zero_value_result(&self) -> Value {
        ExecResult::default().into_value().unwrap_or(Value::Null)
    }
}
