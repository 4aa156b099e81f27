//! Executors and the step context they run in
//!
//! An executor performs the I/O of one step and hands back a [`Value`]. The
//! dispatcher never looks inside it: it decodes the step descriptor into the
//! executor's configuration type, calls [`Executor::run`], and shapes the
//! returned value into a [`ResultTree`].
//!
//! Optional behaviour is expressed as separate capabilities
//! ([`DefaultAssertions`], [`ZeroValueResult`]) that an executor exposes
//! through accessor methods.

pub mod decode;
pub mod exec;
pub mod readfile;
pub mod registry;
pub mod result;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::value::Value;

pub use registry::ExecutorRegistry;
pub use result::{PathError, ResultTree};

/// Root under which an executor's return value is exposed by default
pub const DEFAULT_ROOT: &str = "result";

/// Errors raised by an executor; any of them ends the step before assertions
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("{0}")]
    Failed(String),

    #[error("Step cancelled")]
    Cancelled,

    #[error("Step timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A configured executor, ready to run one step
#[async_trait]
pub trait Executor: Send + Sync {
    /// Registered name (the step's `type`)
    fn name(&self) -> &str;

    /// Perform the step's I/O
    async fn run(&self, ctx: &StepContext) -> Result<Value, ExecutorError>;

    /// Expose the returned value as a result tree.
    ///
    /// The default puts it under `root`; executors that register further
    /// roots (a browser's `page`, say) override this.
    fn shape_result(&self, result: Value, root: &str) -> ResultTree {
        ResultTree::new().with_root(root, result)
    }

    fn as_default_assertions(&self) -> Option<&dyn DefaultAssertions> {
        None
    }

    fn as_zero_value(&self) -> Option<&dyn ZeroValueResult> {
        None
    }
}

/// Assertions applied when a step lists none
pub trait DefaultAssertions {
    fn default_assertions(&self) -> Vec<String>;
}

/// Shape of an executor's result before it has run, for report tooling
pub trait ZeroValueResult {
    fn zero_value_result(&self) -> Value;
}

/// An executor that is its own configuration: decoded from a step
/// descriptor, then run.
pub trait ExecutorConfig: Executor + Serialize + DeserializeOwned + Default + 'static {
    /// Name steps use to select this executor
    const NAME: &'static str;

    /// Fill executor-specific defaults before suite values are applied
    fn set_defaults(&mut self) {}
}

/// Per-step environment handed to an executor
#[derive(Debug, Clone)]
pub struct StepContext {
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    workdir: Option<PathBuf>,
}

impl Default for StepContext {
    fn default() -> Self {
        Self::new()
    }
}

impl StepContext {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            cancel_tx: Arc::new(tx),
            cancel_rx: rx,
            workdir: None,
        }
    }

    /// Directory relative paths in the step resolve against
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Resolve a path from the step against the working directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.workdir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Handle the outer scheduler keeps to cancel this step
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.cancel_tx.clone(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Resolves once the step has been cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.cancel_rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone: nobody can cancel any more
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Cancels the step it was taken from
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}
