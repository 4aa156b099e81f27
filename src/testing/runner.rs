//! Step dispatcher
//!
//! Drives one step through `Pending → Decoding → Running → Asserting` and
//! ends in `Passed`, `Failed` or `Errored`. The dispatcher holds only
//! immutable state, so one instance can serve any number of concurrent
//! steps.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;

use super::config::StepDescriptor;
use crate::assertions::{AssertionExpression, Failure};
use crate::common::{Config, Error, Result};
use crate::executor::{Executor, ExecutorError, ExecutorRegistry, ResultTree, StepContext};
use crate::value::Value;

/// Where a step is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Decoding,
    Running,
    Asserting,
    Passed,
    Failed,
    Errored,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Errored)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Decoding => "decoding",
            Self::Running => "running",
            Self::Asserting => "asserting",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// One assertion that did not succeed
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionReport {
    /// The expression as written in the step
    pub expression: String,
    /// Value the path resolved to (null when it could not be resolved)
    pub actual: Value,
    pub failure: Failure,
}

/// Outcome of one step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub executor: String,
    pub status: StepStatus,
    /// Failed assertions, in declaration order
    pub failures: Vec<AssertionReport>,
    /// Decode or executor error that ended the step early
    pub error: Option<String>,
    pub result: Option<ResultTree>,
    pub duration: Duration,
}

impl StepReport {
    fn new(executor: impl Into<String>) -> Self {
        Self {
            executor: executor.into(),
            status: StepStatus::Pending,
            failures: Vec::new(),
            error: None,
            result: None,
            duration: Duration::ZERO,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == StepStatus::Passed
    }
}

/// Callbacks an outer scheduler can hang on a step
///
/// A scheduler that retries re-drives the step by calling
/// [`Dispatcher::run_step`] again.
pub trait StepHooks: Send + Sync {
    fn before_run(&self, _step: &StepDescriptor) {}

    fn on_status(&self, _step: &StepDescriptor, _status: StepStatus) {}

    fn after_run(&self, _report: &StepReport) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl StepHooks for NoHooks {}

/// Decodes, runs and asserts steps
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ExecutorRegistry>,
    config: Arc<Config>,
}

impl Dispatcher {
    pub fn new(registry: ExecutorRegistry, config: Config) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }

    /// Dispatcher with the built-in executors and default configuration
    pub fn with_builtins() -> Self {
        Self::new(ExecutorRegistry::builtin(), Config::default())
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the executor a step will use
    pub fn executor_name<'a>(&'a self, step: &'a StepDescriptor) -> &'a str {
        step.executor()
            .unwrap_or(&self.config.dispatcher.default_executor)
    }

    /// Decode a step into its executor, applying configured defaults
    pub fn build(&self, step: &StepDescriptor) -> Result<Box<dyn Executor>> {
        let name = self.executor_name(step);
        let overrides = self.config.executor_defaults(name);

        match self.registry.decode(name, step.as_value(), overrides.as_ref()) {
            None => Err(Error::unknown_executor(
                name,
                &self.registry.names().collect::<Vec<_>>(),
            )),
            Some(Err(e)) => Err(Error::decode(name, &e)),
            Some(Ok(executor)) => Ok(executor),
        }
    }

    pub async fn run_step(&self, step: &StepDescriptor, ctx: &StepContext) -> StepReport {
        self.run_step_with_hooks(step, ctx, &NoHooks).await
    }

    pub async fn run_step_with_hooks(
        &self,
        step: &StepDescriptor,
        ctx: &StepContext,
        hooks: &dyn StepHooks,
    ) -> StepReport {
        self.run_indexed(0, step, ctx, hooks).await
    }

    /// Run steps one after another, sharing `ctx`
    ///
    /// A failed or errored step does not stop the following ones; a
    /// cancelled context makes every remaining step end as errored.
    pub async fn run_steps(
        &self,
        steps: &[StepDescriptor],
        ctx: &StepContext,
        hooks: &dyn StepHooks,
    ) -> Vec<StepReport> {
        let mut reports = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            reports.push(self.run_indexed(index, step, ctx, hooks).await);
        }
        reports
    }

    async fn run_indexed(
        &self,
        index: usize,
        step: &StepDescriptor,
        ctx: &StepContext,
        hooks: &dyn StepHooks,
    ) -> StepReport {
        let executor = self.executor_name(step);
        let span = tracing::info_span!("step", executor, index);

        async move {
            let start = Instant::now();
            let mut report = StepReport::new(executor);
            hooks.before_run(step);

            self.drive(step, ctx, hooks, &mut report).await;

            report.duration = start.elapsed();
            match report.status {
                StepStatus::Passed => tracing::info!(
                    duration_ms = report.duration.as_millis() as u64,
                    "Step passed"
                ),
                StepStatus::Failed => tracing::info!(
                    failures = report.failures.len(),
                    "Step failed"
                ),
                _ => tracing::info!(
                    error = report.error.as_deref().unwrap_or(""),
                    "Step errored"
                ),
            }
            hooks.after_run(&report);
            report
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        step: &StepDescriptor,
        ctx: &StepContext,
        hooks: &dyn StepHooks,
        report: &mut StepReport,
    ) {
        let transition = |report: &mut StepReport, status: StepStatus| {
            report.status = status;
            hooks.on_status(step, status);
        };

        transition(report, StepStatus::Decoding);
        let executor = match self.build(step) {
            Ok(executor) => executor,
            Err(e) => {
                tracing::warn!(error = %e, "Step could not be decoded");
                report.error = Some(e.to_string());
                transition(report, StepStatus::Errored);
                return;
            }
        };
        tracing::debug!("Step decoded");

        let expressions: Vec<String> = match step.assertions() {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => executor
                .as_default_assertions()
                .map(|defaults| defaults.default_assertions())
                .unwrap_or_default(),
        };

        transition(report, StepStatus::Running);
        let value = match run_executor(executor.as_ref(), ctx).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Executor failed");
                report.error = Some(e.to_string());
                transition(report, StepStatus::Errored);
                return;
            }
        };
        tracing::debug!(result = %value, "Executor returned");

        transition(report, StepStatus::Asserting);
        let dispatcher = &self.config.dispatcher;
        let mut tree = executor.shape_result(value, &dispatcher.default_root);
        tree.expand_json(&dispatcher.json_suffix);

        report.failures = self.evaluate(&tree, &expressions);
        report.result = Some(tree);

        let status = if report.failures.is_empty() {
            StepStatus::Passed
        } else {
            StepStatus::Failed
        };
        transition(report, status);
    }

    /// Evaluate expressions against a result tree, in order, collecting
    /// every failure
    pub fn evaluate<S: AsRef<str>>(
        &self,
        tree: &ResultTree,
        expressions: &[S],
    ) -> Vec<AssertionReport> {
        expressions
            .iter()
            .filter_map(|line| {
                let line = line.as_ref();
                let (actual, outcome) = evaluate_one(tree, line);
                match outcome {
                    Ok(()) => {
                        tracing::debug!(expression = line, "Assertion passed");
                        None
                    }
                    Err(failure) => {
                        tracing::debug!(expression = line, %failure, "Assertion failed");
                        Some(AssertionReport {
                            expression: line.to_string(),
                            actual,
                            failure,
                        })
                    }
                }
            })
            .collect()
    }
}

/// Run an executor, giving up as soon as the step is cancelled
async fn run_executor(
    executor: &dyn Executor,
    ctx: &StepContext,
) -> std::result::Result<Value, ExecutorError> {
    if ctx.is_cancelled() {
        return Err(ExecutorError::Cancelled);
    }

    tracing::debug!(executor = executor.name(), "Running executor");
    tokio::select! {
        result = executor.run(ctx) => result,
        _ = ctx.cancelled() => Err(ExecutorError::Cancelled),
    }
}

fn evaluate_one(tree: &ResultTree, line: &str) -> (Value, std::result::Result<(), Failure>) {
    let expression = match AssertionExpression::parse(line) {
        Ok(expression) => expression,
        Err(failure) => return (Value::Null, Err(failure)),
    };

    let actual = match tree.resolve(&expression.path) {
        Ok(value) => value.clone(),
        // Absent keys are asserted on as null
        Err(e) if e.is_missing() => Value::Null,
        Err(e) => return (Value::Null, Err(Failure::argument(e.to_string()))),
    };

    let outcome = expression.evaluate(&actual);
    (actual, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn tree(result: &str) -> ResultTree {
        ResultTree::new().with_root("result", Value::from_json_str(result).unwrap())
    }

    #[test]
    fn test_evaluate_collects_all_failures_in_order() {
        let dispatcher = Dispatcher::with_builtins();
        let tree = tree(r#"{"code": "0", "items": [1, 2, 3]}"#);

        let failures = dispatcher.evaluate(
            &tree,
            &[
                "result.code ShouldEqual 1",
                "result.items ShouldHaveLength 3",
                "result.items.0 ShouldEqual 5",
            ],
        );

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].expression, "result.code ShouldEqual 1");
        assert_eq!(failures[0].actual, Value::from("0"));
        assert!(matches!(failures[0].failure, Failure::Assertion(_)));
        assert_eq!(failures[1].actual, Value::Int(1));
    }

    #[test]
    fn test_evaluate_missing_key_is_null() {
        let dispatcher = Dispatcher::with_builtins();
        let tree = tree(r#"{"code": "0"}"#);

        assert!(dispatcher
            .evaluate(&tree, &["result.nothere ShouldNotExist"])
            .is_empty());

        let failures = dispatcher.evaluate(&tree, &["result.nothere ShouldNotBeNil"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].actual, Value::Null);
        assert!(matches!(failures[0].failure, Failure::Assertion(_)));
    }

    #[test]
    fn test_evaluate_unknown_root_is_argument_error() {
        let dispatcher = Dispatcher::with_builtins();
        let failures = dispatcher.evaluate(&tree("{}"), &["page.title ShouldBeEmpty"]);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].failure.is_argument_error());
    }

    #[test]
    fn test_evaluate_unknown_assertion() {
        let dispatcher = Dispatcher::with_builtins();
        let failures = dispatcher.evaluate(&tree(r#"{"a": 1}"#), &["result.a ShouldBeFancy"]);
        assert_eq!(
            failures[0].failure,
            Failure::argument("unknown assertion ShouldBeFancy")
        );
    }

    #[test]
    fn test_evaluate_malformed_expression() {
        let dispatcher = Dispatcher::with_builtins();
        let failures = dispatcher.evaluate(&tree("{}"), &["result.code"]);
        assert!(failures[0].failure.is_argument_error());
        assert_eq!(failures[0].actual, Value::Null);
    }

    #[test]
    fn test_unknown_executor_errors() {
        let dispatcher = Dispatcher::with_builtins();
        let step = StepDescriptor::from_yaml_str("type: http\nurl: http://localhost").unwrap();
        let err = dispatcher.build(&step).err().unwrap();
        assert!(matches!(err, Error::UnknownExecutor { .. }));
    }

    #[test]
    fn test_default_executor_from_config() {
        let config = Config::from_toml_str("[dispatcher]\ndefault_executor = \"readfile\"").unwrap();
        let dispatcher = Dispatcher::new(ExecutorRegistry::builtin(), config);
        let step = StepDescriptor::from_yaml_str("path: /tmp/x").unwrap();
        assert_eq!(dispatcher.executor_name(&step), "readfile");
        assert_eq!(dispatcher.build(&step).unwrap().name(), "readfile");
    }

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<StepStatus>>,
    }

    impl StepHooks for Recorder {
        fn on_status(&self, _step: &StepDescriptor, status: StepStatus) {
            self.statuses.lock().unwrap().push(status);
        }
    }

    #[tokio::test]
    async fn test_decode_error_short_circuits() {
        let dispatcher = Dispatcher::with_builtins();
        let step = StepDescriptor::from_yaml_str("type: nope").unwrap();
        let hooks = Recorder::default();

        let report = dispatcher
            .run_step_with_hooks(&step, &StepContext::new(), &hooks)
            .await;

        assert_eq!(report.status, StepStatus::Errored);
        assert!(report.result.is_none());
        assert!(report.error.unwrap().contains("nope"));
        assert_eq!(
            *hooks.statuses.lock().unwrap(),
            vec![StepStatus::Decoding, StepStatus::Errored]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_status_sequence_for_passing_step() {
        let dispatcher = Dispatcher::with_builtins();
        let step = StepDescriptor::from_yaml_str("type: exec\nscript: 'true'").unwrap();
        let hooks = Recorder::default();

        let report = dispatcher
            .run_step_with_hooks(&step, &StepContext::new(), &hooks)
            .await;

        assert!(report.passed(), "{:?}", report);
        assert_eq!(
            *hooks.statuses.lock().unwrap(),
            vec![
                StepStatus::Decoding,
                StepStatus::Running,
                StepStatus::Asserting,
                StepStatus::Passed
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_run() {
        let dispatcher = Dispatcher::with_builtins();
        let step = StepDescriptor::from_yaml_str("type: exec\nscript: 'sleep 5'").unwrap();
        let ctx = StepContext::new();
        ctx.cancel_handle().cancel();

        let report = dispatcher.run_step(&step, &ctx).await;
        assert_eq!(report.status, StepStatus::Errored);
        assert_eq!(report.error.as_deref(), Some("Step cancelled"));
    }
}
