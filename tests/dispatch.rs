//! End-to-end tests for step dispatch
//!
//! Each test decodes a YAML step, runs it through a built-in executor and
//! checks the resulting report.

use std::time::Duration;

use stepcheck::testing::NoHooks;
use stepcheck::{
    Config, Dispatcher, ExecutorRegistry, Failure, StepContext, StepDescriptor, StepStatus, Value,
};

fn step(yaml: &str) -> StepDescriptor {
    stepcheck::common::logging::init_test();
    StepDescriptor::from_yaml_str(yaml).expect("step should parse")
}

#[cfg(unix)]
#[tokio::test]
async fn test_exec_json_output_is_addressable() {
    let dispatcher = Dispatcher::with_builtins();
    let step = step(
        r#"
type: exec
script: |
  echo '{"count": 3, "names": ["a", "b"], "meta": {"ok": true}}'
assertions:
  - result.code ShouldEqual 0
  - result.systemoutjson.count ShouldBeGreaterThan 2
  - result.systemoutjson.count ShouldEqual 3
  - result.systemoutjson.names ShouldContain b
  - result.systemoutjson.names ShouldHaveLength 2
  - result.systemoutjson.names.1 ShouldEqual b
  - result.systemoutjson.meta.ok ShouldBeTrue
  - result.systemerr ShouldBeEmpty
"#,
    );

    let report = dispatcher.run_step(&step, &StepContext::new()).await;
    assert!(report.passed(), "{:#?}", report.failures);
    assert_eq!(report.executor, "exec");
}

#[cfg(unix)]
#[tokio::test]
async fn test_exec_failures_carry_actual_values() {
    let dispatcher = Dispatcher::with_builtins();
    let step = step(
        r#"
type: exec
script: echo hello
assertions:
  - result.systemout ShouldEqual bye
  - result.systemout ShouldStartWith he
  - result.code ShouldBeBetween 1 5
"#,
    );

    let report = dispatcher.run_step(&step, &StepContext::new()).await;
    assert_eq!(report.status, StepStatus::Failed);
    assert_eq!(report.failures.len(), 2);

    assert_eq!(report.failures[0].expression, "result.systemout ShouldEqual bye");
    assert_eq!(report.failures[0].actual, Value::from("hello"));
    assert!(matches!(report.failures[0].failure, Failure::Assertion(_)));

    // Numeric text compares as numbers
    assert_eq!(report.failures[1].actual, Value::from("0"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_exec_default_assertion_applies() {
    let dispatcher = Dispatcher::with_builtins();

    let report = dispatcher
        .run_step(&step("type: exec\nscript: exit 3"), &StepContext::new())
        .await;

    assert_eq!(report.status, StepStatus::Failed);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].expression, "result.code ShouldEqual 0");
    assert_eq!(report.failures[0].actual, Value::from("3"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_missing_keys_evaluate_as_null() {
    let dispatcher = Dispatcher::with_builtins();
    let step = step(
        r#"
script: echo plain text
assertions:
  - result.systemoutjson ShouldNotExist
  - result.systemout ShouldContainSubstring plain
"#,
    );

    let report = dispatcher.run_step(&step, &StepContext::new()).await;
    assert!(report.passed(), "{:#?}", report.failures);
}

#[cfg(unix)]
#[tokio::test]
async fn test_config_timeout_ends_step() {
    let config = Config::from_toml_str("[executors.exec]\ntimeout = \"200ms\"").unwrap();
    let dispatcher = Dispatcher::new(ExecutorRegistry::builtin(), config);

    let report = dispatcher
        .run_step(&step("type: exec\nscript: sleep 10"), &StepContext::new())
        .await;

    assert_eq!(report.status, StepStatus::Errored);
    assert!(report.error.unwrap().contains("timed out"));
    assert!(report.duration < Duration::from_secs(5));
}

#[cfg(unix)]
#[tokio::test]
async fn test_step_timeout_overrides_config() {
    let config = Config::from_toml_str("[executors.exec]\ntimeout = \"200ms\"").unwrap();
    let dispatcher = Dispatcher::new(ExecutorRegistry::builtin(), config);

    let report = dispatcher
        .run_step(
            &step("type: exec\nscript: sleep 0.5\ntimeout: 10"),
            &StepContext::new(),
        )
        .await;

    assert!(report.passed(), "{:?}", report.error);
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancellation_errors_step() {
    let dispatcher = Dispatcher::with_builtins();
    let ctx = StepContext::new();
    let handle = ctx.cancel_handle();
    let step = step("type: exec\nscript: sleep 30");

    let task = tokio::spawn(async move { dispatcher.run_step(&step, &ctx).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("cancelled step should return promptly")
        .unwrap();
    assert_eq!(report.status, StepStatus::Errored);
    assert_eq!(report.error.as_deref(), Some("Step cancelled"));
    assert!(report.result.is_none());
}

#[tokio::test]
async fn test_readfile_json_content() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("data.json"),
        r#"{"name": "stepcheck", "tags": ["x", "y"], "version": 2}"#,
    )
    .unwrap();

    let dispatcher = Dispatcher::with_builtins();
    let ctx = StepContext::new().with_workdir(dir.path());
    let step = step(
        r#"
type: readfile
path: data.json
assertions:
  - result.err ShouldBeEmpty
  - result.contentjson.name ShouldEqual stepcheck
  - result.contentjson.tags ShouldContain y
  - result.contentjson.version ShouldBeLessThanOrEqualTo 2
  - 'result.contentjson ShouldJSONEqual {\"version\":2,\"tags\":[\"x\",\"y\"],\"name\":\"stepcheck\"}'
"#,
    );

    let report = dispatcher.run_step(&step, &ctx).await;
    assert!(report.passed(), "{:#?}", report.failures);

    let tree = report.result.unwrap();
    let size = tree.resolve(&["result", "size", "data.json"]).unwrap();
    assert!(matches!(size, Value::Int(n) if *n > 0));
}

#[tokio::test]
async fn test_readfile_missing_file_fails_default_assertion() {
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = Dispatcher::with_builtins();
    let ctx = StepContext::new().with_workdir(dir.path());

    let report = dispatcher
        .run_step(&step("type: readfile\npath: absent.txt"), &ctx)
        .await;

    assert_eq!(report.status, StepStatus::Failed);
    assert_eq!(report.failures[0].expression, "result.err ShouldBeEmpty");
    assert!(report.failures[0]
        .actual
        .as_str()
        .is_some_and(|err| err.contains("absent.txt")));
}

#[tokio::test]
async fn test_unknown_executor_errors() {
    let dispatcher = Dispatcher::with_builtins();
    let report = dispatcher
        .run_step(&step("type: http\nurl: http://localhost"), &StepContext::new())
        .await;

    assert_eq!(report.status, StepStatus::Errored);
    let error = report.error.unwrap();
    assert!(error.contains("http"));
    assert!(error.contains("exec, readfile"));
}

#[tokio::test]
async fn test_malformed_assertion_is_argument_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "abc").unwrap();

    let dispatcher = Dispatcher::with_builtins();
    let ctx = StepContext::new().with_workdir(dir.path());
    let step = step(
        r#"
type: readfile
path: a.txt
assertions:
  - result.content ShouldEqual
  - result.content ShouldEqual abc
  - result.content ShouldNotEqual
"#,
    );

    let report = dispatcher.run_step(&step, &ctx).await;
    assert_eq!(report.status, StepStatus::Failed);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.failure.is_argument_error()));
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_steps_continues_after_failure() {
    let dispatcher = Dispatcher::with_builtins();
    let steps = StepDescriptor::list_from_yaml_str(
        r#"
- type: exec
  script: exit 1
- type: exec
  script: echo second
  assertions:
    - result.systemout ShouldEqual second
"#,
    )
    .unwrap();

    let reports = dispatcher
        .run_steps(&steps, &StepContext::new(), &NoHooks)
        .await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].status, StepStatus::Failed);
    assert!(reports[1].passed());
}
