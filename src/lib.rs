//! stepcheck - step dispatch and assertion engine for integration-test suites
//!
//! A suite step names an executor (`exec`, `readfile`, ...) and a list of
//! assertion expressions such as `result.code ShouldEqual 0`. This library
//! decodes the step, runs the executor, exposes its output as a result tree
//! and evaluates every expression against it.

pub mod assertions;
pub mod common;
pub mod executor;
pub mod testing;
pub mod value;

// Re-export commonly used types
pub use assertions::{AssertionExpression, Failure};
pub use common::{Config, Error, Result};
pub use executor::{Executor, ExecutorRegistry, ResultTree, StepContext};
pub use testing::{Dispatcher, StepDescriptor, StepReport, StepStatus};
pub use value::Value;
