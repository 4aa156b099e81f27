//! Step dispatching
//!
//! Turns a step descriptor into an executor run and a list of assertion
//! outcomes. Suites, scheduling and reporting belong to the embedding
//! runner.

mod config;
mod runner;

pub use config::StepDescriptor;
pub use runner::{AssertionReport, Dispatcher, NoHooks, StepHooks, StepReport, StepStatus};
