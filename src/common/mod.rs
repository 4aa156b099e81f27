//! Common utilities shared by the assertion engine and the dispatcher

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::Config;
pub use error::{Error, Result};
