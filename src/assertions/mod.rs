//! Assertion predicates
//!
//! Every predicate has the same shape, `fn(&Value, &[Value]) -> Outcome`.
//! The first argument is the value found in the result tree, the slice
//! holds the literal arguments written after the predicate name.
//!
//! Two kinds of failure are kept apart. [`Failure::Argument`] means the
//! assertion itself is malformed (wrong arity, operands that cannot be
//! compared, a date that does not parse); [`Failure::Assertion`] means the
//! property was evaluated and did not hold. Negated predicates only invert
//! the second kind.

pub mod collections;
pub mod equality;
pub mod expression;
pub mod json;
pub mod nullity;
pub mod ordering;
pub mod registry;
pub mod strings;
pub mod time;

use thiserror::Error;

use crate::value::{CoercionError, Value};

pub use expression::AssertionExpression;
pub use registry::{all_assertions, get_assertion, lookup_assertion, Arity, AssertionInfo};

/// Why an assertion did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The assertion was invoked with the wrong arity or with values that
    /// cannot be compared
    #[error("{0}")]
    Argument(String),

    /// The property did not hold
    #[error("{0}")]
    Assertion(String),
}

impl Failure {
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    pub fn is_argument_error(&self) -> bool {
        matches!(self, Failure::Argument(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Failure::Argument(m) | Failure::Assertion(m) => m,
        }
    }
}

impl From<CoercionError> for Failure {
    fn from(e: CoercionError) -> Self {
        Failure::Argument(e.to_string())
    }
}

/// Result of evaluating one predicate
pub type Outcome = std::result::Result<(), Failure>;

/// Common signature of every predicate
pub type Predicate = fn(&Value, &[Value]) -> Outcome;

/// Require exactly `n` comparison values
pub(crate) fn need(n: usize, expected: &[Value]) -> Outcome {
    if expected.len() == n {
        return Ok(());
    }
    Err(arity_failure("exactly", n, expected.len()))
}

/// Require at least `n` comparison values
pub(crate) fn at_least(n: usize, expected: &[Value]) -> Outcome {
    if expected.len() >= n {
        return Ok(());
    }
    Err(arity_failure("at least", n, expected.len()))
}

pub(crate) fn arity_failure(bound: &str, n: usize, provided: usize) -> Failure {
    let plural = if n == 1 { "" } else { "s" };
    Failure::Argument(format!(
        "This assertion requires {} {} comparison value{} (you provided {}).",
        bound, n, plural, provided
    ))
}

/// Invert an outcome, leaving argument errors untouched.
///
/// `message` builds the diagnostic for the case where the inner predicate
/// held and the negation therefore fails.
pub(crate) fn negate(inner: Outcome, message: impl FnOnce() -> String) -> Outcome {
    match inner {
        Ok(()) => Err(Failure::Assertion(message())),
        Err(Failure::Assertion(_)) => Ok(()),
        Err(e @ Failure::Argument(_)) => Err(e),
    }
}

/// Check a boolean property, producing an assertion failure when it is false
pub(crate) fn check(holds: bool, message: impl FnOnce() -> String) -> Outcome {
    if holds {
        Ok(())
    } else {
        Err(Failure::Assertion(message()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_need_messages() {
        assert_eq!(need(1, &[Value::Null]), Ok(()));
        assert_eq!(
            need(1, &[]),
            Err(Failure::argument(
                "This assertion requires exactly 1 comparison value (you provided 0)."
            ))
        );
        assert_eq!(
            need(2, &[Value::Null]),
            Err(Failure::argument(
                "This assertion requires exactly 2 comparison values (you provided 1)."
            ))
        );
        assert_eq!(
            at_least(1, &[]),
            Err(Failure::argument(
                "This assertion requires at least 1 comparison value (you provided 0)."
            ))
        );
    }

    #[test]
    fn test_negate_preserves_argument_errors() {
        let msg = || "held".to_string();
        assert_eq!(negate(Ok(()), msg), Err(Failure::assertion("held")));
        assert_eq!(negate(Err(Failure::assertion("no")), msg), Ok(()));
        assert_eq!(
            negate(Err(Failure::argument("bad")), msg),
            Err(Failure::argument("bad"))
        );
    }

    #[test]
    fn test_coercion_error_is_argument_error() {
        let failure = Failure::from(CoercionError::InvalidDate("x".into()));
        assert!(failure.is_argument_error());
        assert_eq!(failure.message(), "invalid date provided: \"x\"");
    }
}
