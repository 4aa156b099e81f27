//! Assertion registry
//!
//! Every predicate a suite can name, with the arity it checks. The table is
//! a constant; lookups never lock.

use std::fmt;

use super::{collections, equality, json, nullity, ordering, strings, time};
use super::{arity_failure, Failure, Outcome, Predicate};
use crate::value::Value;

/// Number of comparison values a predicate accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }

    /// Argument error naming the expected count when `count` is rejected
    pub fn check(&self, count: usize) -> Outcome {
        if self.accepts(count) {
            return Ok(());
        }
        Err(match self {
            Arity::Exactly(n) => arity_failure("exactly", *n, count),
            Arity::AtLeast(n) => arity_failure("at least", *n, count),
        })
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "{}+", n),
        }
    }
}

/// A named predicate
#[derive(Clone, Copy)]
pub struct AssertionInfo {
    /// Name used in assertion expressions (e.g. "ShouldEqual")
    pub name: &'static str,
    pub predicate: Predicate,
    pub arity: Arity,
}

impl AssertionInfo {
    pub fn call(&self, actual: &Value, expected: &[Value]) -> Outcome {
        (self.predicate)(actual, expected)
    }
}

impl fmt::Debug for AssertionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionInfo")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

const fn entry(name: &'static str, arity: Arity, predicate: Predicate) -> AssertionInfo {
    AssertionInfo {
        name,
        predicate,
        arity,
    }
}

use Arity::{AtLeast, Exactly};

/// All available assertions
static ASSERTIONS: &[AssertionInfo] = &[
    // equality
    entry("ShouldEqual", Exactly(1), equality::should_equal),
    entry("ShouldNotEqual", Exactly(1), equality::should_not_equal),
    entry("ShouldAlmostEqual", Exactly(2), equality::should_almost_equal),
    entry("ShouldNotAlmostEqual", Exactly(2), equality::should_not_almost_equal),
    entry("ShouldBeTrue", Exactly(0), equality::should_be_true),
    entry("ShouldBeFalse", Exactly(0), equality::should_be_false),
    // nullity
    entry("ShouldBeNil", Exactly(0), nullity::should_be_nil),
    entry("ShouldNotBeNil", Exactly(0), nullity::should_not_be_nil),
    entry("ShouldBeZeroValue", Exactly(0), nullity::should_be_zero_value),
    entry("ShouldNotExist", Exactly(0), nullity::should_not_exist),
    // ordering
    entry("ShouldBeGreaterThan", Exactly(1), ordering::should_be_greater_than),
    entry(
        "ShouldBeGreaterThanOrEqualTo",
        Exactly(1),
        ordering::should_be_greater_than_or_equal_to,
    ),
    entry("ShouldBeLessThan", Exactly(1), ordering::should_be_less_than),
    entry(
        "ShouldBeLessThanOrEqualTo",
        Exactly(1),
        ordering::should_be_less_than_or_equal_to,
    ),
    entry("ShouldBeBetween", Exactly(2), ordering::should_be_between),
    entry("ShouldNotBeBetween", Exactly(2), ordering::should_not_be_between),
    entry("ShouldBeBetweenOrEqual", Exactly(2), ordering::should_be_between_or_equal),
    entry(
        "ShouldNotBeBetweenOrEqual",
        Exactly(2),
        ordering::should_not_be_between_or_equal,
    ),
    // collections
    entry("ShouldContain", Exactly(1), collections::should_contain),
    entry("ShouldNotContain", Exactly(1), collections::should_not_contain),
    entry("ShouldContainKey", Exactly(1), collections::should_contain_key),
    entry("ShouldNotContainKey", Exactly(1), collections::should_not_contain_key),
    entry("ShouldBeIn", AtLeast(1), collections::should_be_in),
    entry("ShouldNotBeIn", AtLeast(1), collections::should_not_be_in),
    entry("ShouldBeEmpty", Exactly(0), collections::should_be_empty),
    entry("ShouldNotBeEmpty", Exactly(0), collections::should_not_be_empty),
    entry("ShouldHaveLength", Exactly(1), collections::should_have_length),
    entry("ShouldBeArray", Exactly(0), collections::should_be_array),
    entry("ShouldBeMap", Exactly(0), collections::should_be_map),
    // strings
    entry("ShouldStartWith", Exactly(1), strings::should_start_with),
    entry("ShouldNotStartWith", Exactly(1), strings::should_not_start_with),
    entry("ShouldEndWith", Exactly(1), strings::should_end_with),
    entry("ShouldNotEndWith", Exactly(1), strings::should_not_end_with),
    entry("ShouldContainSubstring", AtLeast(1), strings::should_contain_substring),
    entry(
        "ShouldNotContainSubstring",
        AtLeast(1),
        strings::should_not_contain_substring,
    ),
    entry("ShouldBeBlank", Exactly(0), strings::should_be_blank),
    entry("ShouldNotBeBlank", Exactly(0), strings::should_not_be_blank),
    entry("ShouldEqualTrimSpace", Exactly(1), strings::should_equal_trim_space),
    entry("ShouldMatchRegex", Exactly(1), strings::should_match_regex),
    // time
    entry("ShouldHappenBefore", Exactly(1), time::should_happen_before),
    entry("ShouldHappenOnOrBefore", Exactly(1), time::should_happen_on_or_before),
    entry("ShouldHappenAfter", Exactly(1), time::should_happen_after),
    entry("ShouldHappenOnOrAfter", Exactly(1), time::should_happen_on_or_after),
    entry("ShouldHappenBetween", Exactly(2), time::should_happen_between),
    entry("ShouldTimeEqual", Exactly(1), time::should_time_equal),
    // json
    entry("ShouldJSONEqual", Exactly(1), json::should_json_equal),
    entry("ShouldNotJSONEqual", Exactly(1), json::should_not_json_equal),
    entry("ShouldJSONContain", Exactly(1), json::should_json_contain),
    entry("ShouldNotJSONContain", Exactly(1), json::should_not_json_contain),
    entry("ShouldJSONContainWithKey", Exactly(2), json::should_json_contain_with_key),
    entry(
        "ShouldJSONContainAllWithKey",
        Exactly(2),
        json::should_json_contain_all_with_key,
    ),
    entry(
        "ShouldNotJSONContainWithKey",
        Exactly(2),
        json::should_not_json_contain_with_key,
    ),
];

/// Get all registered assertions
pub fn all_assertions() -> &'static [AssertionInfo] {
    ASSERTIONS
}

/// Get an assertion by name
pub fn get_assertion(name: &str) -> Option<&'static AssertionInfo> {
    ASSERTIONS.iter().find(|a| a.name == name)
}

/// Like [`get_assertion`], failing with an argument error for unknown names
pub fn lookup_assertion(name: &str) -> Result<&'static AssertionInfo, Failure> {
    get_assertion(name).ok_or_else(|| Failure::argument(format!("unknown assertion {}", name)))
}
