//! Time instant predicates
//!
//! Operands are coerced with [`to_time`]; comparisons are on the UTC instant,
//! so `15:04:05+07:00` and `08:04:05Z` are the same moment.

use chrono::{DateTime, FixedOffset};

use super::{check, need, Failure, Outcome};
use crate::value::coerce::to_time;
use crate::value::{format_instant, Value};

type Instant = DateTime<FixedOffset>;

fn instants(actual: &Value, expected: &[Value]) -> Result<(Instant, Instant), Failure> {
    need(1, expected)?;
    Ok((to_time(actual)?, to_time(&expected[0])?))
}

fn relation(actual: Instant, word: &str, expected: Instant) -> String {
    format!(
        "expected: {} {} but got: {}",
        word,
        format_instant(&expected),
        format_instant(&actual)
    )
}

pub fn should_happen_before(actual: &Value, expected: &[Value]) -> Outcome {
    let (a, e) = instants(actual, expected)?;
    check(a < e, || relation(a, "before", e))
}

pub fn should_happen_on_or_before(actual: &Value, expected: &[Value]) -> Outcome {
    let (a, e) = instants(actual, expected)?;
    check(a <= e, || relation(a, "on or before", e))
}

pub fn should_happen_after(actual: &Value, expected: &[Value]) -> Outcome {
    let (a, e) = instants(actual, expected)?;
    check(a > e, || relation(a, "after", e))
}

pub fn should_happen_on_or_after(actual: &Value, expected: &[Value]) -> Outcome {
    let (a, e) = instants(actual, expected)?;
    check(a >= e, || relation(a, "on or after", e))
}

pub fn should_time_equal(actual: &Value, expected: &[Value]) -> Outcome {
    let (a, e) = instants(actual, expected)?;
    check(a == e, || relation(a, "the same instant as", e))
}

/// Strictly inside `(expected[0], expected[1])`
pub fn should_happen_between(actual: &Value, expected: &[Value]) -> Outcome {
    need(2, expected)?;
    let a = to_time(actual)?;
    let low = to_time(&expected[0])?;
    let high = to_time(&expected[1])?;
    check(low < a && a < high, || {
        format!(
            "expected: between {} and {} but got: {}",
            format_instant(&low),
            format_instant(&high),
            format_instant(&a)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::test_support::{is_argument, is_assertion, v};

    #[test]
    fn test_before_and_after() {
        let early = v("2006-01-02T15:04:05+07:00");
        let late = v("2006-01-02T15:04:06+07:00");
        assert_eq!(should_happen_before(&early, &[late.clone()]), Ok(()));
        assert!(is_assertion(should_happen_before(&late, &[early.clone()])));
        assert_eq!(should_happen_after(&late, &[early.clone()]), Ok(()));
        assert!(is_assertion(should_happen_after(&early, &[early.clone()])));
    }

    #[test]
    fn test_offset_independence() {
        let local = v("2006-01-02T15:04:05+07:00");
        let utc = v("2006-01-02T08:04:05Z");
        assert_eq!(should_happen_on_or_before(&local, &[utc.clone()]), Ok(()));
        assert_eq!(should_happen_on_or_after(&local, &[utc.clone()]), Ok(()));
        assert_eq!(should_time_equal(&local, &[utc.clone()]), Ok(()));
        assert!(is_assertion(should_happen_before(&local, &[utc])));
    }

    #[test]
    fn test_happen_between() {
        assert_eq!(
            should_happen_between(
                &v("2006-01-02T15:04:05+07:00"),
                &[v("2006-01-02T15:04:00+07:00"), v("2006-01-02T15:04:10+07:00")]
            ),
            Ok(())
        );
        assert!(is_assertion(should_happen_between(
            &v("2006-01-02T15:04:00+07:00"),
            &[v("2006-01-02T15:04:00+07:00"), v("2006-01-02T15:04:10+07:00")]
        )));
    }

    #[test]
    fn test_invalid_date_is_argument_error() {
        let outcome = should_happen_before(&v("yesterday"), &[v("2006-01-02T15:04:05Z")]);
        assert!(is_argument(outcome.clone()));
        assert!(outcome.unwrap_err().message().contains("yesterday"));
        assert!(is_argument(should_happen_between(&v("2006-01-02T15:04:05Z"), &[v("x")])));
    }
}
