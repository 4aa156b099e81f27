//! String structure predicates

use regex::Regex;

use super::equality::should_equal;
use super::{at_least, check, need, negate, Failure, Outcome};
use crate::value::coerce::to_string;
use crate::value::Value;

/// Actual and single expected operand, both as text
fn operands(actual: &Value, expected: &[Value]) -> Result<(String, String), Failure> {
    need(1, expected)?;
    Ok((to_string(actual)?, to_string(&expected[0])?))
}

pub fn should_start_with(actual: &Value, expected: &[Value]) -> Outcome {
    let (s, prefix) = operands(actual, expected)?;
    check(s.starts_with(&prefix), || {
        format!("expected: prefix {:?} but got: {:?}", prefix, s)
    })
}

pub fn should_not_start_with(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_start_with(actual, expected), || {
        format!("expected: no prefix {} but got: {}", expected[0], actual)
    })
}

pub fn should_end_with(actual: &Value, expected: &[Value]) -> Outcome {
    let (s, suffix) = operands(actual, expected)?;
    check(s.ends_with(&suffix), || {
        format!("expected: suffix {:?} but got: {:?}", suffix, s)
    })
}

pub fn should_not_end_with(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_end_with(actual, expected), || {
        format!("expected: no suffix {} but got: {}", expected[0], actual)
    })
}

/// Arguments joined with single spaces and trimmed, so unquoted words
/// (`ShouldContainSubstring hello world`) form one needle
fn needle(expected: &[Value]) -> Result<String, Failure> {
    at_least(1, expected)?;
    let words = expected
        .iter()
        .map(to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(words.join(" ").trim().to_string())
}

pub fn should_contain_substring(actual: &Value, expected: &[Value]) -> Outcome {
    let sub = needle(expected)?;
    let s = to_string(actual)?;
    check(s.contains(&sub), || {
        format!("expected: to contain {:?} but got: {:?}", sub, s)
    })
}

pub fn should_not_contain_substring(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_contain_substring(actual, expected), || {
        let sub = needle(expected).unwrap_or_default();
        format!("expected: not to contain {:?} but got: {}", sub, actual)
    })
}

pub fn should_be_blank(actual: &Value, expected: &[Value]) -> Outcome {
    need(0, expected)?;
    let s = to_string(actual)?;
    check(s.is_empty(), || format!("expected: blank but got: {:?}", s))
}

pub fn should_not_be_blank(actual: &Value, expected: &[Value]) -> Outcome {
    negate(should_be_blank(actual, expected), || {
        "expected: not blank but got: \"\"".to_string()
    })
}

pub fn should_equal_trim_space(actual: &Value, expected: &[Value]) -> Outcome {
    need(1, expected)?;
    let trimmed = Value::String(to_string(actual)?.trim().to_string());
    should_equal(&trimmed, expected)
}

pub fn should_match_regex(actual: &Value, expected: &[Value]) -> Outcome {
    let (s, pattern) = operands(actual, expected)?;
    let re = Regex::new(&pattern)
        .map_err(|e| Failure::argument(format!("invalid regex {:?}: {}", pattern, e)))?;
    check(re.is_match(&s), || {
        format!("expected: to match {:?} but got: {:?}", pattern, s)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::test_support::{is_argument, is_assertion, v};

    #[test]
    fn test_prefix_and_suffix() {
        assert_eq!(should_start_with(&v("hello"), &[v("he")]), Ok(()));
        assert!(is_assertion(should_start_with(&v("hello"), &[v("lo")])));
        assert_eq!(should_not_start_with(&v("hello"), &[v("lo")]), Ok(()));
        assert_eq!(should_end_with(&v("hello"), &[v("lo")]), Ok(()));
        assert_eq!(should_end_with(&v(1234), &[v(34)]), Ok(()));
        assert!(is_assertion(should_not_end_with(&v("hello"), &[v("o")])));
        assert!(is_argument(should_start_with(&v(vec![1]), &[v("1")])));
    }

    #[test]
    fn test_substring_joins_arguments() {
        assert_eq!(
            should_contain_substring(&v("say hello world"), &[v("hello"), v("world")]),
            Ok(())
        );
        assert_eq!(should_contain_substring(&v("aaa-x"), &[v("a-")]), Ok(()));
        // Arguments become "a -", which "aaa-x" does not contain.
        assert!(is_assertion(should_contain_substring(
            &v("aaa-x"),
            &[v("a"), v("-")]
        )));
        assert_eq!(should_not_contain_substring(&v("abc"), &[v("z")]), Ok(()));
        assert!(is_argument(should_contain_substring(&v("abc"), &[])));
        assert!(is_argument(should_not_contain_substring(&v("abc"), &[])));
    }

    #[test]
    fn test_blank() {
        assert_eq!(should_be_blank(&v(""), &[]), Ok(()));
        assert_eq!(should_be_blank(&Value::Null, &[]), Ok(()));
        assert!(is_assertion(should_be_blank(&v(" "), &[])));
        assert_eq!(should_not_be_blank(&v("x"), &[]), Ok(()));
        assert!(is_argument(should_not_be_blank(&v(vec![1]), &[])));
    }

    #[test]
    fn test_equal_trim_space() {
        assert_eq!(should_equal_trim_space(&v("  ok\n"), &[v("ok")]), Ok(()));
        assert_eq!(should_equal_trim_space(&v("42\n"), &[v(42)]), Ok(()));
        assert!(is_assertion(should_equal_trim_space(&v("ok"), &[v("ko")])));
    }

    #[test]
    fn test_match_regex() {
        assert_eq!(should_match_regex(&v("abc123"), &[v("^[a-z]+[0-9]+$")]), Ok(()));
        assert!(is_assertion(should_match_regex(&v("abc"), &[v("^[0-9]+$")])));
        assert!(is_argument(should_match_regex(&v("abc"), &[v("(")])));
    }
}
