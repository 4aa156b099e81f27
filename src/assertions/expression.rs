//! Assertion expression parsing
//!
//! An expression is one line of the form `<path> <Name> [<arg>...]`, e.g.
//! `result.code ShouldEqual 0` or `result.systemout ShouldContainSubstring "a b"`.
//! The parser knows nothing about arities; those are checked against the
//! registry before the arguments are typed.

use std::fmt;
use std::str::FromStr;

use super::registry::lookup_assertion;
use super::{Failure, Outcome};
use crate::value::coerce::parse_time;
use crate::value::Value;

/// A parsed `(path, name, args)` triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionExpression {
    /// Keys (or decimal indices) walked from a result root, root first
    pub path: Vec<String>,
    /// Predicate name, matched case-sensitively against the registry
    pub name: String,
    /// Literal argument tokens, quotes already stripped
    pub args: Vec<String>,
}

impl AssertionExpression {
    pub fn parse(line: &str) -> Result<Self, Failure> {
        let mut tokens = tokenize(line)?.into_iter();
        let (Some(path), Some(name)) = (tokens.next(), tokens.next()) else {
            return Err(Failure::argument(format!(
                "invalid assertion {:?}: expected `<path> <Name> [<arg>...]`",
                line.trim()
            )));
        };

        let path = parse_path(&path)?;
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Failure::argument(format!("invalid assertion name {:?}", name)));
        }

        Ok(Self {
            path,
            name,
            args: tokens.collect(),
        })
    }

    /// Dotted form of the path
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Arguments typed after the shape of `actual`
    pub fn typed_args(&self, actual: &Value) -> Result<Vec<Value>, Failure> {
        self.args
            .iter()
            .map(|token| {
                type_literal(token, actual).ok_or_else(|| {
                    Failure::argument(format!(
                        "mismatched type between '{}' and '{}'",
                        self.path_string(),
                        token
                    ))
                })
            })
            .collect()
    }

    /// Run the named predicate against an already resolved value
    pub fn evaluate(&self, actual: &Value) -> Outcome {
        let info = lookup_assertion(&self.name)?;
        info.arity.check(self.args.len())?;
        let args = self.typed_args(actual)?;
        info.call(actual, &args)
    }
}

impl FromStr for AssertionExpression {
    type Err = Failure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AssertionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path_string(), self.name)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"') {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

fn parse_path(text: &str) -> Result<Vec<String>, Failure> {
    let segments: Vec<String> = text.split('.').map(str::to_string).collect();
    let valid = |s: &String| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };
    if segments.iter().all(valid) {
        Ok(segments)
    } else {
        Err(Failure::argument(format!("invalid assertion path {:?}", text)))
    }
}

/// Split a line on whitespace. A double-quoted run is one token with the
/// quotes removed; a backslash before a quote yields a literal quote.
pub fn tokenize(line: &str) -> Result<Vec<String>, Failure> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A quoted "" still produces a token
    let mut started = false;
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
                started = true;
            }
            '\\' if quoted && chars.peek() == Some(&'\\') => {
                current.push('\\');
                chars.next();
            }
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if quoted {
        return Err(Failure::argument(format!(
            "unterminated quote in assertion {:?}",
            line.trim()
        )));
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Interpret a literal token as the same kind of value as `actual`.
///
/// Integers fall back to floats so `result.code ShouldAlmostEqual 1 0.5`
/// works. Returns `None` when the token cannot be read that way.
pub fn type_literal(token: &str, actual: &Value) -> Option<Value> {
    match actual {
        Value::Int(_) => token
            .parse::<i64>()
            .map(Value::Int)
            .ok()
            .or_else(|| token.parse::<f64>().ok().map(Value::Float)),
        Value::Float(_) => token.parse::<f64>().ok().map(Value::Float),
        Value::Bool(_) => match token {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(Value::Bool(true)),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(Value::Bool(false)),
            _ => None,
        },
        Value::Time(_) => parse_time(token).ok().map(Value::Time),
        _ => Some(Value::String(token.to_string())),
    }
}
