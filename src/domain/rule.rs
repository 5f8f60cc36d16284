//! Rule verdicts and their diagnostic details.
//!
//! - `DetailValue`: one named diagnostic (number, integer, flag or missing)
//! - `Details`: insertion-ordered diagnostics consulted by a rule
//! - `RuleVerdict`: pass/fail outcome with a human-readable reason

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DetailValue {
    Number(f64),
    Integer(i64),
    Flag(bool),
    Text(String),
    Missing,
}

impl DetailValue {
    /// Number, or `Missing` for `None` and NaN.
    pub fn number(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => DetailValue::Number(v),
            _ => DetailValue::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DetailValue::Missing)
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        DetailValue::number(Some(value))
    }
}

impl From<Option<f64>> for DetailValue {
    fn from(value: Option<f64>) -> Self {
        DetailValue::number(value)
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        DetailValue::Flag(value)
    }
}

impl From<usize> for DetailValue {
    fn from(value: usize) -> Self {
        DetailValue::Integer(value as i64)
    }
}

impl From<Option<usize>> for DetailValue {
    fn from(value: Option<usize>) -> Self {
        value.map_or(DetailValue::Missing, DetailValue::from)
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Text(value)
    }
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailValue::Number(v) => write!(f, "{}", v),
            DetailValue::Integer(v) => write!(f, "{}", v),
            DetailValue::Flag(v) => write!(f, "{}", v),
            DetailValue::Text(v) => write!(f, "{}", v),
            DetailValue::Missing => Ok(()),
        }
    }
}

pub type Details = IndexMap<String, DetailValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleVerdict {
    pub passed: bool,
    pub reason: String,
    pub details: Details,
}

impl RuleVerdict {
    pub fn pass(reason: &str) -> Self {
        Self {
            passed: true,
            reason: reason.to_string(),
            details: Details::new(),
        }
    }

    pub fn fail(reason: &str) -> Self {
        Self {
            passed: false,
            reason: reason.to_string(),
            details: Details::new(),
        }
    }

    pub fn decide(passed: bool, pass_reason: &str, fail_reason: &str) -> Self {
        if passed {
            Self::pass(pass_reason)
        } else {
            Self::fail(fail_reason)
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&DetailValue> {
        self.details.get(key)
    }
}
