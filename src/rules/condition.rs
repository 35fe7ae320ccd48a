//! Interpretable rule conditions
//!
//! Conditions are a tagged variant evaluated against stimulus fields, not
//! closures: rule sets stay declarable in data and inspectable at runtime.
//! A missing field is an ordinary non-match; a present field of the wrong
//! shape is an evaluation error, which the engine treats as "skip this
//! rule", never as a cycle abort.

use serde_json::Value;
use thiserror::Error;

/// A condition evaluation fault (type mismatch, not a non-match)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("condition evaluation failed: {0}")]
pub struct ConditionError(pub String);

/// One condition over a single stimulus field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Literal equality
    Equals(Value),
    /// Literal inequality
    NotEquals(Value),
    /// Numeric `>`
    GreaterThan(f64),
    /// Numeric `<`
    LessThan(f64),
    /// Numeric `>=`
    AtLeast(f64),
    /// Numeric `<=`
    AtMost(f64),
    /// Set membership
    OneOf(Vec<Value>),
    /// Substring pattern over string fields
    Matches(String),
}

impl Condition {
    /// Build from an operator symbol and operand, as rule files encode them
    pub fn from_operator(op: &str, operand: Value) -> Result<Self, ConditionError> {
        let numeric = |v: &Value| {
            v.as_f64()
                .ok_or_else(|| ConditionError(format!("operator {} needs a numeric operand", op)))
        };
        match op {
            "==" => Ok(Self::Equals(operand)),
            "!=" => Ok(Self::NotEquals(operand)),
            ">" => Ok(Self::GreaterThan(numeric(&operand)?)),
            "<" => Ok(Self::LessThan(numeric(&operand)?)),
            ">=" => Ok(Self::AtLeast(numeric(&operand)?)),
            "<=" => Ok(Self::AtMost(numeric(&operand)?)),
            "in" => match operand {
                Value::Array(items) => Ok(Self::OneOf(items)),
                _ => Err(ConditionError("operator in needs an array operand".into())),
            },
            "matches" => match operand {
                Value::String(pattern) => Ok(Self::Matches(pattern)),
                _ => Err(ConditionError(
                    "operator matches needs a string operand".into(),
                )),
            },
            _ => Err(ConditionError(format!("unknown operator: {}", op))),
        }
    }

    /// Evaluate against an (optional) field value
    pub fn evaluate(&self, field: Option<&Value>) -> Result<bool, ConditionError> {
        let Some(value) = field else {
            // Absent field: nothing to compare against, the rule just
            // does not match
            return Ok(false);
        };
        match self {
            Self::Equals(expected) => Ok(value == expected),
            Self::NotEquals(expected) => Ok(value != expected),
            Self::GreaterThan(limit) => Ok(Self::as_number(value)? > *limit),
            Self::LessThan(limit) => Ok(Self::as_number(value)? < *limit),
            Self::AtLeast(limit) => Ok(Self::as_number(value)? >= *limit),
            Self::AtMost(limit) => Ok(Self::as_number(value)? <= *limit),
            Self::OneOf(allowed) => Ok(allowed.contains(value)),
            Self::Matches(pattern) => match value.as_str() {
                Some(s) => Ok(s.contains(pattern.as_str())),
                None => Err(ConditionError(
                    "matches applied to a non-string field".into(),
                )),
            },
        }
    }

    fn as_number(value: &Value) -> Result<f64, ConditionError> {
        value
            .as_f64()
            .ok_or_else(|| ConditionError(format!("expected a number, got {}", value)))
    }
}
