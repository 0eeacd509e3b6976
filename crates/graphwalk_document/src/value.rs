//! Input values and request variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Variable values supplied alongside a request.
///
/// Values are already coerced against the operation's variable definitions
/// by the caller; execution substitutes them as-is.
pub type Variables = HashMap<String, serde_json::Value>;

/// A literal or variable-referencing value in argument position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputValue {
    Variable(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<InputValue>),
    Object(Vec<(String, InputValue)>),
}

impl InputValue {
    /// Creates a variable reference.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Creates an enum literal.
    pub fn enum_value(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// Returns true for the null literal.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<InputValue>> From<Vec<T>> for InputValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
