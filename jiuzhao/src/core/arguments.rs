//! Decoding of the raw envelope payload into a key-value argument bag.
//!
//! Tools read every argument as text. Coercion rules:
//!
//! - strings are returned verbatim;
//! - numbers and booleans are returned as their JSON text (`3`, `true`);
//! - `null` is treated as absent;
//! - arrays and objects are returned as compact JSON text.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

/// Payload could not be decoded into an argument bag.
#[derive(Debug, Error)]
pub enum ArgumentDecodeError {
    #[error("invalid JSON in tool arguments: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tool arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Decoded tool arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentBag {
    values: Map<String, Value>,
}

impl ArgumentBag {
    /// Decode `raw` as a JSON object. An empty payload is an empty bag.
    pub fn decode(raw: &str) -> Result<Self, ArgumentDecodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(values) => Ok(Self { values }),
            other => Err(ArgumentDecodeError::NotAnObject(json_kind(&other))),
        }
    }

    /// Argument `key` as text, following the module coercion rules.
    pub fn get_str(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.values.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    /// Argument `key` as text, or `default` when absent.
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> Cow<'a, str> {
        self.get_str(key).unwrap_or(Cow::Borrowed(default))
    }

    /// Argument `key` as non-blank text.
    pub fn get_non_empty(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get_str(key).filter(|value| !value.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl std::fmt::Display for ArgumentBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.values.clone()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
