//! Execution results in their response shape.

use herald_lang::Location;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Line/column of an error in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
}

impl From<Location> for ErrorLocation {
    fn from(location: Location) -> Self {
        Self {
            line: location.line,
            column: location.column,
        }
    }
}

/// One step of a response path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// An error reported alongside (possibly partial) data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ResponseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }

    pub(crate) fn at(message: impl Into<String>, location: Location) -> Self {
        Self {
            locations: vec![location.into()],
            ..Self::new(message)
        }
    }

    pub(crate) fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

/// The outcome of one execution.
///
/// `data` is `None` only when execution never started (for example because
/// variables could not be coerced); a failure that nulls the root yields
/// `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ExecutionResult {
    pub fn from_data(data: Value) -> Self {
        Self {
            errors: Vec::new(),
            data: Some(data),
        }
    }

    /// A result carrying a single error and no data.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![ResponseError::new(message)],
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Serialize to a JSON value in response form.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_shape() {
        let result = ExecutionResult::from_data(json!({ "disturbance": { "magnitude": 5 } }));
        assert_eq!(
            result.to_json(),
            json!({ "data": { "disturbance": { "magnitude": 5 } } })
        );

        let failed = ExecutionResult {
            errors: vec![ResponseError::at("boom", Location { line: 2, column: 3 })
                .with_path(vec!["disturbance".into(), 0.into()])],
            data: Some(Value::Null),
        };
        assert_eq!(
            failed.to_json(),
            json!({
                "errors": [{
                    "message": "boom",
                    "locations": [{ "line": 2, "column": 3 }],
                    "path": ["disturbance", 0]
                }],
                "data": null
            })
        );
    }

    #[test]
    fn test_from_error_has_no_data() {
        let result = ExecutionResult::from_error("Must provide an operation.");
        assert!(!result.is_ok());
        assert_eq!(
            result.to_json(),
            json!({ "errors": [{ "message": "Must provide an operation." }] })
        );
    }
}
