//! Execution errors and the response envelope.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// One step in a response path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Classification of an execution error by its original cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ArgumentCoercion,
    ResolverFailure,
    TypeMismatch,
    AmbiguousType,
    UnknownField,
    OperationNotFound,
    AmbiguousOperation,
    Cancelled,
    Internal,
}

impl ErrorCode {
    /// Returns the wire identifier for this code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArgumentCoercion => "ARGUMENT_COERCION",
            Self::ResolverFailure => "RESOLVER_FAILURE",
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::AmbiguousType => "AMBIGUOUS_TYPE",
            Self::UnknownField => "UNKNOWN_FIELD",
            Self::OperationNotFound => "OPERATION_NOT_FOUND",
            Self::AmbiguousOperation => "AMBIGUOUS_OPERATION",
            Self::Cancelled => "CANCELLED",
            Self::Internal => "INTERNAL",
        }
    }
}

/// An error recorded during execution, attached to the response.
///
/// Serializes to the conventional GraphQL error shape: `message`, `path`
/// (when field-scoped) and the code under `extensions.code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    pub message: String,
    pub path: Option<Vec<PathSegment>>,
    pub code: ErrorCode,
}

impl ExecutionError {
    /// Creates a new execution error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            code,
        }
    }

    /// Attaches the response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }
}

impl Serialize for ExecutionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Extensions<'a> {
            code: &'a str,
        }

        let len = if self.path.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("message", &self.message)?;
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        map.serialize_entry(
            "extensions",
            &Extensions {
                code: self.code.as_str(),
            },
        )?;
        map.end()
    }
}

/// Sorts errors by (path, message) and drops exact (path, message) repeats.
///
/// Merged selections can observe the same underlying failure more than once;
/// the response reports it once.
pub(crate) fn normalize(errors: &mut Vec<ExecutionError>) {
    errors.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.message.cmp(&b.message)));
    errors.dedup_by(|a, b| a.path == b.path && a.message == b.message);
}

/// A condition that aborts the whole request before or during execution.
///
/// These never produce partial data: the response carries no `data` member
/// and a single pathless error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("operation '{0}' is not defined in the document")]
    OperationNotFound(String),

    #[error("document defines no executable operation")]
    NoOperations,

    #[error("document defines multiple operations; an operation name must be provided")]
    AmbiguousOperation,

    #[error("schema does not define a {0} root type")]
    MissingRootType(&'static str),

    #[error("fragment spread cycle detected through '{0}'")]
    FragmentCycle(String),

    #[error("selection depth exceeds the configured maximum of {0}")]
    DepthExceeded(usize),
}

impl RequestError {
    /// Returns the classification for the response error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::OperationNotFound(_) | Self::NoOperations => ErrorCode::OperationNotFound,
            Self::AmbiguousOperation => ErrorCode::AmbiguousOperation,
            Self::MissingRootType(_) | Self::FragmentCycle(_) | Self::DepthExceeded(_) => {
                ErrorCode::Internal
            }
        }
    }
}

impl From<RequestError> for ExecutionError {
    fn from(error: RequestError) -> Self {
        ExecutionError::new(error.code(), error.to_string())
    }
}

/// The result of executing a request.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// The data payload. Omitted entirely on request-fatal failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Errors recorded during execution, sorted by path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ExecutionError>>,
}

impl Response {
    /// Creates a data-only response.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Creates a response from execution output, normalizing the error list.
    pub(crate) fn from_parts(data: Option<Value>, mut errors: Vec<ExecutionError>) -> Self {
        normalize(&mut errors);
        Self {
            data,
            errors: if errors.is_empty() {
                None
            } else {
                Some(errors)
            },
        }
    }

    /// Creates a request-fatal response with a single pathless error.
    pub(crate) fn request_failed(error: RequestError) -> Self {
        Self {
            data: None,
            errors: Some(vec![error.into()]),
        }
    }

    /// Returns true if any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// Returns the recorded errors, if any.
    pub fn errors(&self) -> &[ExecutionError] {
        self.errors.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_serialization_shape() {
        let error = ExecutionError::new(ErrorCode::ResolverFailure, "boom")
            .with_path(vec!["people".into(), 3.into(), "name".into()]);

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "boom",
                "path": ["people", 3, "name"],
                "extensions": { "code": "RESOLVER_FAILURE" }
            })
        );
    }

    #[test]
    fn test_pathless_error_omits_path() {
        let error = ExecutionError::new(ErrorCode::AmbiguousOperation, "ambiguous");
        let value = serde_json::to_value(&error).unwrap();
        assert!(value.get("path").is_none());
        assert_eq!(value["extensions"]["code"], "AMBIGUOUS_OPERATION");
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let mut errors = vec![
            ExecutionError::new(ErrorCode::ResolverFailure, "late")
                .with_path(vec!["people".into(), 9.into()]),
            ExecutionError::new(ErrorCode::ResolverFailure, "early")
                .with_path(vec!["people".into(), 1.into()]),
            ExecutionError::new(ErrorCode::ResolverFailure, "early")
                .with_path(vec!["people".into(), 1.into()]),
        ];
        normalize(&mut errors);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "early");
        assert_eq!(errors[1].message, "late");
    }

    #[test]
    fn test_normalize_orders_pathless_first() {
        let mut errors = vec![
            ExecutionError::new(ErrorCode::ResolverFailure, "field")
                .with_path(vec!["a".into()]),
            ExecutionError::new(ErrorCode::Internal, "fatal"),
        ];
        normalize(&mut errors);
        assert!(errors[0].path.is_none());
    }

    #[test]
    fn test_response_envelope() {
        let response = Response::from_parts(Some(json!({"a": 1})), Vec::new());
        assert!(!response.has_errors());
        let serialized = serde_json::to_value(&response).unwrap();
        assert!(serialized.get("errors").is_none());

        let response = Response::request_failed(RequestError::AmbiguousOperation);
        assert!(response.data.is_none());
        assert_eq!(response.errors().len(), 1);
        assert_eq!(response.errors()[0].code, ErrorCode::AmbiguousOperation);
    }

    #[test]
    fn test_request_error_codes() {
        assert_eq!(
            RequestError::OperationNotFound("Q".into()).code(),
            ErrorCode::OperationNotFound
        );
        assert_eq!(
            RequestError::FragmentCycle("F".into()).code(),
            ErrorCode::Internal
        );
        assert_eq!(RequestError::DepthExceeded(128).code(), ErrorCode::Internal);
    }
}
