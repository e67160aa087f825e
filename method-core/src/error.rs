use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Message token carried by errors raised when a custom validate function
/// reports `false`.
pub const VALIDATION_FAILED: &str = "validationFailed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    PermissionDenied,
    NotFound,
    Conflict,
    ValidationFailed,
    Canceled,
    Internal,
}

impl ErrorCode {
    /// Numeric status reported to callers.
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::PermissionDenied => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::ValidationFailed => 422,
            ErrorCode::Canceled => 499,
            ErrorCode::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::Canceled => "canceled",
            ErrorCode::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

/// Structured error returned to the invoking client.
///
/// Renders as `"<message> [<status>]"`, e.g. `validationFailed [422]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} [{}]", .code.status())]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        RpcError {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: Value) -> Self {
        RpcError {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Canceled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// The error a boolean validate function produces when it answers `false`.
    pub fn validation_failed(caller_id: Option<&str>, method_name: &str) -> Self {
        Self::with_data(
            ErrorCode::ValidationFailed,
            VALIDATION_FAILED,
            json!({
                "callerId": caller_id,
                "methodName": method_name,
            }),
        )
    }

    /// Schema engine rejection, one message per violation.
    pub fn invalid_arguments(errors: Vec<String>) -> Self {
        Self::with_data(
            ErrorCode::BadRequest,
            "validation-error",
            json!({ "errors": errors }),
        )
    }

    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::bad_request(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RpcError::new(ErrorCode::BadRequest, "Invalid input");
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(err.message, "Invalid input");
        assert_eq!(err.data, None);
    }

    #[test]
    fn test_error_with_data() {
        let data = json!({"field": "value"});
        let err = RpcError::with_data(ErrorCode::Internal, "Server error", data.clone());
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.data, Some(data));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RpcError::bad_request("x").status(), 400);
        assert_eq!(RpcError::permission_denied("x").status(), 403);
        assert_eq!(RpcError::not_found("x").status(), 404);
        assert_eq!(RpcError::conflict("x").status(), 409);
        assert_eq!(RpcError::canceled("x").status(), 499);
        assert_eq!(RpcError::internal("x").status(), 500);
    }

    #[test]
    fn test_validation_failed_payload() {
        let err = RpcError::validation_failed(Some("user-1"), "posts.insert");
        assert_eq!(err.status(), 422);
        assert_eq!(err.message, VALIDATION_FAILED);
        assert_eq!(
            err.data,
            Some(json!({"callerId": "user-1", "methodName": "posts.insert"}))
        );

        let anonymous = RpcError::validation_failed(None, "posts.insert");
        assert_eq!(
            anonymous.data,
            Some(json!({"callerId": null, "methodName": "posts.insert"}))
        );
    }

    #[test]
    fn test_error_display() {
        let err = RpcError::validation_failed(None, "m");
        assert_eq!(err.to_string(), "validationFailed [422]");

        let err = RpcError::internal("Something went wrong");
        assert_eq!(format!("{}", err), "Something went wrong [500]");
    }

    #[test]
    fn test_invalid_arguments_details() {
        let err = RpcError::invalid_arguments(vec!["\"title\" is a required property".into()]);
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(
            err.data,
            Some(json!({"errors": ["\"title\" is a required property"]}))
        );
    }

    #[test]
    fn test_error_serialization_with_data() {
        let err = RpcError::validation_failed(Some("u"), "m");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"validation_failed\""));
        let deserialized: RpcError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }
}
