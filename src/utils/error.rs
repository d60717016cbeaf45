use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "ValidationError" => StatusCode::BAD_REQUEST,
            "AuthenticationError" => StatusCode::UNAUTHORIZED,
            "NotFoundError" => StatusCode::NOT_FOUND,
            "StoreError" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error == "NotFoundError"
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("ValidationError", message)
    }

    pub fn authentication_error(message: impl Into<String>) -> Self {
        Self::new("AuthenticationError", message)
    }

    pub fn not_found_error(message: impl Into<String>) -> Self {
        Self::new("NotFoundError", message)
    }

    pub fn store_error(message: impl Into<String>) -> Self {
        Self::new("StoreError", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("InternalError", message)
    }
}

// From implementations for common error types
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {}", err);
        Self::internal_error("Internal server error")
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::validation_error(format!("JSON parsing error: {}", err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Document store error: {}", err);
        Self::store_error("Document store request failed")
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::validation_error(format!("Invalid request parameters: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::not_found_error("gone").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::authentication_error("no").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::validation_error("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::internal_error("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_details_are_skipped_when_absent() {
        let json = serde_json::to_value(ApiError::not_found_error("Component not found")).unwrap();
        assert_eq!(json["error"], "NotFoundError");
        assert!(json.get("details").is_none());

        let json = serde_json::to_value(
            ApiError::not_found_error("x").with_details(serde_json::json!({ "id": "c1" })),
        )
        .unwrap();
        assert_eq!(json["details"]["id"], "c1");
    }
}
