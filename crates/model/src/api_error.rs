use crate::Error;
use http::StatusCode;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

/// Failures of an HTTP operation, each mapping to a single status code.
/// Every variant carries what is echoed back as the `request` of the envelope.
#[derive(Debug)]
pub enum ApiError {
    // A required field was missing or invalid
    Validation { request: Value, message: String },
    // The body could not be decoded
    MalformedInput { request: Value, message: String },
    // The identifier is absent from the store
    NotFound { request: Value, message: String },
    RouteNotFound { request: Value },
    MethodNotAllowed { request: Value },
    // Anything else, usually from the backing store
    Unexpected { operation: &'static str, error: Error },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::MalformedInput { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn request_payload(&self) -> Value {
        match self {
            ApiError::Validation { request, .. }
            | ApiError::MalformedInput { request, .. }
            | ApiError::NotFound { request, .. }
            | ApiError::RouteNotFound { request }
            | ApiError::MethodNotAllowed { request } => request.clone(),
            ApiError::Unexpected { operation, .. } => json!({ "operation": operation }),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::MalformedInput { message, .. }
            | ApiError::NotFound { message, .. } => message.clone(),
            ApiError::RouteNotFound { .. } => "Route not found".to_string(),
            ApiError::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            ApiError::Unexpected { operation, error } => {
                format!("Error in {operation}: {error}")
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status_code().as_u16(), self.message())
    }
}

impl std::error::Error for ApiError {}
