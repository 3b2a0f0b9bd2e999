//! Error types for the Web API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;

use crate::auth::TokenError;
use crate::service::ServiceError;

/// Message returned when a request body cannot be decoded.
pub const MALFORMED_JSON_MESSAGE: &str = "Failed to parse incoming JSON";

/// Message returned when the token subject differs from the requested user.
pub const INVALID_CLAIM_MESSAGE: &str = "JWT claim is invalid for the requested user";

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Unauthorized (401).
    Unauthorized,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error.
///
/// Serialized as a single-field object, `{"err": "<message>"}` unless another
/// field name was chosen with [`ApiError::under`].
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error code.
    pub code: ErrorCode,
    /// Error message.
    pub message: String,
    field: &'static str,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: "err",
        }
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The request body was not valid JSON for the endpoint.
    pub fn malformed_json() -> Self {
        Self::bad_request(MALFORMED_JSON_MESSAGE)
    }

    /// The authenticated user is not the user named in the request.
    pub fn invalid_claim() -> Self {
        Self::unauthorized(INVALID_CLAIM_MESSAGE)
    }

    /// Serialize the message under `field` instead of `err`.
    pub fn under(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    /// The JSON field the message is serialized under.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = HashMap::from([(self.field, self.message)]);
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let code = match err {
            ServiceError::UserFetch => ErrorCode::BadRequest,
            ServiceError::InvalidPassword => ErrorCode::Unauthorized,
            _ => ErrorCode::InternalError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        let code = match err {
            TokenError::Malformed => ErrorCode::BadRequest,
            TokenError::Encode(_) => ErrorCode::InternalError,
            TokenError::Missing
            | TokenError::Expired
            | TokenError::Invalid
            | TokenError::NotActive => ErrorCode::Unauthorized,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
