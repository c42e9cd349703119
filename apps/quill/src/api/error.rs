//! Mapping of failures to HTTP responses.
//!
//! Every error body is JSON. Validation failures return the field map as-is;
//! everything else returns `{"detail": "..."}`.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use quill_core::QuillError;
use serde_json::json;
use tracing::{error, warn};

pub const DETAIL_NOT_FOUND: &str = "Not found.";
pub const DETAIL_NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const DETAIL_INVALID_CREDENTIALS: &str = "Invalid username/password.";
pub const DETAIL_MALFORMED_CREDENTIALS: &str = "Invalid basic header.";
pub const DETAIL_RATE_LIMITED: &str = "Request was throttled.";
pub const DETAIL_INTERNAL: &str = "Internal server error.";

/// Realm advertised on 401 responses.
pub const BASIC_REALM: &str = "Basic realm=\"api\"";

#[derive(Debug)]
pub enum ApiError {
    /// A rule of the core was violated or the store failed.
    Core(QuillError),
    /// Basic credentials did not match a user.
    InvalidCredentials,
    /// The Authorization header could not be decoded.
    MalformedCredentials,
    /// The path matched no route.
    RouteNotFound,
    /// The global request budget is exhausted.
    RateLimited,
    /// A server task failed outside of the core.
    Internal(String),
}

impl From<QuillError> for ApiError {
    fn from(err: QuillError) -> Self {
        Self::Core(err)
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

fn unauthorized(message: &str) -> Response {
    let mut response = detail(StatusCode::UNAUTHORIZED, message);
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(BASIC_REALM),
    );
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCredentials => {
                warn!("rejected invalid credentials");
                unauthorized(DETAIL_INVALID_CREDENTIALS)
            }
            Self::MalformedCredentials => unauthorized(DETAIL_MALFORMED_CREDENTIALS),
            Self::RouteNotFound => detail(StatusCode::NOT_FOUND, DETAIL_NOT_FOUND),
            Self::RateLimited => detail(StatusCode::TOO_MANY_REQUESTS, DETAIL_RATE_LIMITED),
            Self::Internal(reason) => {
                error!(error = %reason, "request failed");
                detail(StatusCode::INTERNAL_SERVER_ERROR, DETAIL_INTERNAL)
            }
            Self::Core(err) => match err {
                QuillError::NotFound { .. } => detail(StatusCode::NOT_FOUND, DETAIL_NOT_FOUND),
                QuillError::NotAuthenticated => {
                    detail(StatusCode::FORBIDDEN, DETAIL_NOT_AUTHENTICATED)
                }
                QuillError::PermissionDenied(message) => detail(StatusCode::FORBIDDEN, message),
                QuillError::Validation(errors) => {
                    (StatusCode::BAD_REQUEST, Json(errors)).into_response()
                }
                QuillError::MalformedBody(reason) => detail(
                    StatusCode::BAD_REQUEST,
                    format!("JSON parse error - {reason}"),
                ),
                QuillError::UnsupportedMediaType(reason) => {
                    detail(StatusCode::UNSUPPORTED_MEDIA_TYPE, reason)
                }
                QuillError::InvalidInput(message) => detail(StatusCode::BAD_REQUEST, message),
                QuillError::Conflict(message) => detail(StatusCode::CONFLICT, message),
                err @ (QuillError::Storage(_) | QuillError::Encoding(_)) => {
                    error!(error = %err, "request failed in storage");
                    detail(StatusCode::INTERNAL_SERVER_ERROR, DETAIL_INTERNAL)
                }
            },
        }
    }
}
