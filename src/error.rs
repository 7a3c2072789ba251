/// Typed errors for the TaskVault API
///
/// `ApiError` is what handlers return; it renders as `{ "detail": "..." }` with the
/// matching HTTP status. `StoreError` is produced by the table store layer and is
/// folded into `ApiError` on required paths.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// User-visible error taxonomy
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input that the router accepted but the domain rejects
    #[error("{0}")]
    Validation(String),

    /// Missing workflow, step or team member
    #[error("{0}")]
    NotFound(String),

    /// Duplicate team member email
    #[error("{0}")]
    Conflict(String),

    /// Non-admin actor attempting an admin action
    #[error("{0}")]
    Forbidden(String),

    /// Plan ceiling reached; surfaced as 403 like other permission failures
    #[error("{0}")]
    CapacityExceeded(String),

    /// Fixed-window ceiling reached for this caller and endpoint
    #[error("Rate limit exceeded for {endpoint}. Try again later.")]
    RateLimited { endpoint: String },

    /// External store unreachable or answered with an unexpected status
    #[error("Upstream store unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Store credentials absent for an operation that needs them
    #[error("Store is not configured: {0}")]
    Misconfigured(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) | Self::CapacityExceeded(_) => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("❌ {} ({})", self, status);
        } else {
            tracing::debug!("↩️ {} ({})", self, status);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

// Request parsing failures share the Validation status and body shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Failures talking to the hosted table store
#[derive(Debug, Error)]
pub enum StoreError {
    /// URL or service credential missing
    #[error("{0}")]
    Misconfigured(String),

    /// Connection, timeout or TLS failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected row shape
    #[error("invalid store response: {0}")]
    Decode(#[from] serde_json::Error),

    /// In-memory backend switched to unavailable
    #[error("store unavailable")]
    Unavailable,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Misconfigured(message) => ApiError::Misconfigured(message),
            other => ApiError::UpstreamUnavailable(other.to_string()),
        }
    }
}
