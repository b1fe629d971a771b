//! Error types for the HTTP API.
//!
//! [`ApiError`] converts into an Axum response whose JSON body always
//! carries `ok: false`, matching the success bodies' `ok: true`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifecast_core::CreationError;

/// Errors that can occur in the HTTP API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested instance does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or query string could not be used.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An instance id could not be parsed from the path.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// The instance could not be created.
    #[error("{0}")]
    Creation(#[from] CreationError),
}

impl ApiError {
    /// HTTP status the error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) | Self::InvalidId(_) | Self::Creation(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "ok": false,
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}
