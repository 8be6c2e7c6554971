//! HTTP error responses.
//!
//! Failures the caller should see as a status code (bad input, image
//! failures). Per-URL preview failures are not errors at this layer; they
//! travel inside the preview record.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use unfurl_core::Error;

/// Error returned from an HTTP handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request parameters.
    #[error("{0}")]
    BadRequest(String),

    /// The upstream answered with a non-2xx status, proxied as is.
    #[error("upstream returned {0}")]
    Upstream(StatusCode),

    /// Transport failure talking to the upstream.
    #[error("{0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::InvalidUrl(_) => ApiError::BadRequest("Invalid URL".into()),
            Error::HttpStatus { status, .. } => {
                ApiError::Upstream(StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY))
            }
            Error::FetchFailed(_) | Error::ClientBuild(_) => ApiError::Internal(err.preview_message()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(status) => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
