//! Unified error types for unfurl.

/// Unified error types for the unfurl service.
///
/// Errors are `Clone` so one failed upstream fetch can be handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid request parameters (missing `url`, oversized batch).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The target could not be parsed as an absolute http(s) URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The upstream answered with a non-2xx status.
    #[error("HTTP_ERROR: status {status}")]
    HttpStatus { status: u16, reason: String },

    /// DNS, connect, timeout or body read failure.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// The HTTP client could not be constructed.
    #[error("CLIENT_ERROR: {0}")]
    ClientBuild(String),
}

impl Error {
    /// Caller-facing message stored in a failed preview's `error` field.
    pub fn preview_message(&self) -> String {
        match self {
            Error::InvalidUrl(_) => "Invalid URL".to_string(),
            Error::HttpStatus { status, reason } if reason.is_empty() => format!("HTTP {status}"),
            Error::HttpStatus { status, reason } => format!("HTTP {status} {reason}"),
            Error::InvalidInput(msg) => msg.clone(),
            Error::FetchFailed(_) | Error::ClientBuild(_) => "Failed to fetch".to_string(),
        }
    }

    /// Upstream status code, when the failure carries one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
