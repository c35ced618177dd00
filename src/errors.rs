//! Error types for the Swift proxy
//!
//! Provides structured error handling using thiserror for all error cases
//! encountered while proxying, and maps each of them onto an HTTP response
//! in one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::storage::StorageError;

/// Main error type for proxy request handling
#[derive(Error, Debug)]
pub enum ProxyError {
    /// A required query parameter was absent or empty
    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),

    /// The storage backend reported a failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status for this error.
    ///
    /// Requests that name no object resolve to 404, the same as objects the
    /// backend does not have. Backend rejections keep the status the backend
    /// answered with. Authentication and transport failures surface as 502,
    /// timeouts as 504.
    fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter(_) => StatusCode::NOT_FOUND,
            ProxyError::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ProxyError::Storage(StorageError::Authentication(_)) => StatusCode::BAD_GATEWAY,
            ProxyError::Storage(StorageError::Rejected { status, .. }) => *status,
            ProxyError::Storage(StorageError::Transport(e)) => {
                if e.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ProxyError::MissingParameter(name) => {
                warn!(parameter = %name, "rejecting request with missing parameter");
            }
            ProxyError::Storage(e @ StorageError::NotFound { .. }) => {
                warn!(error = %e, "object not found");
            }
            ProxyError::Storage(e) => {
                error!(error = %e, %status, "storage backend error");
            }
            ProxyError::Internal(reason) => {
                error!(%reason, "internal error");
            }
        }

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ProxyError>;
