//! Failure taxonomy and its mapping onto caller-visible responses.
//!
//! The status codes below are a stable external contract:
//!
//! | Error                 | Status |
//! |-----------------------|--------|
//! | `InvalidTarget`       | 400    |
//! | `UpstreamUnreachable` | 502    |
//! | `UpstreamTimeout`     | 504    |
//! | `InternalFailure`     | 500    |

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::observability::metrics;

/// Why a request could not be relayed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The path suffix is not a usable absolute `http(s)` URL.
    #[error("invalid relay target {0:?}")]
    InvalidTarget(String),

    /// Connection refused, DNS failure or similar.
    #[error("upstream {target} is unreachable: {detail}")]
    UpstreamUnreachable { target: String, detail: String },

    /// No response headers arrived within the first-byte timeout.
    #[error("upstream {target} did not respond within {timeout_ms} ms")]
    UpstreamTimeout { target: String, timeout_ms: u64 },

    /// Any other transport failure. The detail is only logged.
    #[error("internal relay failure: {0}")]
    InternalFailure(String),
}

impl RelayError {
    /// Metric/log label for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidTarget(_) => "invalid_target",
            RelayError::UpstreamUnreachable { .. } => "upstream_unreachable",
            RelayError::UpstreamTimeout { .. } => "upstream_timeout",
            RelayError::InternalFailure(_) => "internal_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            RelayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            RelayError::InternalFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent back to the caller.
    fn caller_message(&self) -> String {
        match self {
            RelayError::InvalidTarget(raw) => format!(
                "Invalid relay target {raw:?}: expected a percent-encoded absolute http:// or https:// URL"
            ),
            RelayError::UpstreamUnreachable { target, .. } => {
                format!("Upstream {target} is unreachable")
            }
            RelayError::UpstreamTimeout { target, timeout_ms } => {
                format!("Timed out after {timeout_ms} ms waiting for a response from {target}")
            }
            RelayError::InternalFailure(_) => "Internal relay error".to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::InternalFailure(detail) => {
                tracing::error!(kind = self.kind(), detail = %detail, "Relay failed");
            }
            _ => tracing::warn!(kind = self.kind(), error = %self, "Relay failed"),
        }
        metrics::record_error(self.kind());

        let mut response = (self.status(), self.caller_message()).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}
