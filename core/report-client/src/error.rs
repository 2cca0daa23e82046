//! FILENAME: core/report-client/src/error.rs

use thiserror::Error;

/// Failures talking to the reporting backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success status other than 404.
    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// 404 on a resource path.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether retrying the same action may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Backend { .. })
    }

    pub(crate) fn backend(status: u16, message: impl Into<String>) -> Self {
        ClientError::Backend {
            status,
            message: message.into(),
        }
    }
}
