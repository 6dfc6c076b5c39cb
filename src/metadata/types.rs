//! Metadata read outcomes and error definitions.

use std::time::Duration;

use thiserror::Error;

/// Outcome of one metadata read.
#[derive(Debug)]
pub enum RawMetadataResult {
    /// The path exists; carries the response body.
    Present(String),
    /// The service answered 404: nothing pending at this path.
    Absent,
    /// The read could not be completed this time.
    TransientError(MetadataError),
}

impl RawMetadataResult {
    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RawMetadataResult::Present(_) => "present",
            RawMetadataResult::Absent => "absent",
            RawMetadataResult::TransientError(_) => "error",
        }
    }
}

/// Reasons a single metadata read failed.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The session token handshake failed.
    #[error("token request failed: {0}")]
    Token(String),

    /// The service rejected the session token.
    #[error("metadata service rejected the session token")]
    Unauthorized,

    /// The service answered with a status other than 200 or 404.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Connection or body read failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The read did not finish within the per-call budget.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        MetadataError::Transport(e.to_string())
    }
}
