//! Tracker API errors.

use thiserror::Error;

/// A failed tracker call.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The tracker answered with a non-success status.
    #[error("tracker responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl TrackerError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) | Self::Decode(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// The tracker refused the credentials.
    ///
    /// Every later call in the run would be refused the same way.
    pub fn rejects_credentials(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
