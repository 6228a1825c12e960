//! Error types for depth operations.

use thiserror::Error;

/// Error raised by a [`DepthSource`](crate::source::DepthSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not be reached or refused the request.
    #[error("depth source unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The source answered with a body that is not a depth response.
    #[error("depth response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SourceError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Error type for building a depth view end to end.
#[derive(Debug, Error)]
pub enum DepthError {
    /// Invalid view parameters.
    #[error(transparent)]
    Core(#[from] tickbook_core::Error),

    /// Fetching the raw book failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}
