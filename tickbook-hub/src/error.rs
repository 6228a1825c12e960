//! Error types for hub operations.

use thiserror::Error;

/// Error type for hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] tickbook_transport::TransportError),

    /// Outbound frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// The driver is no longer running.
    #[error("channel error")]
    Channel,
}
