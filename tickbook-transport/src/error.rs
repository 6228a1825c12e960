//! Error types for transport operations.

use thiserror::Error;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection timeout.
    #[error("connection timeout")]
    ConnectTimeout,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// WebSocket protocol or handshake error.
    #[cfg(feature = "ws")]
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Channel error.
    #[error("channel error: {message}")]
    Channel {
        /// Error message.
        message: String,
    },
}

impl TransportError {
    /// Creates a channel error.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }

    /// Creates a connection refused IO error.
    pub fn refused(message: impl Into<String>) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            message.into(),
        ))
    }
}
