//! # tickbook Transport
//!
//! Text-frame transport seam for the subscription hub.
//!
//! This crate provides:
//! - [`Connector`] / [`Connection`] traits the hub drives
//! - [`ws`] - WebSocket connector over `tokio-tungstenite`
//! - [`memory`] - In-process connector with switchable availability

pub mod error;
pub mod memory;
#[cfg(feature = "ws")]
pub mod ws;

use async_trait::async_trait;

pub use error::TransportError;
pub use memory::{MemoryConnection, MemoryConnector, MemoryListener, MemoryPeer, memory_connector};
#[cfg(feature = "ws")]
pub use ws::{WsConnection, WsConnector};

/// An open, bidirectional text-frame connection.
#[async_trait]
pub trait Connection: Send {
    /// Sends one text frame.
    ///
    /// # Errors
    /// Returns `TransportError` if the frame cannot be written.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Receives the next text frame.
    ///
    /// # Returns
    /// `Ok(Some(text))` if a frame was received, `Ok(None)` if the peer
    /// closed the connection.
    ///
    /// # Errors
    /// Returns `TransportError` if the read fails.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;

    /// Closes the connection.
    ///
    /// # Errors
    /// Returns `TransportError` if the close handshake fails.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens connections to one endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connection type produced by this connector.
    type Conn: Connection + 'static;

    /// Opens a new connection.
    ///
    /// # Errors
    /// Returns `TransportError` if the endpoint cannot be reached.
    async fn connect(&self) -> Result<Self::Conn, TransportError>;
}
