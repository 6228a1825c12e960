//! In-process transport.
//!
//! [`memory_connector`] returns a connector and the listener that accepts its
//! connections. Each accepted [`MemoryPeer`] plays the server side: it reads
//! what the client sent and pushes frames back. Dropping the peer closes the
//! connection; taking the listener offline makes new connects fail.

use crate::error::TransportError;
use crate::{Connection, Connector};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Creates a connected connector/listener pair. The listener starts online.
#[must_use]
pub fn memory_connector() -> (MemoryConnector, MemoryListener) {
    let (accept_tx, accept_rx) = mpsc::unbounded_channel();
    let online = Arc::new(AtomicBool::new(true));
    (
        MemoryConnector {
            accept_tx,
            online: Arc::clone(&online),
        },
        MemoryListener { accept_rx, online },
    )
}

/// Client side factory of in-process connections.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
    online: Arc<AtomicBool>,
}

#[async_trait]
impl Connector for MemoryConnector {
    type Conn = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection, TransportError> {
        if !self.online.load(Ordering::Acquire) {
            tracing::debug!("memory connect refused, listener offline");
            return Err(TransportError::refused("memory listener offline"));
        }

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            tx: server_tx,
            rx: server_rx,
        };
        self.accept_tx
            .send(peer)
            .map_err(|_| TransportError::refused("memory listener dropped"))?;
        tracing::debug!("memory connection established");

        Ok(MemoryConnection {
            tx: Some(client_tx),
            rx: client_rx,
        })
    }
}

/// Accepts in-process connections.
#[derive(Debug)]
pub struct MemoryListener {
    accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
    online: Arc<AtomicBool>,
}

impl MemoryListener {
    /// Waits for the next connection.
    ///
    /// Returns `None` once every connector has been dropped.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accept_rx.recv().await
    }

    /// Makes subsequent connects succeed or fail.
    pub fn set_online(&self, online: bool) {
        tracing::debug!(online, "memory listener availability changed");
        self.online.store(online, Ordering::Release);
    }

    /// Returns true if connects currently succeed.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }
}

/// Server side of one in-process connection.
#[derive(Debug)]
pub struct MemoryPeer {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Pushes a frame to the client. Returns false if the client is gone.
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.tx.send(text.into()).is_ok()
    }

    /// Receives the next frame sent by the client.
    ///
    /// Returns `None` once the client closed or dropped its connection.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Client side of one in-process connection.
#[derive(Debug)]
pub struct MemoryConnection {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::ConnectionClosed)?;
        tx.send(text).map_err(|_| TransportError::ConnectionClosed)
    }

    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}
