//! WebSocket transport.

use crate::error::TransportError;
use crate::{Connection, Connector};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Connects to a WebSocket endpoint (`ws://` or `wss://`).
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Creates a connector for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsConnection;

    async fn connect(&self) -> Result<WsConnection, TransportError> {
        let (stream, response) = connect_async(self.url.as_str()).await?;
        tracing::debug!(url = %self.url, status = %response.status(), "websocket handshake complete");
        Ok(WsConnection { stream })
    }
}

/// An open WebSocket connection.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => tracing::warn!("dropping non-UTF-8 binary frame"),
                },
                Message::Close(frame) => {
                    tracing::debug!(?frame, "websocket closed by peer");
                    return Ok(None);
                }
                // Pongs are queued by tungstenite itself.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        SinkExt::close(&mut self.stream).await?;
        Ok(())
    }
}
