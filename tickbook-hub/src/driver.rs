//! Connection driver.
//!
//! The driver owns the single transport connection. It connects, keeps the
//! server subscription in step with the registry, dispatches inbound frames
//! and walks the reconnect state machine when the connection fails.

use crate::error::HubError;
use crate::hub::{HubCommand, Shared};
use crate::protocol::{InboundMessage, OutboundFrame};
use crate::reconnect::ReconnectState;
use crate::state::{ConnectionState, StatusEvent};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tickbook_transport::{Connection, Connector, TransportError};
use tokio::sync::mpsc;

/// Why the driver left a wait.
enum Wake {
    Retry,
    Shutdown,
}

/// Runs the hub connection. Spawn [`HubDriver::run`] on a tokio runtime.
pub struct HubDriver<C: Connector> {
    connector: C,
    reconnect: ReconnectState,
    shared: Arc<Shared>,
    cmd_rx: mpsc::UnboundedReceiver<HubCommand>,
}

impl<C: Connector> HubDriver<C> {
    pub(crate) fn new(
        connector: C,
        reconnect: ReconnectState,
        shared: Arc<Shared>,
        cmd_rx: mpsc::UnboundedReceiver<HubCommand>,
    ) -> Self {
        Self {
            connector,
            reconnect,
            shared,
            cmd_rx,
        }
    }

    /// Runs until [`Hub::shutdown`](crate::Hub::shutdown) is called or every
    /// hub handle is dropped.
    ///
    /// Transport failures never end the driver: they are reported to status
    /// observers and retried. Once retries are exhausted the driver idles in
    /// [`ConnectionState::Disconnected`] until reconnect is requested or a
    /// symbol is subscribed.
    pub async fn run(mut self) {
        loop {
            if !matches!(self.shared.state(), ConnectionState::Reconnecting(_)) {
                self.shared.set_state(ConnectionState::Connecting);
            }

            let Some(outcome) = self.connect_or_stop().await else {
                self.stop();
                return;
            };

            match outcome {
                Ok(mut conn) => {
                    self.reconnect.on_success();
                    self.shared.set_state(ConnectionState::Connected);
                    tracing::info!("hub connected");

                    match self.session(&mut conn).await {
                        Ok(()) => {
                            if let Err(e) = conn.close().await {
                                tracing::debug!(error = %e, "error closing connection");
                            }
                            self.stop();
                            return;
                        }
                        Err(e) => self.report(&e),
                    }
                }
                Err(e) => self.report(&HubError::Transport(e)),
            }

            let wake = match self.reconnect.on_failure() {
                Some(delay) => {
                    let attempt = self.reconnect.attempts();
                    self.shared.set_state(ConnectionState::Reconnecting(attempt));
                    tracing::info!(attempt, ?delay, "reconnecting");
                    self.backoff(delay).await
                }
                None => {
                    self.shared.set_state(ConnectionState::Disconnected);
                    if self.reconnect.is_enabled() {
                        let attempts = self.reconnect.attempts();
                        tracing::error!(attempts, "max reconnect attempts reached");
                        self.shared.emit(&StatusEvent::RetriesExhausted { attempts });
                    }
                    self.park().await
                }
            };

            match wake {
                Wake::Retry => {}
                Wake::Shutdown => {
                    self.stop();
                    return;
                }
            }
        }
    }

    /// Connects, giving up early if the hub shuts down meanwhile.
    async fn connect_or_stop(&mut self) -> Option<Result<C::Conn, TransportError>> {
        let attempt = connect(&self.connector, self.reconnect.connect_timeout());
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                result = &mut attempt => return Some(result),
                cmd = self.cmd_rx.recv() => match cmd {
                    // The tracked set is synced once the connection is up.
                    Some(HubCommand::Subscribed | HubCommand::Unsubscribed | HubCommand::Reconnect) => {}
                    Some(HubCommand::Shutdown) | None => return None,
                },
            }
        }
    }

    /// Serves one open connection.
    ///
    /// Returns `Ok` on shutdown and `Err` when the connection broke.
    async fn session(&mut self, conn: &mut C::Conn) -> Result<(), HubError> {
        // Symbols the server has been asked for on this connection.
        let mut sent = BTreeSet::new();
        sync(&self.shared, conn, &mut sent).await?;

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(HubCommand::Subscribed | HubCommand::Unsubscribed) => {
                        sync(&self.shared, conn, &mut sent).await?;
                    }
                    Some(HubCommand::Reconnect) => {
                        tracing::debug!("reconnect requested while connected, ignoring");
                    }
                    Some(HubCommand::Shutdown) | None => return Ok(()),
                },

                frame = conn.recv() => match frame? {
                    Some(text) => self.handle_frame(&text),
                    None => return Err(TransportError::ConnectionClosed.into()),
                },
            }
        }
    }

    fn handle_frame(&self, text: &str) {
        match InboundMessage::from_json(text) {
            Ok(message) => {
                self.shared.dispatch(&message);
            }
            Err(e) => tracing::warn!(error = %e, frame = text, "dropping unparseable frame"),
        }
    }

    /// Waits out the retry interval. A reconnect request cuts it short.
    async fn backoff(&mut self, delay: Duration) -> Wake {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return Wake::Retry,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(HubCommand::Reconnect) => {
                        self.reconnect.reset();
                        return Wake::Retry;
                    }
                    Some(HubCommand::Subscribed | HubCommand::Unsubscribed) => {}
                    Some(HubCommand::Shutdown) | None => return Wake::Shutdown,
                },
            }
        }
    }

    /// Idles after retries are exhausted until an external trigger.
    async fn park(&mut self) -> Wake {
        loop {
            match self.cmd_rx.recv().await {
                Some(HubCommand::Subscribed | HubCommand::Reconnect) => {
                    tracing::info!("reconnect triggered, resetting attempts");
                    self.reconnect.reset();
                    return Wake::Retry;
                }
                Some(HubCommand::Unsubscribed) => {}
                Some(HubCommand::Shutdown) | None => return Wake::Shutdown,
            }
        }
    }

    fn report(&self, error: &HubError) {
        tracing::warn!(error = %error, "hub connection failed");
        let message = match error {
            HubError::Transport(e) => e.to_string(),
            other => other.to_string(),
        };
        self.shared.emit(&StatusEvent::TransportError(message));
    }

    fn stop(&self) {
        self.shared.set_state(ConnectionState::Disconnected);
        tracing::info!("hub stopped");
    }
}

async fn connect<C: Connector>(connector: &C, timeout: Duration) -> Result<C::Conn, TransportError> {
    tokio::time::timeout(timeout, connector.connect())
        .await
        .map_err(|_| TransportError::ConnectTimeout)?
}

/// Brings the server subscription in line with the registry.
///
/// Sends at most one subscribe and one unsubscribe frame. On a fresh
/// connection `sent` is empty, so the whole tracked set goes out in a
/// single subscribe frame.
async fn sync<T: Connection>(
    shared: &Shared,
    conn: &mut T,
    sent: &mut BTreeSet<String>,
) -> Result<(), HubError> {
    let tracked = shared.tracked_symbols();
    let added: Vec<String> = tracked.difference(sent).cloned().collect();
    let removed: Vec<String> = sent.difference(&tracked).cloned().collect();

    if !added.is_empty() {
        let frame = OutboundFrame::Subscribe {
            symbols: added.clone(),
        };
        conn.send(frame.to_json()?).await?;
        tracing::debug!(symbols = ?added, "sent subscribe");
        sent.extend(added);
    }
    if !removed.is_empty() {
        let frame = OutboundFrame::Unsubscribe {
            symbols: removed.clone(),
        };
        conn.send(frame.to_json()?).await?;
        tracing::debug!(symbols = ?removed, "sent unsubscribe");
        for symbol in &removed {
            sent.remove(symbol);
        }
    }
    Ok(())
}

impl<C: Connector> std::fmt::Debug for HubDriver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubDriver")
            .field("reconnect", &self.reconnect)
            .field("state", &self.shared.state())
            .finish()
    }
}
