//! Hub builder.

use crate::driver::HubDriver;
use crate::hub::{Hub, Shared};
use crate::reconnect::{ReconnectConfig, ReconnectState};
use std::sync::Arc;
use std::time::Duration;
use tickbook_transport::Connector;
use tokio::sync::mpsc;

/// Builder for configuring and creating a hub.
pub struct HubBuilder<C: Connector> {
    connector: C,
    reconnect_config: ReconnectConfig,
}

impl<C: Connector> HubBuilder<C> {
    /// Creates a new hub builder over `connector`.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            reconnect_config: ReconnectConfig::default(),
        }
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.reconnect_config.connect_timeout = timeout;
        self
    }

    /// Enables or disables automatic reconnection.
    #[must_use]
    pub fn reconnect(mut self, enabled: bool) -> Self {
        self.reconnect_config.enabled = enabled;
        self
    }

    /// Sets the fixed delay between reconnect attempts.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.reconnect_config.retry_interval = interval;
        self
    }

    /// Sets the maximum reconnection attempts (0 = unlimited).
    #[must_use]
    pub fn max_reconnect_attempts(mut self, max: usize) -> Self {
        self.reconnect_config.max_attempts = max;
        self
    }

    /// Replaces the whole reconnect configuration.
    #[must_use]
    pub fn reconnect_config(mut self, config: ReconnectConfig) -> Self {
        self.reconnect_config = config;
        self
    }

    /// Builds the driver and the hub handle.
    ///
    /// The driver does nothing until [`HubDriver::run`] is spawned;
    /// subscriptions made before that are sent on the first connect.
    #[must_use]
    pub fn build(self) -> (HubDriver<C>, Hub) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new());

        let driver = HubDriver::new(
            self.connector,
            ReconnectState::new(self.reconnect_config),
            Arc::clone(&shared),
            cmd_rx,
        );
        let hub = Hub::new(shared, cmd_tx);

        (driver, hub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ConnectionState;
    use tickbook_transport::memory_connector;

    #[test]
    fn test_builder_defaults() {
        let (connector, _listener) = memory_connector();
        let builder = HubBuilder::new(connector);
        assert_eq!(builder.reconnect_config.retry_interval, Duration::from_millis(3000));
        assert_eq!(builder.reconnect_config.max_attempts, 10);
        assert_eq!(builder.reconnect_config.connect_timeout, Duration::from_secs(5));
        assert!(builder.reconnect_config.enabled);
    }

    #[test]
    fn test_builder_overrides() {
        let (connector, _listener) = memory_connector();
        let builder = HubBuilder::new(connector)
            .connect_timeout(Duration::from_secs(1))
            .retry_interval(Duration::from_millis(250))
            .max_reconnect_attempts(3)
            .reconnect(false);

        assert_eq!(builder.reconnect_config.connect_timeout, Duration::from_secs(1));
        assert_eq!(builder.reconnect_config.retry_interval, Duration::from_millis(250));
        assert_eq!(builder.reconnect_config.max_attempts, 3);
        assert!(!builder.reconnect_config.enabled);
    }

    #[test]
    fn test_build_starts_disconnected() {
        let (connector, _listener) = memory_connector();
        let (_driver, hub) = HubBuilder::new(connector).build();
        assert_eq!(hub.state(), ConnectionState::Disconnected);
        assert!(hub.tracked_symbols().is_empty());
    }
}
