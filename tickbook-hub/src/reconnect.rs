//! Reconnection policy for the hub connection.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Whether reconnection is enabled.
    pub enabled: bool,
    /// Fixed delay between reconnect attempts.
    pub retry_interval: Duration,
    /// Maximum number of reconnect attempts (0 = unlimited).
    pub max_attempts: usize,
    /// Time allowed for a single connect.
    pub connect_timeout: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_interval: Duration::from_millis(3000),
            max_attempts: 10,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Tracks reconnection attempts.
#[derive(Debug)]
pub struct ReconnectState {
    config: ReconnectConfig,
    attempts: usize,
}

impl ReconnectState {
    /// Creates a new reconnect state with the given configuration.
    #[must_use]
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Records a failed or lost connection and returns the delay before the
    /// next attempt.
    ///
    /// Returns `None` if max attempts reached or reconnection is disabled.
    pub fn on_failure(&mut self) -> Option<Duration> {
        if !self.can_retry() {
            return None;
        }
        self.attempts += 1;
        Some(self.config.retry_interval)
    }

    /// Resets the attempt counter after a successful connection.
    pub fn on_success(&mut self) {
        self.attempts = 0;
    }

    /// Grants a fresh attempt budget after an external trigger.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Returns the number of reconnection attempts made.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Returns true if more reconnection attempts are allowed.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.config.enabled
            && (self.config.max_attempts == 0 || self.attempts < self.config.max_attempts)
    }

    /// Returns true if reconnection is enabled at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Returns the per-connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.config.connect_timeout
    }
}
