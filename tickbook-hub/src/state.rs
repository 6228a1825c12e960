//! Connection state and status events.

use serde::Serialize;
use std::fmt;

/// Lifecycle state of the hub connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(tag = "state", content = "attempt", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no attempt in progress.
    #[default]
    Disconnected,
    /// First connect in progress.
    Connecting,
    /// Connection open.
    Connected,
    /// Waiting for, or running, reconnect attempt `n` (1-based).
    Reconnecting(usize),
}

impl ConnectionState {
    /// Returns true if the connection is open.
    #[must_use]
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Reconnecting(attempt) => write!(f, "reconnecting (attempt {attempt})"),
        }
    }
}

/// Event delivered to status observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// The connection state changed.
    StateChanged(ConnectionState),
    /// A connect failed or an open connection broke.
    TransportError(String),
    /// Every reconnect attempt failed; the hub stays disconnected until
    /// reconnect is requested or a symbol is subscribed.
    RetriesExhausted {
        /// Attempts made before giving up.
        attempts: usize,
    },
}

/// Identifies a registered status observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(
            ConnectionState::Reconnecting(3).to_string(),
            "reconnecting (attempt 3)"
        );
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_state_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Reconnecting(1).is_connected());
    }

    #[test]
    fn test_state_serializes_tagged() {
        let json = serde_json::to_value(ConnectionState::Reconnecting(2)).unwrap();
        assert_eq!(json, serde_json::json!({"state": "reconnecting", "attempt": 2}));
        let json = serde_json::to_value(ConnectionState::Connected).unwrap();
        assert_eq!(json, serde_json::json!({"state": "connected"}));
    }
}
