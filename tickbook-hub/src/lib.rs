//! # tickbook Hub
//!
//! One multiplexed price stream shared by many subscribers.
//!
//! This crate provides:
//! - Hub builder with reconnect configuration
//! - Fixed-interval reconnection with a bounded attempt budget
//! - Resubscription of every tracked symbol after a reconnect
//! - Per-symbol and wildcard dispatch with panic isolation
//! - Status observers for connection state and transport errors

pub mod builder;
pub mod driver;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod reconnect;
pub mod registry;
pub mod state;

pub use builder::HubBuilder;
pub use driver::HubDriver;
pub use error::HubError;
pub use hub::{Hub, HubCommand};
pub use protocol::{InboundMessage, OutboundFrame, PRICE_UPDATE, Tick};
pub use reconnect::{ReconnectConfig, ReconnectState};
pub use registry::{SubscriptionId, WILDCARD};
pub use state::{ConnectionState, ObserverId, StatusEvent};
