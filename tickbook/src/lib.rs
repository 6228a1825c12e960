//! # tickbook
//!
//! Depth views for DEX order books and a reconnecting, multiplexed live
//! price stream.
//!
//! ## Features
//!
//! - **Depth aggregation** - Exact-price or percentage-bucket rows with running totals
//! - **Stale level filtering** - Bids above and asks below the spot price are dropped
//! - **Spread health** - Crossed books are flagged instead of rejected
//! - **Subscription hub** - One connection, many subscribers, automatic resubscribe
//!
//! ## Quick Start
//!
//! ```ignore
//! use tickbook::prelude::*;
//!
//! let (driver, hub) = HubBuilder::new(WsConnector::new("wss://prices.example.com/ws"))
//!     .max_reconnect_attempts(10)
//!     .build();
//! tokio::spawn(driver.run());
//!
//! hub.subscribe("ETH", |msg| {
//!     if let Some(tick) = msg.tick() {
//!         println!("{} mid {}", tick.symbol, tick.mid);
//!     }
//! });
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Level types, sides and lenient numeric decoding
//! - [`depth`] - Filtering, aggregation, spread and depth sources
//! - [`transport`] - Connector/connection seam, WebSocket and in-memory transports
//! - [`hub`] - Subscription hub and its connection driver

pub mod prelude;

/// Shared book types.
pub mod core {
    pub use tickbook_core::*;
}

/// Depth view construction.
pub mod depth {
    pub use tickbook_depth::*;
}

/// Text-frame transports.
pub mod transport {
    pub use tickbook_transport::*;
}

/// Subscription hub.
pub mod hub {
    pub use tickbook_hub::*;
}

// Re-export commonly used items at the crate root
pub use tickbook_core::{AggregatedLevel, Decimal, Level, RawOrderBook, Side};
pub use tickbook_depth::{DepthView, StepPercent, ViewParams, build_view};
pub use tickbook_hub::{ConnectionState, Hub, HubBuilder, HubDriver, StatusEvent};
