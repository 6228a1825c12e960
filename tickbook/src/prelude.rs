//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use tickbook::prelude::*;
//! ```

// Core types
pub use tickbook_core::error::{Error as CoreError, Result as CoreResult};
pub use tickbook_core::{AggregatedLevel, ChainId, Decimal, Level, RawOrderBook, Side, TokenPair};

// Depth types
pub use tickbook_depth::{
    DEFAULT_DISPLAY_CAP, DepthError, DepthResponse, DepthService, DepthSource, DepthView,
    SourceError, Spread, SpreadStatus, StepPercent, ViewParams, aggregate, build_view, filter,
    reference_price,
};

// Transport types
#[cfg(feature = "ws")]
pub use tickbook_transport::WsConnector;
pub use tickbook_transport::{Connection, Connector, TransportError, memory_connector};

// Hub types
pub use tickbook_hub::{
    ConnectionState, Hub, HubBuilder, HubDriver, HubError, InboundMessage, ObserverId,
    OutboundFrame, ReconnectConfig, StatusEvent, SubscriptionId, Tick, WILDCARD,
};
