//! # tickbook Depth
//!
//! Depth view construction for DEX order books.
//!
//! This crate provides:
//! - Stale level filtering against a reference price
//! - Exact-price and percentage-bucket aggregation with a display cap
//! - Spread health checks
//! - A request/response source seam and a service tying it all together

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod source;
pub mod view;

pub use aggregate::{DEFAULT_DISPLAY_CAP, StepPercent, aggregate};
pub use error::{DepthError, SourceError};
pub use filter::filter;
pub use source::{DepthResponse, DepthService, DepthSource};
pub use view::{DepthView, Spread, SpreadStatus, ViewParams, build_view, reference_price};
