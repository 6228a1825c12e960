//! # tickbook Core
//!
//! Core types shared by the depth and subscription crates.
//!
//! This crate provides:
//! - Raw and aggregated price level types
//! - Book side ordering helpers
//! - Lenient numeric decoding for untrusted feed payloads
//! - Error types for depth parameters and decoding

pub mod error;
pub mod numeric;
pub mod types;

pub use error::{Error, Result};
pub use types::{AggregatedLevel, ChainId, Level, RawOrderBook, Side, TokenPair, best_price};

pub use rust_decimal::Decimal;
