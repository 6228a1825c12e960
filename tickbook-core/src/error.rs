//! Error types for tickbook core operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core error type for depth parameters and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Bucket step is zero or negative.
    #[error("invalid step percent: {step} (must be greater than zero)")]
    InvalidStep {
        /// Rejected step, in percent.
        step: Decimal,
    },

    /// Display cap cannot hold a single row.
    #[error("invalid display cap: {cap} (must be at least 1)")]
    InvalidDisplayCap {
        /// Rejected cap.
        cap: usize,
    },

    /// Payload could not be decoded at all.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Creates an invalid step error.
    pub fn invalid_step(step: Decimal) -> Self {
        Self::InvalidStep { step }
    }

    /// Creates an invalid display cap error.
    pub fn invalid_display_cap(cap: usize) -> Self {
        Self::InvalidDisplayCap { cap }
    }
}

/// Result type alias for tickbook core operations.
pub type Result<T> = std::result::Result<T, Error>;
