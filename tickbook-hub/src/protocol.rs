//! Wire frames of the price stream.
//!
//! ```text
//! -> {"type":"subscribe","symbols":["ETH","BTC"]}
//! -> {"type":"unsubscribe","symbols":["BTC"]}
//! <- {"type":"price_update","symbol":"ETH","data":{"bid":"1999.5","ask":"2000.5","mid":"2000"}}
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tickbook_core::numeric::{coerce_decimal, coerce_optional_decimal};

/// Message type carried by price ticks.
pub const PRICE_UPDATE: &str = "price_update";

/// Frame sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Start streaming `symbols`.
    Subscribe {
        /// Symbols to add.
        symbols: Vec<String>,
    },
    /// Stop streaming `symbols`.
    Unsubscribe {
        /// Symbols to drop.
        symbols: Vec<String>,
    },
}

impl OutboundFrame {
    /// Encodes the frame as JSON text.
    ///
    /// # Errors
    /// Returns `serde_json::Error` if encoding fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frame received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message type, e.g. `price_update`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Symbol the message concerns, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Type-specific payload.
    #[serde(default)]
    pub data: Value,
}

impl InboundMessage {
    /// Creates a message.
    pub fn new(kind: impl Into<String>, symbol: Option<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            symbol,
            data,
        }
    }

    /// Decodes a frame.
    ///
    /// # Errors
    /// Returns `serde_json::Error` if the text is not a message object.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns the key subscribers are matched on: the symbol, or the
    /// message type when there is no symbol.
    #[must_use]
    pub fn route_key(&self) -> Option<&str> {
        self.symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| Some(self.kind.as_str()).filter(|k| !k.is_empty()))
    }

    /// Extracts a price tick from a `price_update` message.
    ///
    /// Malformed prices read as zero; a missing mid is derived from bid and
    /// ask.
    #[must_use]
    pub fn tick(&self) -> Option<Tick> {
        if self.kind != PRICE_UPDATE {
            return None;
        }
        let symbol = self.symbol.clone()?;
        let data = self.data.as_object()?;

        let bid = coerce_decimal(data.get("bid").unwrap_or(&Value::Null), "bid");
        let ask = coerce_decimal(data.get("ask").unwrap_or(&Value::Null), "ask");
        let mid = coerce_optional_decimal(data.get("mid"), "mid").unwrap_or_else(|| {
            bid.checked_add(ask)
                .map(|sum| sum / Decimal::TWO)
                .unwrap_or_else(|| {
                    tracing::warn!(%symbol, %bid, %ask, "mid overflows, halving each side");
                    bid / Decimal::TWO + ask / Decimal::TWO
                })
        });

        Some(Tick {
            symbol,
            bid,
            ask,
            mid,
        })
    }
}

/// Best bid/ask snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    /// Symbol.
    pub symbol: String,
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Mid price.
    pub mid: Decimal,
}
