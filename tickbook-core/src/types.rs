//! Shared book types.
//!
//! Prices and amounts are [`Decimal`] throughout so bucket boundaries and
//! running totals are exact.

use crate::numeric::{coerce_count, coerce_decimal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Order book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bid (buy) side, best price is the highest.
    Bid,
    /// Ask (sell) side, best price is the lowest.
    Ask,
}

impl Side {
    /// Orders two prices best-first for this side.
    #[inline]
    #[must_use]
    pub fn rank(self, a: &Decimal, b: &Decimal) -> Ordering {
        match self {
            Self::Bid => b.cmp(a),
            Self::Ask => a.cmp(b),
        }
    }

    /// Returns the better of two prices for this side.
    #[inline]
    #[must_use]
    pub fn better(self, a: Decimal, b: Decimal) -> Decimal {
        match self.rank(&a, &b) {
            Ordering::Greater => b,
            _ => a,
        }
    }
}

/// One raw resting-order aggregate at a price point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LenientLevel")]
pub struct Level {
    /// Price of the level.
    pub price: Decimal,
    /// Total amount resting at this price.
    pub amount: Decimal,
    /// Number of underlying orders.
    pub count: u32,
}

impl Level {
    /// Creates a new level.
    #[must_use]
    pub fn new(price: Decimal, amount: Decimal, count: u32) -> Self {
        Self {
            price,
            amount,
            count,
        }
    }
}

/// Wire shape of a level before numeric coercion.
#[derive(Deserialize)]
struct LenientLevel {
    #[serde(default)]
    price: Value,
    #[serde(default)]
    amount: Value,
    #[serde(default)]
    count: Value,
}

impl From<LenientLevel> for Level {
    fn from(raw: LenientLevel) -> Self {
        Self {
            price: coerce_decimal(&raw.price, "price"),
            amount: coerce_decimal(&raw.amount, "amount"),
            count: coerce_count(&raw.count, "count"),
        }
    }
}

/// One display-ready row of an aggregated book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedLevel {
    /// Bucket (or exact) price of the row.
    pub price: Decimal,
    /// Amount in this row.
    pub amount: Decimal,
    /// Cumulative amount from the best price through this row.
    pub total: Decimal,
    /// Number of underlying orders in this row.
    pub count: u32,
    /// Whether this row collapses everything beyond the display cap.
    pub is_remainder: bool,
}

/// Chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token pair traded on a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    /// Base token.
    pub base: String,
    /// Quote token.
    pub quote: String,
}

impl TokenPair {
    /// Creates a new token pair.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Raw resting-order levels for one pair, as delivered by a depth source.
///
/// Owned by the caller for the duration of a single view request.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOrderBook {
    /// Chain the pair trades on.
    pub chain: ChainId,
    /// Traded pair.
    pub pair: TokenPair,
    /// Bid levels, in any order.
    pub bids: Vec<Level>,
    /// Ask levels, in any order.
    pub asks: Vec<Level>,
    /// Source timestamp in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Current spot price, when the source knows it.
    pub spot_price: Option<Decimal>,
}

impl RawOrderBook {
    /// Returns the levels of one side.
    #[must_use]
    pub fn side(&self, side: Side) -> &[Level] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Returns the best price on one side.
    #[must_use]
    pub fn best_price(&self, side: Side) -> Option<Decimal> {
        best_price(self.side(side), side)
    }
}

/// Returns the best price among `levels` for `side`.
#[must_use]
pub fn best_price(levels: &[Level], side: Side) -> Option<Decimal> {
    levels
        .iter()
        .map(|l| l.price)
        .reduce(|best, price| side.better(best, price))
}
