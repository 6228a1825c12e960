//! # tickbook Bench
//!
//! Deterministic fixtures for tickbook benchmarks.

use tickbook_core::{ChainId, Decimal, Level, RawOrderBook, TokenPair};

/// Builds a book of `levels_per_side` levels on each side of `spot`.
///
/// Prices step by 0.07 % of `spot` with a small deterministic jitter so
/// levels land unevenly in buckets. A few stale levels cross the spot.
#[must_use]
pub fn synthetic_book(levels_per_side: usize, spot: Decimal) -> RawOrderBook {
    let tick = spot * Decimal::new(7, 4);
    let level = |i: usize, sign: Decimal| {
        let jitter = Decimal::new(((i * 37) % 11) as i64, 2);
        let price = spot + sign * (Decimal::from(i as u64) * tick + jitter);
        let amount = Decimal::new(((i * 53) % 997 + 1) as i64, 2);
        Level::new(price, amount, 1)
    };

    let bids = (0..levels_per_side)
        .map(|i| level(i, Decimal::NEGATIVE_ONE))
        .chain((1..=2).map(|i| level(i, Decimal::ONE)))
        .collect();
    let asks = (0..levels_per_side)
        .map(|i| level(i, Decimal::ONE))
        .chain((1..=2).map(|i| level(i, Decimal::NEGATIVE_ONE)))
        .collect();

    RawOrderBook {
        chain: ChainId(1),
        pair: TokenPair::new("WETH", "USDC"),
        bids,
        asks,
        timestamp: 1_700_000_000_000,
        spot_price: Some(spot),
    }
}

/// Builds a `price_update` frame for `symbol`.
#[must_use]
pub fn price_update_frame(symbol: &str) -> String {
    format!(
        r#"{{"type":"price_update","symbol":"{symbol}","data":{{"bid":"1999.5","ask":"2000.5","mid":"2000"}}}}"#
    )
}
