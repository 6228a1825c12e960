//! Depth view construction: reference price selection, filtering,
//! aggregation of both sides and spread health.

use crate::aggregate::{DEFAULT_DISPLAY_CAP, StepPercent, aggregate};
use crate::filter::filter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tickbook_core::{AggregatedLevel, ChainId, RawOrderBook, Result, Side, TokenPair, best_price};

/// Caller-selectable aggregation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewParams {
    /// Bucket width in percent of the reference price.
    pub step: StepPercent,
    /// Maximum rows per side, including the remainder row.
    pub display_cap: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            step: StepPercent::default(),
            display_cap: DEFAULT_DISPLAY_CAP,
        }
    }
}

impl ViewParams {
    /// Sets the bucket step.
    #[must_use]
    pub fn step(mut self, step: StepPercent) -> Self {
        self.step = step;
        self
    }

    /// Sets the display cap.
    #[must_use]
    pub fn display_cap(mut self, display_cap: usize) -> Self {
        self.display_cap = display_cap;
        self
    }
}

/// Health of the best bid/ask relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadStatus {
    /// Best ask at or above best bid.
    Normal,
    /// Best ask below best bid; upstream filtering should have prevented it.
    Crossed,
}

/// Spread between the best bid and the best ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spread {
    /// `best_ask - best_bid`; negative when crossed.
    pub absolute: Decimal,
    /// Absolute spread as a percentage of the mid price.
    pub percent: Option<Decimal>,
    /// Whether the book is crossed.
    pub status: SpreadStatus,
}

impl Spread {
    /// Computes the spread between two best prices. Never fails: a crossed
    /// book is flagged, not rejected.
    #[must_use]
    pub fn between(best_bid: Decimal, best_ask: Decimal) -> Self {
        let absolute = best_ask.checked_sub(best_bid).unwrap_or_else(|| {
            tracing::warn!(%best_bid, %best_ask, "spread overflows, saturating");
            best_ask.saturating_sub(best_bid)
        });
        // Halving first keeps the mid in range for any pair of prices.
        let mid = best_bid / Decimal::TWO + best_ask / Decimal::TWO;
        let percent = (mid > Decimal::ZERO)
            .then(|| {
                absolute
                    .checked_div(mid)
                    .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            })
            .flatten();
        let status = if best_ask < best_bid {
            tracing::warn!(%best_bid, %best_ask, "crossed book: best ask below best bid");
            SpreadStatus::Crossed
        } else {
            SpreadStatus::Normal
        };
        Self {
            absolute,
            percent,
            status,
        }
    }

    /// Returns true if the book is crossed.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        self.status == SpreadStatus::Crossed
    }
}

/// Display-ready depth for one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthView {
    /// Chain the pair trades on.
    pub chain: ChainId,
    /// Traded pair.
    pub pair: TokenPair,
    /// Bid rows, best first.
    pub bids: Vec<AggregatedLevel>,
    /// Ask rows, best first.
    pub asks: Vec<AggregatedLevel>,
    /// Price anchoring the filter and the buckets, if any.
    pub reference_price: Option<Decimal>,
    /// Spread after filtering, when both sides have levels.
    pub spread: Option<Spread>,
    /// Source timestamp in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Returns the price used to filter and bucket `book`.
///
/// Only a positive spot price qualifies; otherwise the view falls back to
/// exact-price grouping.
#[must_use]
pub fn reference_price(book: &RawOrderBook) -> Option<Decimal> {
    book.spot_price.filter(|p| *p > Decimal::ZERO)
}

/// Builds a depth view from a raw book.
///
/// # Errors
/// Returns an error if `params.display_cap` is zero.
pub fn build_view(book: RawOrderBook, params: &ViewParams) -> Result<DepthView> {
    let reference = reference_price(&book);
    let RawOrderBook {
        chain,
        pair,
        bids,
        asks,
        timestamp,
        ..
    } = book;

    let (bids, asks) = filter(bids, asks, reference);

    let spread = match (best_price(&bids, Side::Bid), best_price(&asks, Side::Ask)) {
        (Some(bid), Some(ask)) => Some(Spread::between(bid, ask)),
        _ => None,
    };

    let bid_rows = aggregate(&bids, Side::Bid, params.step, reference, params.display_cap)?;
    let ask_rows = aggregate(&asks, Side::Ask, params.step, reference, params.display_cap)?;

    tracing::debug!(
        %chain,
        %pair,
        bids = bid_rows.len(),
        asks = ask_rows.len(),
        "built depth view"
    );

    Ok(DepthView {
        chain,
        pair,
        bids: bid_rows,
        asks: ask_rows,
        reference_price: reference,
        spread,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tickbook_core::Level;

    fn book(bids: Vec<Level>, asks: Vec<Level>, spot: Option<Decimal>) -> RawOrderBook {
        RawOrderBook {
            chain: ChainId(1),
            pair: TokenPair::new("WETH", "USDC"),
            bids,
            asks,
            timestamp: 1_700_000_000_000,
            spot_price: spot,
        }
    }

    fn level(price: Decimal, amount: Decimal) -> Level {
        Level::new(price, amount, 1)
    }

    #[test]
    fn test_spread_normal() {
        let spread = Spread::between(dec!(99), dec!(101));
        assert_eq!(spread.absolute, dec!(2));
        assert_eq!(spread.percent, Some(dec!(2)));
        assert_eq!(spread.status, SpreadStatus::Normal);
        assert!(!spread.is_crossed());
    }

    #[test]
    fn test_spread_crossed_is_flagged() {
        let spread = Spread::between(dec!(101), dec!(99));
        assert_eq!(spread.absolute, dec!(-2));
        assert!(spread.is_crossed());
    }

    #[test]
    fn test_spread_extreme_prices_do_not_overflow() {
        let spread = Spread::between(dec!(-50000000000000000000000000000), dec!(50000000000000000000000000000));
        assert_eq!(spread.absolute, Decimal::MAX);
        assert_eq!(spread.percent, None);
        assert_eq!(spread.status, SpreadStatus::Normal);

        let crossed = Spread::between(Decimal::MAX, Decimal::MIN);
        assert_eq!(crossed.absolute, Decimal::MIN);
        assert!(crossed.is_crossed());
    }

    #[test]
    fn test_build_view_survives_oversized_records() {
        let huge = dec!(50000000000000000000000000000);
        let raw = book(
            vec![level(-huge, huge), level(dec!(99), huge), level(dec!(98), huge)],
            vec![level(huge, huge)],
            None,
        );

        let view = build_view(raw, &ViewParams::default()).unwrap();
        assert_eq!(view.bids.len(), 3);
        assert_eq!(view.bids.last().unwrap().total, Decimal::MAX);
        assert_eq!(view.spread.unwrap().absolute, dec!(49999999999999999999999999901));
    }

    #[test]
    fn test_reference_price_requires_positive_spot() {
        assert_eq!(reference_price(&book(vec![], vec![], Some(dec!(100)))), Some(dec!(100)));
        assert_eq!(reference_price(&book(vec![], vec![], Some(Decimal::ZERO))), None);
        assert_eq!(reference_price(&book(vec![], vec![], None)), None);
    }

    #[test]
    fn test_build_view_filters_then_buckets() {
        let raw = book(
            vec![
                level(dec!(101), dec!(9)),
                level(dec!(99.5), dec!(1)),
                level(dec!(98.5), dec!(2)),
            ],
            vec![
                level(dec!(98), dec!(9)),
                level(dec!(100.5), dec!(3)),
                level(dec!(101.5), dec!(4)),
            ],
            Some(dec!(100)),
        );

        let view = build_view(raw, &ViewParams::default().step(StepPercent::ONE)).unwrap();

        let bid_prices: Vec<Decimal> = view.bids.iter().map(|r| r.price).collect();
        let ask_prices: Vec<Decimal> = view.asks.iter().map(|r| r.price).collect();
        assert_eq!(bid_prices, vec![dec!(100), dec!(99)]);
        assert_eq!(ask_prices, vec![dec!(101), dec!(102)]);
        assert_eq!(view.bids.last().unwrap().total, dec!(3));
        assert_eq!(view.asks.last().unwrap().total, dec!(7));
        assert_eq!(view.reference_price, Some(dec!(100)));

        let spread = view.spread.unwrap();
        assert_eq!(spread.absolute, dec!(1));
        assert_eq!(spread.status, SpreadStatus::Normal);
    }

    #[test]
    fn test_build_view_without_spot_uses_exact_mode_and_flags_cross() {
        let raw = book(
            vec![level(dec!(101), dec!(1)), level(dec!(100), dec!(1))],
            vec![level(dec!(99), dec!(1)), level(dec!(102), dec!(1))],
            None,
        );

        let view = build_view(raw, &ViewParams::default()).unwrap();

        assert_eq!(view.bids[0].price, dec!(101));
        assert_eq!(view.asks[0].price, dec!(99));
        assert!(view.spread.unwrap().is_crossed());
        assert_eq!(view.reference_price, None);
    }

    #[test]
    fn test_build_view_one_sided_book_has_no_spread() {
        let raw = book(vec![level(dec!(100), dec!(1))], vec![], Some(dec!(100)));
        let view = build_view(raw, &ViewParams::default()).unwrap();
        assert_eq!(view.bids.len(), 1);
        assert!(view.asks.is_empty());
        assert!(view.spread.is_none());
    }

    #[test]
    fn test_build_view_rejects_zero_cap() {
        let raw = book(vec![level(dec!(100), dec!(1))], vec![], None);
        assert!(build_view(raw, &ViewParams::default().display_cap(0)).is_err());
    }

    #[test]
    fn test_view_serializes_for_ui() {
        let raw = book(vec![level(dec!(100), dec!(1))], vec![level(dec!(101), dec!(1))], None);
        let view = build_view(raw, &ViewParams::default()).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("referencePrice").is_some());
        assert_eq!(json["spread"]["status"], "normal");
        assert_eq!(json["bids"][0]["isRemainder"], false);
    }
}
