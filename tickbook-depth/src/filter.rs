//! Stale level filtering.
//!
//! A bid above the reference price or an ask below it would already have
//! been taken by the market; such quotes are not live depth.

use rust_decimal::Decimal;
use tickbook_core::Level;

/// Drops levels that are economically invalid against `reference_price`.
///
/// Returns the inputs unchanged when there is no reference price or when
/// either side is empty.
#[must_use]
pub fn filter(
    bids: Vec<Level>,
    asks: Vec<Level>,
    reference_price: Option<Decimal>,
) -> (Vec<Level>, Vec<Level>) {
    let Some(reference) = reference_price else {
        return (bids, asks);
    };
    if bids.is_empty() || asks.is_empty() {
        return (bids, asks);
    }

    let (bid_count, ask_count) = (bids.len(), asks.len());
    let bids: Vec<Level> = bids.into_iter().filter(|l| l.price <= reference).collect();
    let asks: Vec<Level> = asks.into_iter().filter(|l| l.price >= reference).collect();

    let dropped = (bid_count - bids.len()) + (ask_count - asks.len());
    if dropped > 0 {
        tracing::debug!(
            %reference,
            dropped_bids = bid_count - bids.len(),
            dropped_asks = ask_count - asks.len(),
            "dropped stale levels"
        );
    }

    (bids, asks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn level(price: Decimal) -> Level {
        Level::new(price, dec!(1), 1)
    }

    #[test]
    fn test_filter_without_reference_is_noop() {
        let bids = vec![level(dec!(105))];
        let asks = vec![level(dec!(95))];
        let (b, a) = filter(bids.clone(), asks.clone(), None);
        assert_eq!(b, bids);
        assert_eq!(a, asks);
    }

    #[test]
    fn test_filter_with_empty_side_is_noop() {
        let bids = vec![level(dec!(105)), level(dec!(99))];
        let (b, a) = filter(bids.clone(), vec![], Some(dec!(100)));
        assert_eq!(b, bids);
        assert!(a.is_empty());
    }

    #[test]
    fn test_filter_drops_crossed_levels() {
        let bids = vec![level(dec!(101)), level(dec!(100)), level(dec!(99))];
        let asks = vec![level(dec!(98)), level(dec!(100)), level(dec!(102))];
        let (b, a) = filter(bids, asks, Some(dec!(100)));

        let bid_prices: Vec<Decimal> = b.iter().map(|l| l.price).collect();
        let ask_prices: Vec<Decimal> = a.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![dec!(100), dec!(99)]);
        assert_eq!(ask_prices, vec![dec!(100), dec!(102)]);
    }

    #[test]
    fn test_filter_can_empty_a_side() {
        let bids = vec![level(dec!(110)), level(dec!(120))];
        let asks = vec![level(dec!(130))];
        let (b, a) = filter(bids, asks, Some(dec!(100)));
        assert!(b.is_empty());
        assert_eq!(a.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_filtered_sides_respect_reference(
            bid_prices in prop::collection::vec(1u32..10_000, 1..40),
            ask_prices in prop::collection::vec(1u32..10_000, 1..40),
            reference in 1u32..10_000,
        ) {
            let bids = bid_prices.into_iter().map(|p| level(Decimal::from(p))).collect();
            let asks = ask_prices.into_iter().map(|p| level(Decimal::from(p))).collect();
            let reference = Decimal::from(reference);

            let (b, a) = filter(bids, asks, Some(reference));
            prop_assert!(b.iter().all(|l| l.price <= reference));
            prop_assert!(a.iter().all(|l| l.price >= reference));
        }
    }
}
