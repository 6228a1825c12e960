//! Depth aggregation.
//!
//! Turns raw levels of one book side into ranked display rows. Without a
//! reference price levels are grouped by exact price. With one, levels fall
//! into percentage buckets anchored at the reference:
//!
//! ```text
//! width     = reference * step / 100
//! bid index = floor((reference - price) / width)   bucket = reference - index * width
//! ask index = ceil((price - reference) / width)    bucket = reference + index * width
//! ```
//!
//! Rows past the display cap collapse into one trailing remainder row so the
//! side's total amount is preserved.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tickbook_core::{AggregatedLevel, Error, Level, Result, Side};

/// Number of rows shown per side unless the caller asks otherwise.
pub const DEFAULT_DISPLAY_CAP: usize = 14;

/// Bucket width as a percentage of the reference price.
///
/// Always strictly positive; exact-price grouping is selected by omitting
/// the reference price, never by a zero step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct StepPercent(Decimal);

impl StepPercent {
    /// 0.01 %.
    pub const BASIS_POINT: Self = Self(Decimal::from_parts(1, 0, 0, false, 2));
    /// 0.25 %.
    pub const QUARTER: Self = Self(Decimal::from_parts(25, 0, 0, false, 2));
    /// 0.5 %.
    pub const HALF: Self = Self(Decimal::from_parts(5, 0, 0, false, 1));
    /// 1 %.
    pub const ONE: Self = Self(Decimal::ONE);

    /// Steps offered to users.
    pub const PRESETS: [Self; 4] = [Self::BASIS_POINT, Self::QUARTER, Self::HALF, Self::ONE];

    /// Creates a step, rejecting zero and negative values.
    ///
    /// # Errors
    /// Returns [`Error::InvalidStep`] if `step <= 0`.
    pub fn new(step: Decimal) -> Result<Self> {
        if step <= Decimal::ZERO {
            return Err(Error::invalid_step(step));
        }
        Ok(Self(step))
    }

    /// Returns the step in percent.
    #[inline]
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl Default for StepPercent {
    fn default() -> Self {
        Self::BASIS_POINT
    }
}

impl TryFrom<Decimal> for StepPercent {
    type Error = Error;

    fn try_from(step: Decimal) -> Result<Self> {
        Self::new(step)
    }
}

impl From<StepPercent> for Decimal {
    fn from(step: StepPercent) -> Self {
        step.0
    }
}

/// Intermediate row before running totals.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    price: Decimal,
    amount: Decimal,
    count: u32,
}

impl Bucket {
    fn absorb(&mut self, amount: Decimal, count: u32) {
        self.amount = saturating_sum(self.amount, amount);
        self.count = self.count.saturating_add(count);
    }
}

/// Adds two amounts, pinning at `Decimal::MAX`/`Decimal::MIN` on overflow.
fn saturating_sum(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| {
        tracing::warn!(%a, %b, "amount sum overflows, saturating");
        a.saturating_add(b)
    })
}

/// Aggregates one side of a book into display rows.
///
/// A missing or non-positive `reference_price` selects exact-price grouping.
/// Rows come out best-first: descending for bids, ascending for asks.
///
/// # Errors
/// Returns [`Error::InvalidDisplayCap`] if `display_cap` is zero.
pub fn aggregate(
    levels: &[Level],
    side: Side,
    step: StepPercent,
    reference_price: Option<Decimal>,
    display_cap: usize,
) -> Result<Vec<AggregatedLevel>> {
    if display_cap == 0 {
        return Err(Error::invalid_display_cap(display_cap));
    }
    if levels.is_empty() {
        return Ok(Vec::new());
    }

    let buckets = match reference_price.filter(|r| *r > Decimal::ZERO) {
        Some(reference) => bucket_by_step(levels, side, step, reference),
        None => group_by_price(levels, side),
    };

    Ok(accumulate(buckets, display_cap))
}

fn group_by_price(levels: &[Level], side: Side) -> Vec<Bucket> {
    let mut grouped: BTreeMap<Decimal, Bucket> = BTreeMap::new();
    for level in levels {
        grouped
            .entry(level.price)
            .and_modify(|b| b.absorb(level.amount, level.count))
            .or_insert(Bucket {
                price: level.price,
                amount: level.amount,
                count: level.count,
            });
    }

    match side {
        Side::Bid => grouped.into_values().rev().collect(),
        Side::Ask => grouped.into_values().collect(),
    }
}

fn bucket_by_step(
    levels: &[Level],
    side: Side,
    step: StepPercent,
    reference: Decimal,
) -> Vec<Bucket> {
    let width = reference
        .checked_mul(step.value())
        .and_then(|w| w.checked_div(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);
    if width <= Decimal::ZERO {
        tracing::warn!(%reference, step = %step.value(), "bucket width out of range, grouping by exact price");
        return group_by_price(levels, side);
    }

    // Keyed by bucket index: ascending index is best-first on both sides.
    let mut buckets: BTreeMap<Decimal, Bucket> = BTreeMap::new();
    for level in levels {
        let Some((index, price)) = bucket_of(level.price, side, reference, width) else {
            tracing::warn!(price = %level.price, %reference, "level outside bucket range, skipped");
            continue;
        };
        buckets
            .entry(index)
            .and_modify(|b| b.absorb(level.amount, level.count))
            .or_insert(Bucket {
                price,
                amount: level.amount,
                count: level.count,
            });
    }

    buckets.into_values().collect()
}

/// Returns `(index, bucket price)` for a raw price.
fn bucket_of(
    price: Decimal,
    side: Side,
    reference: Decimal,
    width: Decimal,
) -> Option<(Decimal, Decimal)> {
    match side {
        Side::Bid => {
            let index = reference.checked_sub(price)?.checked_div(width)?.floor();
            Some((index, reference.checked_sub(index.checked_mul(width)?)?))
        }
        Side::Ask => {
            let index = price.checked_sub(reference)?.checked_div(width)?.ceil();
            Some((index, reference.checked_add(index.checked_mul(width)?)?))
        }
    }
}

fn accumulate(buckets: Vec<Bucket>, display_cap: usize) -> Vec<AggregatedLevel> {
    let verbatim = if buckets.len() > display_cap {
        display_cap - 1
    } else {
        buckets.len()
    };

    let mut rows = Vec::with_capacity(buckets.len().min(display_cap));
    let mut total = Decimal::ZERO;
    let mut buckets = buckets.into_iter();

    for bucket in buckets.by_ref().take(verbatim) {
        total = saturating_sum(total, bucket.amount);
        rows.push(row(bucket, total, false));
    }

    if let Some(first) = buckets.next() {
        let remainder = buckets.fold(first, |mut acc, b| {
            acc.absorb(b.amount, b.count);
            acc
        });
        total = saturating_sum(total, remainder.amount);
        rows.push(row(remainder, total, true));
    }

    rows
}

fn row(bucket: Bucket, total: Decimal, is_remainder: bool) -> AggregatedLevel {
    AggregatedLevel {
        price: bucket.price,
        amount: bucket.amount,
        total,
        count: bucket.count,
        is_remainder,
    }
}
