//! Lenient numeric decoding.
//!
//! Upstream feeds deliver prices and amounts either as JSON numbers or as
//! decimal strings, and occasionally as garbage. A single bad field must not
//! blank a whole depth view, so anything that cannot be read as a number is
//! coerced to zero and reported as a data-quality warning.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use std::str::FromStr;

/// Parses a decimal from plain or scientific notation.
fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Reads `value` as a decimal, coercing anything malformed to zero.
///
/// `field` only labels the warning emitted on coercion.
#[must_use]
pub fn coerce_decimal(value: &Value, field: &str) -> Decimal {
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        tracing::warn!(field, value = %value, "malformed numeric field, coercing to zero");
        Decimal::ZERO
    })
}

/// Like [`coerce_decimal`], but a missing or null value stays absent.
#[must_use]
pub fn coerce_optional_decimal(value: Option<&Value>, field: &str) -> Option<Decimal> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(coerce_decimal(v, field)),
    }
}

/// Reads `value` as an order count, coercing anything malformed to zero.
///
/// Negative or fractional counts are malformed; counts above `u32::MAX`
/// saturate.
#[must_use]
pub fn coerce_count(value: &Value, field: &str) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
        None => {
            tracing::warn!(field, value = %value, "malformed count field, coercing to zero");
            0
        }
    }
}

/// Reads `value` as milliseconds since the Unix epoch.
///
/// Fractional timestamps truncate; negative or malformed ones coerce to zero.
#[must_use]
pub fn coerce_timestamp(value: &Value, field: &str) -> u64 {
    let parsed = match value {
        Value::Null => return 0,
        Value::Number(n) => n
            .as_u64()
            .or_else(|| parse_decimal(&n.to_string()).and_then(|d| d.trunc().to_u64())),
        Value::String(s) => parse_decimal(s).and_then(|d| d.trunc().to_u64()),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        tracing::warn!(field, value = %value, "malformed timestamp, coercing to zero");
        0
    })
}
