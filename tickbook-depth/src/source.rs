//! Request/response depth sources.
//!
//! A [`DepthSource`] hands back the raw resting levels for one pair; the
//! [`DepthService`] turns them into a [`DepthView`].

use crate::error::{DepthError, SourceError};
use crate::view::{DepthView, ViewParams, build_view};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tickbook_core::numeric::{coerce_optional_decimal, coerce_timestamp};
use tickbook_core::{ChainId, Level, RawOrderBook, TokenPair};

/// Collaborator that delivers raw depth for a pair.
#[async_trait]
pub trait DepthSource: Send + Sync {
    /// Fetches the current raw book for `pair` on `chain`.
    ///
    /// # Errors
    /// Returns [`SourceError`] if the book cannot be fetched or decoded.
    async fn fetch(&self, chain: ChainId, pair: &TokenPair) -> Result<RawOrderBook, SourceError>;
}

/// Wire shape of a depth response.
///
/// ```json
/// {"bids":[{"price":"99.5","amount":"1","count":1}],"asks":[],
///  "timestamp":1700000000000,"summary":{"spotPrice":"100"}}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DepthResponse {
    /// Bid levels. Entries that are not objects are skipped.
    #[serde(default, deserialize_with = "lenient_levels")]
    pub bids: Vec<Level>,
    /// Ask levels. Entries that are not objects are skipped.
    #[serde(default, deserialize_with = "lenient_levels")]
    pub asks: Vec<Level>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: u64,
    /// Market summary.
    #[serde(default)]
    pub summary: Summary,
}

/// Market summary attached to a depth response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Summary {
    /// Spot price, kept raw until coercion.
    #[serde(default, rename = "spotPrice")]
    pub spot_price: Option<Value>,
}

fn lenient_levels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Level>, D::Error> {
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => {
            tracing::warn!(value = %other, "level list is not an array, treating as empty");
            return Ok(Vec::new());
        }
    };

    let mut levels = Vec::with_capacity(entries.len());
    for entry in entries {
        if !entry.is_object() {
            tracing::warn!(value = %entry, "skipping non-object level entry");
            continue;
        }
        match serde_json::from_value::<Level>(entry) {
            Ok(level) => levels.push(level),
            Err(e) => tracing::warn!(error = %e, "skipping undecodable level entry"),
        }
    }
    Ok(levels)
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(coerce_timestamp(&Value::deserialize(deserializer)?, "timestamp"))
}

impl DepthResponse {
    /// Decodes a response body.
    ///
    /// # Errors
    /// Returns [`SourceError::Decode`] if the body is not a depth response.
    pub fn from_json(body: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Converts the response into a raw book for `pair` on `chain`.
    #[must_use]
    pub fn into_raw(self, chain: ChainId, pair: TokenPair) -> RawOrderBook {
        RawOrderBook {
            chain,
            pair,
            bids: self.bids,
            asks: self.asks,
            timestamp: self.timestamp,
            spot_price: coerce_optional_decimal(self.summary.spot_price.as_ref(), "spotPrice"),
        }
    }
}

/// Fetches raw books and builds views from them.
#[derive(Debug, Clone)]
pub struct DepthService<S> {
    source: S,
}

impl<S: DepthSource> DepthService<S> {
    /// Creates a service over `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches the book for `pair` and builds its view.
    ///
    /// # Errors
    /// Returns [`DepthError::Source`] if the fetch fails and
    /// [`DepthError::Core`] if `params` are invalid.
    pub async fn view(
        &self,
        chain: ChainId,
        pair: &TokenPair,
        params: &ViewParams,
    ) -> Result<DepthView, DepthError> {
        let book = self.source.fetch(chain, pair).await?;
        tracing::debug!(
            %chain,
            %pair,
            bids = book.bids.len(),
            asks = book.asks.len(),
            "fetched raw book"
        );
        Ok(build_view(book, params)?)
    }
}
