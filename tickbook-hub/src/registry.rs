//! Symbol to callback registry.

use crate::protocol::InboundMessage;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Subscription key that receives every routed message. Never sent on the wire.
pub const WILDCARD: &str = "*";

/// Subscriber callback.
pub type Callback = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Identifies one registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Callbacks grouped by symbol.
///
/// A symbol is tracked while it has at least one callback.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: HashMap<String, Vec<(SubscriptionId, Callback)>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callback. Returns true if `symbol` was not tracked before.
    pub fn insert(&mut self, symbol: String, id: SubscriptionId, callback: Callback) -> bool {
        let callbacks = self.entries.entry(symbol).or_default();
        callbacks.push((id, callback));
        callbacks.len() == 1
    }

    /// Removes exactly the callback `id` from `symbol`.
    ///
    /// Returns false if no such callback was registered. A symbol left
    /// without callbacks is untracked.
    pub fn remove(&mut self, symbol: &str, id: SubscriptionId) -> bool {
        let Some(callbacks) = self.entries.get_mut(symbol) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            self.entries.remove(symbol);
        }
        removed
    }

    /// Returns true if `symbol` has at least one callback.
    #[must_use]
    pub fn is_tracked(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    /// Returns the symbols to request from the server.
    #[must_use]
    pub fn tracked_symbols(&self) -> BTreeSet<String> {
        self.entries
            .keys()
            .filter(|symbol| symbol.as_str() != WILDCARD)
            .cloned()
            .collect()
    }

    /// Returns the callbacks for `key` followed by the wildcard callbacks.
    #[must_use]
    pub fn snapshot(&self, key: &str) -> Vec<Callback> {
        let exact = self.entries.get(key).into_iter().flatten();
        let wildcard = if key == WILDCARD {
            None
        } else {
            self.entries.get(WILDCARD)
        };
        exact
            .chain(wildcard.into_iter().flatten())
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    /// Returns the number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns true if no callback is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(symbol, cbs)| (symbol, cbs.len())))
            .finish()
    }
}

/// Invokes each callback with `message`, isolating panics.
///
/// Returns the number of callbacks that completed.
pub fn deliver(callbacks: &[Callback], message: &InboundMessage) -> usize {
    callbacks
        .iter()
        .filter(|callback| match catch_unwind(AssertUnwindSafe(|| callback(message))) {
            Ok(()) => true,
            Err(payload) => {
                tracing::error!(
                    key = message.route_key().unwrap_or_default(),
                    panic = panic_message(payload.as_ref()),
                    "subscriber callback panicked"
                );
                false
            }
        })
        .count()
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let callback: Callback = Arc::new(move |_: &InboundMessage| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, callback)
    }

    fn message(symbol: &str) -> InboundMessage {
        InboundMessage::new("price_update", Some(symbol.to_string()), Value::Null)
    }

    #[test]
    fn test_insert_reports_new_symbols() {
        let mut registry = SubscriptionRegistry::new();
        let (_, a) = counter();
        let (_, b) = counter();

        assert!(registry.insert("ETH".into(), SubscriptionId(1), a));
        assert!(!registry.insert("ETH".into(), SubscriptionId(2), b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_exact_callback() {
        let mut registry = SubscriptionRegistry::new();
        let (_, a) = counter();
        let (_, b) = counter();
        registry.insert("ETH".into(), SubscriptionId(1), a);
        registry.insert("ETH".into(), SubscriptionId(2), b);

        assert!(registry.remove("ETH", SubscriptionId(1)));
        assert!(!registry.remove("ETH", SubscriptionId(1)));
        assert!(registry.is_tracked("ETH"));

        assert!(registry.remove("ETH", SubscriptionId(2)));
        assert!(!registry.is_tracked("ETH"));
        assert!(registry.is_empty());
        assert!(!registry.remove("BTC", SubscriptionId(3)));
    }

    #[test]
    fn test_tracked_symbols_exclude_wildcard() {
        let mut registry = SubscriptionRegistry::new();
        let (_, a) = counter();
        let (_, b) = counter();
        registry.insert(WILDCARD.into(), SubscriptionId(1), a);
        registry.insert("BTC".into(), SubscriptionId(2), b);

        let tracked: Vec<String> = registry.tracked_symbols().into_iter().collect();
        assert_eq!(tracked, vec!["BTC".to_string()]);
    }

    #[test]
    fn test_snapshot_includes_wildcard_once() {
        let mut registry = SubscriptionRegistry::new();
        let (_, a) = counter();
        let (_, b) = counter();
        registry.insert("ETH".into(), SubscriptionId(1), a);
        registry.insert(WILDCARD.into(), SubscriptionId(2), b);

        assert_eq!(registry.snapshot("ETH").len(), 2);
        assert_eq!(registry.snapshot("BTC").len(), 1);
        assert_eq!(registry.snapshot(WILDCARD).len(), 1);
    }

    #[test]
    fn test_deliver_isolates_panics() {
        let (hits, ok) = counter();
        let boom: Callback = Arc::new(|_: &InboundMessage| panic!("subscriber bug"));
        let (later_hits, later) = counter();

        let delivered = deliver(&[ok, boom, later], &message("ETH"));

        assert_eq!(delivered, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(later_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
