//! Hub handle shared by subscribers.

use crate::error::HubError;
use crate::protocol::InboundMessage;
use crate::registry::{Callback, SubscriptionId, SubscriptionRegistry, deliver, panic_message};
use crate::state::{ConnectionState, ObserverId, StatusEvent};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

type StatusObserver = Arc<dyn Fn(&StatusEvent) + Send + Sync>;

/// Commands sent from hub handles to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubCommand {
    /// A callback was added; also wakes a hub that gave up reconnecting.
    Subscribed,
    /// A callback was removed.
    Unsubscribed,
    /// Reconnect now with a fresh attempt budget.
    Reconnect,
    /// Close the connection and stop the driver.
    Shutdown,
}

/// State shared between hub handles and the driver.
pub(crate) struct Shared {
    registry: RwLock<SubscriptionRegistry>,
    state: RwLock<ConnectionState>,
    observers: RwLock<Vec<(ObserverId, StatusObserver)>>,
    next_id: AtomicU64,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            registry: RwLock::new(SubscriptionRegistry::new()),
            state: RwLock::new(ConnectionState::Disconnected),
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub(crate) fn tracked_symbols(&self) -> BTreeSet<String> {
        self.registry.read().tracked_symbols()
    }

    /// Moves to `next`, notifying observers if the state changed.
    pub(crate) fn set_state(&self, next: ConnectionState) {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        if previous != next {
            tracing::debug!(from = %previous, to = %next, "hub state changed");
            self.emit(&StatusEvent::StateChanged(next));
        }
    }

    /// Notifies every observer, isolating panics.
    pub(crate) fn emit(&self, event: &StatusEvent) {
        let observers: Vec<StatusObserver> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| observer(event))) {
                tracing::error!(
                    ?event,
                    panic = panic_message(payload.as_ref()),
                    "status observer panicked"
                );
            }
        }
    }

    pub(crate) fn dispatch(&self, message: &InboundMessage) -> usize {
        let Some(key) = message.route_key() else {
            tracing::debug!(kind = %message.kind, "dropping message without route key");
            return 0;
        };
        let callbacks: Vec<Callback> = self.registry.read().snapshot(key);
        if callbacks.is_empty() {
            tracing::trace!(key, "no subscribers");
            return 0;
        }
        deliver(&callbacks, message)
    }
}

/// Cloneable handle to the subscription hub.
///
/// Subscriptions, observers and state live here; the connection itself is
/// owned by the [`HubDriver`](crate::driver::HubDriver).
#[derive(Clone)]
pub struct Hub {
    shared: Arc<Shared>,
    cmd_tx: mpsc::UnboundedSender<HubCommand>,
}

impl Hub {
    pub(crate) fn new(shared: Arc<Shared>, cmd_tx: mpsc::UnboundedSender<HubCommand>) -> Self {
        Self { shared, cmd_tx }
    }

    /// Registers `callback` for messages routed to `symbol`.
    ///
    /// `"*"` receives every routed message. A newly tracked symbol is
    /// requested from the server as soon as the connection is open; if the
    /// hub gave up reconnecting, subscribing starts a new attempt cycle.
    pub fn subscribe<F>(&self, symbol: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let symbol = symbol.into();
        let id = SubscriptionId(self.shared.next_id());
        let newly_tracked = self
            .shared
            .registry
            .write()
            .insert(symbol.clone(), id, Arc::new(callback));
        tracing::debug!(%symbol, %id, newly_tracked, "subscribed");
        self.notify(HubCommand::Subscribed);
        id
    }

    /// Removes the callback `id` registered for `symbol`.
    ///
    /// Returns false if no such callback exists. Other callbacks on the same
    /// symbol are unaffected; a symbol left without callbacks is dropped
    /// from the server subscription.
    pub fn unsubscribe(&self, symbol: &str, id: SubscriptionId) -> bool {
        let (removed, still_tracked) = {
            let mut registry = self.shared.registry.write();
            let removed = registry.remove(symbol, id);
            (removed, registry.is_tracked(symbol))
        };
        if removed {
            tracing::debug!(%symbol, %id, still_tracked, "unsubscribed");
            self.notify(HubCommand::Unsubscribed);
        }
        removed
    }

    /// Delivers `message` to the callbacks of its route key and to wildcard
    /// callbacks.
    ///
    /// Callbacks run outside the registry lock, so they may subscribe or
    /// unsubscribe. Returns the number of callbacks that completed.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        self.shared.dispatch(message)
    }

    /// Registers an observer for connection status events.
    pub fn on_status_change<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&StatusEvent) + Send + Sync + 'static,
    {
        let id = ObserverId(self.shared.next_id());
        self.shared.observers.write().push((id, Arc::new(observer)));
        id
    }

    /// Removes a status observer. Returns false if it was not registered.
    pub fn remove_status_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.shared.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Returns the symbols currently requested from the server.
    #[must_use]
    pub fn tracked_symbols(&self) -> BTreeSet<String> {
        self.shared.tracked_symbols()
    }

    /// Asks the driver to reconnect now with a fresh attempt budget.
    ///
    /// Ignored while connected.
    ///
    /// # Errors
    /// Returns [`HubError::Channel`] if the driver has stopped.
    pub fn reconnect(&self) -> Result<(), HubError> {
        self.cmd_tx
            .send(HubCommand::Reconnect)
            .map_err(|_| HubError::Channel)
    }

    /// Closes the connection and stops the driver.
    ///
    /// # Errors
    /// Returns [`HubError::Channel`] if the driver has already stopped.
    pub fn shutdown(&self) -> Result<(), HubError> {
        self.cmd_tx
            .send(HubCommand::Shutdown)
            .map_err(|_| HubError::Channel)
    }

    fn notify(&self, command: HubCommand) {
        // Interest is recorded in the registry either way.
        if self.cmd_tx.send(command).is_err() {
            tracing::debug!(?command, "hub driver not running");
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("state", &self.state())
            .field("registry", &*self.shared.registry.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WILDCARD;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn hub() -> (Hub, mpsc::UnboundedReceiver<HubCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        (Hub::new(Arc::new(Shared::new()), cmd_tx), cmd_rx)
    }

    fn tick(symbol: &str) -> InboundMessage {
        InboundMessage::new("price_update", Some(symbol.into()), json!({"bid": 1, "ask": 2}))
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&InboundMessage) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |msg: &InboundMessage| {
            sink.lock()
                .push(msg.route_key().unwrap_or_default().to_string());
        })
    }

    #[test]
    fn test_subscribe_tracks_symbol_and_notifies() {
        let (hub, mut cmd_rx) = hub();
        hub.subscribe("ETH", |_| {});
        hub.subscribe("ETH", |_| {});

        assert_eq!(hub.tracked_symbols().into_iter().collect::<Vec<_>>(), vec!["ETH"]);
        assert_eq!(cmd_rx.try_recv().unwrap(), HubCommand::Subscribed);
        assert_eq!(cmd_rx.try_recv().unwrap(), HubCommand::Subscribed);
    }

    #[test]
    fn test_unsubscribe_isolation() {
        let (hub, _cmd_rx) = hub();
        let (first, on_first) = recorder();
        let (second, on_second) = recorder();
        let id = hub.subscribe("ETH", on_first);
        hub.subscribe("ETH", on_second);

        assert!(hub.unsubscribe("ETH", id));
        assert!(!hub.unsubscribe("ETH", id));
        assert_eq!(hub.dispatch(&tick("ETH")), 1);

        assert!(first.lock().is_empty());
        assert_eq!(*second.lock(), vec!["ETH".to_string()]);
        assert!(hub.tracked_symbols().contains("ETH"));
    }

    #[test]
    fn test_dispatch_routes_to_symbol_and_wildcard() {
        let (hub, _cmd_rx) = hub();
        let (eth, on_eth) = recorder();
        let (all, on_all) = recorder();
        hub.subscribe("ETH", on_eth);
        hub.subscribe(WILDCARD, on_all);

        assert_eq!(hub.dispatch(&tick("ETH")), 2);
        assert_eq!(hub.dispatch(&tick("BTC")), 1);

        assert_eq!(*eth.lock(), vec!["ETH".to_string()]);
        assert_eq!(*all.lock(), vec!["ETH".to_string(), "BTC".to_string()]);
        assert!(!hub.tracked_symbols().contains(WILDCARD));
        assert_eq!(hub.tracked_symbols().len(), 1);
    }

    #[test]
    fn test_dispatch_falls_back_to_type() {
        let (hub, _cmd_rx) = hub();
        let (seen, on_heartbeat) = recorder();
        hub.subscribe("heartbeat", on_heartbeat);

        let msg = InboundMessage::from_json(r#"{"type":"heartbeat"}"#).unwrap();
        assert_eq!(hub.dispatch(&msg), 1);
        assert_eq!(*seen.lock(), vec!["heartbeat".to_string()]);
    }

    #[test]
    fn test_panicking_callback_does_not_block_others() {
        let (hub, _cmd_rx) = hub();
        let (seen, on_eth) = recorder();
        hub.subscribe("ETH", |_| panic!("bad subscriber"));
        hub.subscribe("ETH", on_eth);

        assert_eq!(hub.dispatch(&tick("ETH")), 1);
        assert_eq!(hub.dispatch(&tick("ETH")), 1);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_callback_can_unsubscribe_itself() {
        let (hub, _cmd_rx) = hub();
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let id = {
            let handle = hub.clone();
            let hits = Arc::clone(&hits);
            let slot = Arc::clone(&slot);
            hub.subscribe("ETH", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = *slot.lock() {
                    handle.unsubscribe("ETH", id);
                }
            })
        };
        *slot.lock() = Some(id);

        hub.dispatch(&tick("ETH"));
        hub.dispatch(&tick("ETH"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(hub.tracked_symbols().is_empty());
    }

    #[test]
    fn test_status_observers() {
        let (hub, _cmd_rx) = hub();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let id = hub.on_status_change(move |event| sink.lock().push(event.clone()));
        hub.on_status_change(|_| panic!("bad observer"));

        hub.shared.set_state(ConnectionState::Connecting);
        hub.shared.set_state(ConnectionState::Connecting);
        assert_eq!(
            *events.lock(),
            vec![StatusEvent::StateChanged(ConnectionState::Connecting)]
        );
        assert_eq!(hub.state(), ConnectionState::Connecting);

        assert!(hub.remove_status_observer(id));
        assert!(!hub.remove_status_observer(id));
        hub.shared.set_state(ConnectionState::Connected);
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn test_commands_fail_once_driver_is_gone() {
        let (hub, cmd_rx) = hub();
        drop(cmd_rx);
        assert!(matches!(hub.reconnect(), Err(HubError::Channel)));
        assert!(matches!(hub.shutdown(), Err(HubError::Channel)));
        // Interest is still recorded.
        hub.subscribe("ETH", |_| {});
        assert!(hub.tracked_symbols().contains("ETH"));
    }
}
