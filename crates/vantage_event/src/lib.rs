//! # vantage_event - Typed Signals
//!
//! Synchronous publish/subscribe for editor state changes:
//! - One `Signal<E>` per named channel, typed by its payload
//! - Handlers run on the emitting thread, in subscription order
//! - Each emit delivers to a snapshot of the subscribers taken when it starts

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Trait for signal payloads
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Signal handler function type
pub type SignalHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

/// A named channel carrying payloads of type `E`
pub struct Signal<E: Event> {
    name: &'static str,
    slots: RwLock<Vec<(SubscriberId, SignalHandler<E>)>>,
    next_subscriber_id: AtomicU64,
}

impl<E: Event> Signal<E> {
    /// Create a signal with no subscribers
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: RwLock::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribe a handler. Handlers are called in the order they connect.
    pub fn connect<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id.fetch_add(1, Ordering::Relaxed));
        self.slots.write().push((id, Arc::new(handler)));
        id
    }

    /// Unsubscribe. Returns false if the id was not connected.
    ///
    /// An emit already in progress still delivers to this handler.
    pub fn disconnect(&self, id: SubscriberId) -> bool {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|(sub_id, _)| *sub_id != id);
        slots.len() != before
    }

    pub fn disconnect_all(&self) {
        self.slots.write().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots.read().len()
    }

    /// Deliver `payload` to every current subscriber and return how many ran.
    ///
    /// The slot lock is released before any handler runs, so handlers may
    /// connect or disconnect on this same signal.
    pub fn emit(&self, payload: &E) -> usize {
        let snapshot: Vec<SignalHandler<E>> = self
            .slots
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        log::trace!("signal '{}' -> {} subscriber(s)", self.name, snapshot.len());

        for handler in &snapshot {
            handler(payload);
        }
        snapshot.len()
    }
}

impl<E: Event> std::fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, Signal, SignalHandler, SubscriberId};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct TestEvent(i32);

    #[test]
    fn test_signal_emit() {
        let signal = Signal::new("test");
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        signal.connect(move |e: &TestEvent| {
            counter_clone.fetch_add(e.0 as u32, Ordering::SeqCst);
        });

        assert_eq!(signal.emit(&TestEvent(42)), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_subscription_order() {
        let signal = Signal::new("order");
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let order1 = order.clone();
        let order2 = order.clone();

        signal.connect(move |e: &TestEvent| order1.lock().push(("first", e.0)));
        signal.connect(move |e: &TestEvent| order2.lock().push(("second", e.0)));

        signal.emit(&TestEvent(7));

        let received = order.lock();
        assert_eq!(*received, vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::new("disconnect");
        let id = signal.connect(|_: &TestEvent| {});
        assert_eq!(signal.subscriber_count(), 1);

        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        assert_eq!(signal.emit(&TestEvent(0)), 0);
    }
}
