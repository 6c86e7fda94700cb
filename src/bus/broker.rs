//! Publish/subscribe broker.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};
use rustc_hash::FxHashMap;

use super::events::{Event, EventKind};

/// Callback invoked for every event of the kind it subscribed to.
pub type Observer = Arc<dyn Fn(&Event) + Send + Sync>;

/// Identifies one registration on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registration {
    id: SubscriptionId,
    observer: Observer,
}

/// Delivery state of the thread holding the dispatch lock.
#[derive(Default)]
struct Dispatch {
    delivering: bool,
    /// Events published from inside an observer, with their subscriber
    /// snapshots, waiting for the current delivery to finish.
    pending: VecDeque<(Event, Vec<Observer>)>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    observers: RwLock<FxHashMap<EventKind, Vec<Registration>>>,
    /// Serializes delivery so every subscriber sees events in publish order.
    /// Re-entrant: an observer may publish from inside its callback, and the
    /// nested event is delivered once the current one reached everybody.
    dispatch: ReentrantMutex<RefCell<Dispatch>>,
}

impl BusInner {
    fn remove(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        for registrations in observers.values_mut() {
            if let Some(index) = registrations.iter().position(|r| r.id == id) {
                registrations.remove(index);
                return true;
            }
        }
        false
    }
}

/// Routes events from publishers to the observers subscribed to their kind.
///
/// The bus interprets nothing: it snapshots the subscribers of the event's
/// kind and calls them in subscription order on the publishing thread. It is
/// a cheap `Clone` handle; every clone talks to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer` for future events of `kind`.
    ///
    /// The registration lives as long as the returned [`Subscription`].
    pub fn subscribe<F>(&self, kind: EventKind, observer: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .observers
            .write()
            .entry(kind)
            .or_default()
            .push(Registration {
                id,
                observer: Arc::new(observer),
            });
        tracing::trace!(?kind, ?id, "subscribed");
        Subscription {
            id,
            kind,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.remove(id)
    }

    /// Deliver `event` to every current subscriber of its kind.
    ///
    /// A panicking observer is logged and skipped; the remaining observers
    /// still receive the event. An event published from inside an observer
    /// is queued and delivered before the outer `publish` returns, after
    /// the outer event has reached all of its subscribers.
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let observers = self.snapshot(event.kind());

        let dispatch = self.inner.dispatch.lock();
        {
            let mut state = dispatch.borrow_mut();
            if state.delivering {
                tracing::trace!(kind = ?event.kind(), "queueing nested event");
                state.pending.push_back((event, observers));
                return;
            }
            state.delivering = true;
        }

        let mut next = Some((event, observers));
        while let Some((event, observers)) = next {
            deliver(&event, observers);
            let mut state = dispatch.borrow_mut();
            next = state.pending.pop_front();
            if next.is_none() {
                state.delivering = false;
            }
        }
    }

    fn snapshot(&self, kind: EventKind) -> Vec<Observer> {
        self.inner
            .observers
            .read()
            .get(&kind)
            .map(|registrations| registrations.iter().map(|r| r.observer.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of observers currently registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner
            .observers
            .read()
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observers = self.inner.observers.read();
        f.debug_struct("EventBus")
            .field(
                "scan_request_subscribers",
                &observers.get(&EventKind::ScanRequest).map_or(0, Vec::len),
            )
            .field(
                "fetch_result_subscribers",
                &observers.get(&EventKind::FetchResult).map_or(0, Vec::len),
            )
            .finish()
    }
}

fn deliver(event: &Event, observers: Vec<Observer>) {
    let kind = event.kind();
    tracing::trace!(
        ?kind,
        name = %event.name(),
        subscribers = observers.len(),
        "publishing event"
    );

    for observer in observers {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| observer(event))) {
            tracing::error!(
                ?kind,
                name = %event.name(),
                "event observer panicked: {}",
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Guard for a registration; unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}
