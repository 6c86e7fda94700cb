//! Copybook resolution task.
//!
//! A task has exactly one suspension point: waiting for the fetch result
//! that answers its scan request. The lifecycle is encoded in the types:
//!
//! ```text
//! ResolutionTask ──start()──▶ PendingTask ──wait()──▶ Resolution
//!   (created)                 (subscribed,            Resolved | NotFound
//!                              request published)     | TimedOut | Cancelled
//! ```
//!
//! The answer is stored in a single-assignment slot written only by the bus
//! dispatch path, never by the waiting task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio_util::sync::CancellationToken;

use crate::base::LogicalName;
use crate::base::constants::CANCELLATION_POLL_INTERVAL;
use crate::bus::{Event, EventBus, EventKind, FetchResult, ScanRequest, Subscription};

#[derive(Debug)]
enum SlotState {
    Pending,
    Filled(FetchResult),
    Taken,
}

/// Single-assignment cell for a task's fetch result.
#[derive(Debug)]
struct FetchSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl FetchSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            ready: Condvar::new(),
        }
    }

    /// Store `result` if nothing was stored yet. Returns `false` otherwise.
    fn complete(&self, result: FetchResult) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, SlotState::Pending) {
            return false;
        }
        *state = SlotState::Filled(result);
        self.ready.notify_all();
        true
    }

    fn is_filled(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Filled(_))
    }
}

/// Outcome of waiting for a copybook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        content: String,
        uri: Option<Arc<str>>,
    },
    NotFound,
    TimedOut,
    Cancelled,
}

impl From<FetchResult> for Resolution {
    fn from(result: FetchResult) -> Self {
        match result.content {
            Some(content) if result.found => Resolution::Resolved {
                content,
                uri: result.uri,
            },
            _ => Resolution::NotFound,
        }
    }
}

/// A copybook reference that has not been requested yet.
#[derive(Debug, Clone)]
pub struct ResolutionTask {
    name: LogicalName,
}

impl ResolutionTask {
    pub fn new(name: LogicalName) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &LogicalName {
        &self.name
    }

    /// Subscribe for the answer, then publish the scan request.
    ///
    /// Subscribing first means a provider that answers synchronously, inside
    /// `publish`, is still heard.
    pub fn start(self, bus: &EventBus, timeout: Duration) -> PendingTask {
        let slot = Arc::new(FetchSlot::new());
        let subscription = {
            let slot = slot.clone();
            let name = self.name.clone();
            bus.subscribe(EventKind::FetchResult, move |event| {
                let Event::FetchResult(result) = event else {
                    return;
                };
                if result.name != name {
                    return;
                }
                if !slot.complete(result.clone()) {
                    tracing::debug!(copybook = %name, "ignoring repeated fetch result");
                }
            })
        };

        tracing::debug!(copybook = %self.name, "requesting copybook");
        bus.publish(ScanRequest {
            name: self.name.clone(),
        });

        PendingTask {
            name: self.name,
            slot,
            deadline: Instant::now() + timeout,
            _subscription: subscription,
        }
    }
}

/// A requested copybook whose answer may not have arrived yet.
///
/// Dropping it unsubscribes from the bus.
#[derive(Debug)]
pub struct PendingTask {
    name: LogicalName,
    slot: Arc<FetchSlot>,
    deadline: Instant,
    _subscription: Subscription,
}

impl PendingTask {
    pub fn name(&self) -> &LogicalName {
        &self.name
    }

    /// Whether the answer has arrived.
    pub fn is_resolved(&self) -> bool {
        self.slot.is_filled()
    }

    /// Block until the answer arrives, the deadline passes, or `cancel` fires.
    pub fn wait(self, cancel: &CancellationToken) -> Resolution {
        let mut state = self.slot.state.lock();
        loop {
            if let SlotState::Filled(_) = *state {
                let SlotState::Filled(result) = std::mem::replace(&mut *state, SlotState::Taken)
                else {
                    unreachable!("slot state checked above");
                };
                tracing::debug!(copybook = %self.name, found = result.found, "copybook answered");
                return result.into();
            }
            if cancel.is_cancelled() {
                return Resolution::Cancelled;
            }
            let now = Instant::now();
            if now >= self.deadline {
                return Resolution::TimedOut;
            }
            let wake = self.deadline.min(now + CANCELLATION_POLL_INTERVAL);
            self.slot.ready.wait_until(&mut state, wake);
        }
    }
}
