//! In-memory copybook provider.
//!
//! Serves copybooks from a map. Answers can be delayed onto a background
//! thread, and selected names can be left unanswered, which is how editors
//! with unsaved buffers and slow clients behave.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::LogicalName;
use crate::bus::{Event, EventBus, EventKind, FetchResult, Subscription};

#[derive(Debug, Default)]
pub struct MemoryCopybookProvider {
    copybooks: RwLock<FxHashMap<LogicalName, String>>,
    silent: RwLock<FxHashSet<LogicalName>>,
    delay: Option<Duration>,
    requests: AtomicUsize,
}

impl MemoryCopybookProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_copybook(self, name: LogicalName, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    /// Answer from a background thread after `delay` instead of inline.
    pub fn deferred(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never answer requests for `name`.
    pub fn with_silent(self, name: LogicalName) -> Self {
        self.silent.write().insert(name);
        self
    }

    pub fn insert(&self, name: LogicalName, content: impl Into<String>) {
        self.copybooks.write().insert(name, content.into());
    }

    pub fn remove(&self, name: &LogicalName) -> Option<String> {
        self.copybooks.write().remove(name)
    }

    /// Scan requests seen so far, answered or not.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn fetch(&self, name: &LogicalName) -> FetchResult {
        match self.copybooks.read().get(name) {
            Some(content) => FetchResult::found(name.clone(), content.clone()),
            None => FetchResult::not_found(name.clone()),
        }
    }

    /// Answer scan requests on `bus` until the returned guard is dropped.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) -> Subscription {
        let provider = Arc::clone(self);
        let responder = bus.clone();
        bus.subscribe(EventKind::ScanRequest, move |event| {
            let Event::ScanRequest(request) = event else {
                return;
            };
            provider.requests.fetch_add(1, Ordering::SeqCst);
            if provider.silent.read().contains(&request.name) {
                tracing::debug!(copybook = %request.name, "leaving request unanswered");
                return;
            }

            let result = provider.fetch(&request.name);
            match provider.delay {
                None => responder.publish(result),
                Some(delay) => {
                    let responder = responder.clone();
                    thread::spawn(move || {
                        thread::sleep(delay);
                        responder.publish(result);
                    });
                }
            }
        })
    }
}
