//! Events routed by the [`EventBus`](super::EventBus).

use std::sync::Arc;

use crate::base::LogicalName;

/// Discriminant used to route events to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ScanRequest,
    FetchResult,
}

/// Request to locate the content of a copybook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub name: LogicalName,
}

/// Answer to a [`ScanRequest`].
///
/// `found` is always `content.is_some()`; use [`FetchResult::found`] and
/// [`FetchResult::not_found`] to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub name: LogicalName,
    pub content: Option<String>,
    pub found: bool,
    /// Where the provider found the copybook, if it knows.
    pub uri: Option<Arc<str>>,
}

impl FetchResult {
    pub fn found(name: LogicalName, content: impl Into<String>) -> Self {
        Self {
            name,
            content: Some(content.into()),
            found: true,
            uri: None,
        }
    }

    pub fn not_found(name: LogicalName) -> Self {
        Self {
            name,
            content: None,
            found: false,
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<Arc<str>>) -> Self {
        self.uri = Some(uri.into());
        self
    }
}

/// Every event the bus can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ScanRequest(ScanRequest),
    FetchResult(FetchResult),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ScanRequest(_) => EventKind::ScanRequest,
            Event::FetchResult(_) => EventKind::FetchResult,
        }
    }

    /// The copybook this event is about.
    pub fn name(&self) -> &LogicalName {
        match self {
            Event::ScanRequest(request) => &request.name,
            Event::FetchResult(result) => &result.name,
        }
    }
}

impl From<ScanRequest> for Event {
    fn from(request: ScanRequest) -> Self {
        Event::ScanRequest(request)
    }
}

impl From<FetchResult> for Event {
    fn from(result: FetchResult) -> Self {
        Event::FetchResult(result)
    }
}
