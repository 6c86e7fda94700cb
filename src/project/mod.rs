//! Copybook providers: the components that answer scan requests.
//!
//! A provider subscribes to [`ScanRequest`](crate::bus::ScanRequest) events
//! and publishes exactly one [`FetchResult`](crate::bus::FetchResult) per
//! request it handles. A provider that needs to wait for something (a client
//! round trip, a slow disk) must answer from its own thread: observers run
//! while the bus's dispatch lock is held.

mod memory_provider;
mod workspace_provider;

pub use memory_provider::MemoryCopybookProvider;
pub use workspace_provider::{ProviderError, WorkspaceCopybookProvider, file_uri};
