//! Event bus: decouples "something needs copybook X" from "here is X".
//!
//! Resolution tasks publish [`ScanRequest`]s and wait for the matching
//! [`FetchResult`]; copybook providers do the opposite. Neither side knows
//! about the other, only about the bus instance they were handed.
//!
//! ```text
//! ResolutionTask ──ScanRequest──▶ EventBus ──▶ CopybookProvider
//!       ▲                                             │
//!       └──────────── FetchResult ◀── EventBus ◀──────┘
//! ```

mod broker;
mod events;

pub use broker::{EventBus, Observer, Subscription, SubscriptionId};
pub use events::{Event, EventKind, FetchResult, ScanRequest};
