//! Real-time event distribution for the league platform.
//!
//! Domain services publish league-scoped events; every interested client
//! process receives them through a push watcher on the primary channel,
//! with a polling fallback feed covering the gaps. Delivery is
//! at-least-once across the two transports, with per-process dedup, and
//! targeting never filters delivery -- it only flags which surface a
//! consumer should show.
//!
//! ```text
//! domain service
//!     |
//!     +-- publish(event) --> PushTransport (durable copy + notify)
//!     |                  +-> PollTransport (bounded recent feed)
//!     |
//! watcher / poller (per process)
//!     |
//!     +-- Dispatcher: decode -> dedup -> fan out -> cleanup
//!             |
//!             +-- league-scoped sinks, then wildcard sinks
//! ```
//!
//! # Modules
//!
//! - [`distributor`] -- The service facade: publish, subscribe, lifecycle
//! - [`dispatch`] -- The decode-filter-deliver sequence, shared by both
//!   channels
//! - [`registry`] -- Scope key to sink-set table with watcher lifecycle
//! - [`sink`] -- The subscriber contract and the delivered event view
//! - [`dedup`] -- Bounded recent-id window
//! - [`toast`] -- Toast rendering for UI consumption
//! - [`config`] -- Distributor configuration and environment loading
//! - [`error`] -- The surfaced error taxonomy

pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod distributor;
pub mod error;
pub mod registry;
pub mod sink;
pub mod toast;

// Re-export primary types for convenience.
pub use config::{DistributorConfig, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use dedup::DedupWindow;
pub use dispatch::Dispatcher;
pub use distributor::{EventDistributor, Subscription};
pub use error::DistributeError;
pub use registry::{SubscriptionId, SubscriptionRegistry};
pub use sink::{Delivery, EventSink};
pub use toast::{Toast, ToastFeed, ToastKind};
