//! Transport layer for the `LeagueWire` event distribution service.
//!
//! Two channels carry every published event:
//!
//! ```text
//! publish(record)
//!     |
//!     +-- Durable copy + push notify --> DurableBroadcast (NATS + SharedStore)
//!     |
//!     +-- Short-lived feed entry ------> SharedStore fallback feed (polled)
//! ```
//!
//! The distribution core consumes both through the [`PushTransport`] /
//! [`PollTransport`] traits and never sees a NATS subject or a store key.
//! Loopback adapters provide the same contracts in-process.
//!
//! # Modules
//!
//! - [`transport`] -- The channel traits and the raw record stream type
//! - [`record`] -- Durable and fallback wire records
//! - [`nats`] -- NATS-backed primary channel
//! - [`store`] -- Shared store (Redis-compatible) operations
//! - [`loopback`] -- In-process adapters for tests and single-process use
//! - [`error`] -- Shared error type

pub mod error;
pub mod loopback;
pub mod nats;
pub mod record;
pub mod store;
pub mod transport;

// Re-export primary types for convenience.
pub use error::ChannelError;
pub use loopback::{LoopbackPoll, LoopbackPush};
pub use nats::DurableBroadcast;
pub use record::{DurableRecord, FallbackRecord};
pub use store::SharedStore;
pub use transport::{DEFAULT_RETENTION, PollTransport, PushTransport, RecordStream};
