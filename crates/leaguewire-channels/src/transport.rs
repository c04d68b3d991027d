//! The transport contract both channels implement.
//!
//! The distribution core never talks to NATS or the shared store directly;
//! it holds a [`PushTransport`] and a [`PollTransport`] and feeds whatever
//! they deliver through one dispatcher. Production wires in
//! [`DurableBroadcast`](crate::nats::DurableBroadcast) and
//! [`SharedStore`](crate::store::SharedStore); tests and single-process
//! deployments wire in the loopback adapters.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use leaguewire_types::{EventId, Scope};

use crate::error::ChannelError;
use crate::record::{DurableRecord, FallbackRecord};

/// How many records the fallback feed retains (oldest evicted first).
pub const DEFAULT_RETENTION: usize = 10;

/// Raw record payloads delivered by a push watcher.
///
/// Payloads are opaque bytes at this layer; decoding (and dropping of
/// malformed records) is the dispatcher's job.
pub type RecordStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// The durable broadcast channel: primary transport.
///
/// Publishing appends a durable record and push-notifies every watcher
/// whose scope matches. Writers never coordinate; every record targets a
/// uniquely-keyed slot.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Append `record` and notify all matching watchers.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the record cannot be written or the
    /// notification cannot be sent.
    async fn publish(&self, record: &DurableRecord) -> Result<(), ChannelError>;

    /// Open a stream of raw record payloads for `scope`.
    ///
    /// The wildcard scope observes every league. The stream ends when the
    /// underlying channel drops; callers are expected to re-watch.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the watch cannot be established.
    async fn watch(&self, scope: &Scope) -> Result<RecordStream, ChannelError>;

    /// Delete the durable copy of an event.
    ///
    /// Deleting a record that is already gone is a no-op, not an error:
    /// any dispatching process may race to clean up the same record.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the store rejects the delete.
    async fn remove(&self, id: EventId) -> Result<(), ChannelError>;
}

/// The polling broadcast channel: fallback transport.
///
/// A bounded feed of recent records scanned on an interval by every
/// process. Publishers prune the feed opportunistically at append time.
#[async_trait]
pub trait PollTransport: Send + Sync {
    /// Append a short-lived record and prune the feed to its retention
    /// bound.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the feed cannot be written.
    async fn append(&self, record: &FallbackRecord) -> Result<(), ChannelError>;

    /// Fetch records strictly newer than `watermark`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the feed cannot be read.
    async fn records_since(
        &self,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<FallbackRecord>, ChannelError>;
}
