//! Shared store (Redis-compatible) operations for both channels.
//!
//! The store carries two kinds of state:
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `event:{id}` | JSON | Durable copy of a published event, with TTL |
//! | `events:recent` | List | Fallback feed, pruned to the retention bound |
//!
//! Durable copies are deleted by the first process to dispatch the event;
//! the feed is pruned by publishers at append time (oldest-first).

use chrono::{DateTime, Utc};
use fred::prelude::*;
use leaguewire_types::EventId;
use tracing::warn;

use crate::error::ChannelError;
use crate::record::{DurableRecord, FallbackRecord};
use crate::transport::{DEFAULT_RETENTION, PollTransport};

/// Store key of the fallback feed list.
const RECENT_KEY: &str = "events:recent";

/// Store key of an event's durable copy.
fn durable_key(id: EventId) -> String {
    format!("event:{id}")
}

/// Connection handle to the shared store.
///
/// Wraps a [`fred::prelude::Client`] and provides the two key patterns the
/// channels use. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SharedStore {
    client: Client,
    retention: usize,
}

impl SharedStore {
    /// Connect to the shared store at the given URL.
    ///
    /// The URL follows the Redis URL scheme: `redis://host:port` or
    /// `redis://host:port/db`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Config`] if the URL cannot be parsed.
    /// Returns [`ChannelError::Store`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let config = Config::from_url(url)
            .map_err(|e| ChannelError::Config(format!("invalid store URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to shared store");
        Ok(Self {
            client,
            retention: DEFAULT_RETENTION,
        })
    }

    /// Set the fallback feed's retention bound (minimum 1).
    #[must_use]
    pub const fn with_retention(mut self, retention: usize) -> Self {
        self.retention = if retention == 0 { 1 } else { retention };
        self
    }

    /// Write the durable copy of an event at `event:{id}`.
    ///
    /// The store expires the copy on its own when no process ever
    /// dispatches the event.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if serialization or the write fails.
    pub async fn put_durable(&self, record: &DurableRecord) -> Result<(), ChannelError> {
        let key = durable_key(record.id);
        let json = serde_json::to_string(record)?;
        let ttl = i64::try_from(record.remaining_ttl(Utc::now()).as_secs()).unwrap_or(i64::MAX);
        let _: () = self
            .client
            .set(&key, json.as_str(), Some(Expiration::EX(ttl)), None, false)
            .await?;
        Ok(())
    }

    /// Delete the durable copy of an event.
    ///
    /// Deleting an absent key is a no-op: dispatching processes race to
    /// clean up the same record.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Store`] if the delete fails.
    pub async fn delete_durable(&self, id: EventId) -> Result<(), ChannelError> {
        let _: u32 = self.client.del(durable_key(id)).await?;
        Ok(())
    }

    /// Read back the durable copy of an event, if still present.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if the read or deserialization fails.
    pub async fn get_durable(&self, id: EventId) -> Result<Option<DurableRecord>, ChannelError> {
        let value: Option<String> = self.client.get(durable_key(id)).await?;
        value
            .map(|s| serde_json::from_str(&s).map_err(ChannelError::from))
            .transpose()
    }

    /// Append a record to the fallback feed and prune to the retention
    /// bound.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if serialization or a write fails.
    pub async fn append_recent(&self, record: &FallbackRecord) -> Result<(), ChannelError> {
        let json = serde_json::to_string(record)?;
        let _: u64 = self.client.rpush(RECENT_KEY, json.as_str()).await?;
        let start = i64::try_from(self.retention).unwrap_or(i64::MAX).saturating_neg();
        let _: () = self.client.ltrim(RECENT_KEY, start, -1).await?;
        Ok(())
    }

    /// Fetch feed records strictly newer than `watermark`, oldest first.
    ///
    /// Malformed feed entries are skipped and logged, never surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Store`] if the read fails.
    pub async fn recent_since(
        &self,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<FallbackRecord>, ChannelError> {
        let values: Vec<String> = self.client.lrange(RECENT_KEY, 0, -1).await?;
        let mut records = Vec::with_capacity(values.len());
        for value in &values {
            match serde_json::from_str::<FallbackRecord>(value) {
                Ok(record) => {
                    if record.timestamp > watermark {
                        records.push(record);
                    }
                }
                Err(e) => warn!(error = %e, "skipping malformed fallback feed entry"),
            }
        }
        Ok(records)
    }

    /// Flush all keys from the store.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Store`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), ChannelError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait::async_trait]
impl PollTransport for SharedStore {
    async fn append(&self, record: &FallbackRecord) -> Result<(), ChannelError> {
        self.append_recent(record).await
    }

    async fn records_since(
        &self,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<FallbackRecord>, ChannelError> {
        self.recent_since(watermark).await
    }
}
