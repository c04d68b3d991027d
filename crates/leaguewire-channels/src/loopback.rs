//! In-process loopback channels.
//!
//! Same contracts as the NATS/store adapters, backed by a
//! [`tokio::sync::broadcast`] channel and in-memory tables. Used by the
//! test suites and by single-process deployments that have no external
//! infrastructure to reach.
//!
//! ## Rules
//! - **Non-blocking publish**: sending never blocks; with no watchers the
//!   notification is dropped (the durable copy is still written).
//! - **Lag handling**: a watcher that falls behind the broadcast capacity
//!   skips the missed notifications (the poller recovers them).

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leaguewire_types::{EventId, LeagueId, Scope};
use tokio::sync::{RwLock, broadcast};
use tracing::warn;

use crate::error::ChannelError;
use crate::record::{DurableRecord, FallbackRecord};
use crate::transport::{DEFAULT_RETENTION, PollTransport, PushTransport, RecordStream};

/// Default capacity of the loopback notification ring buffer.
const DEFAULT_CAPACITY: usize = 256;

/// In-process durable broadcast.
///
/// Cloning shares the notification channel and the durable table, so one
/// instance can serve several distributor instances in the same process
/// (the multi-process topology collapsed into one, which is exactly what
/// the integration tests need).
#[derive(Clone)]
pub struct LoopbackPush {
    tx: broadcast::Sender<(LeagueId, Vec<u8>)>,
    durable: Arc<RwLock<BTreeMap<EventId, DurableRecord>>>,
}

impl LoopbackPush {
    /// Create a loopback push channel with the given notification
    /// capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            durable: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Ids of the durable copies still present.
    ///
    /// Test observability: lets a suite assert that dispatch cleaned up
    /// after itself.
    pub async fn durable_ids(&self) -> Vec<EventId> {
        self.durable.read().await.keys().copied().collect()
    }
}

impl Default for LoopbackPush {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl PushTransport for LoopbackPush {
    async fn publish(&self, record: &DurableRecord) -> Result<(), ChannelError> {
        self.durable.write().await.insert(record.id, record.clone());
        let payload = serde_json::to_vec(record)?;
        // send fails only when no watcher exists, which is normal.
        let _ = self.tx.send((record.league_id.clone(), payload));
        Ok(())
    }

    async fn watch(&self, scope: &Scope) -> Result<RecordStream, ChannelError> {
        let rx = self.tx.subscribe();
        let scope = scope.clone();
        let stream = futures::stream::unfold((rx, scope), |(mut rx, scope)| async move {
            loop {
                match rx.recv().await {
                    Ok((league, payload)) => {
                        if scope.matches(&league) {
                            return Some((payload, (rx, scope)));
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "loopback watcher lagged; skipping notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn remove(&self, id: EventId) -> Result<(), ChannelError> {
        self.durable.write().await.remove(&id);
        Ok(())
    }
}

/// In-process polling feed with a bounded retention window.
#[derive(Clone)]
pub struct LoopbackPoll {
    feed: Arc<RwLock<VecDeque<FallbackRecord>>>,
    retention: usize,
}

impl LoopbackPoll {
    /// Create a loopback feed with the given retention bound (minimum 1).
    pub fn new(retention: usize) -> Self {
        Self {
            feed: Arc::new(RwLock::new(VecDeque::new())),
            retention: retention.max(1),
        }
    }

    /// Number of records currently retained.
    pub async fn feed_len(&self) -> usize {
        self.feed.read().await.len()
    }
}

impl Default for LoopbackPoll {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

#[async_trait]
impl PollTransport for LoopbackPoll {
    async fn append(&self, record: &FallbackRecord) -> Result<(), ChannelError> {
        let mut feed = self.feed.write().await;
        feed.push_back(record.clone());
        while feed.len() > self.retention {
            feed.pop_front();
        }
        Ok(())
    }

    async fn records_since(
        &self,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<FallbackRecord>, ChannelError> {
        let feed = self.feed.read().await;
        Ok(feed
            .iter()
            .filter(|record| record.timestamp > watermark)
            .cloned()
            .collect())
    }
}
