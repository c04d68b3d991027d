//! The decode-filter-deliver sequence, shared by both channels.
//!
//! Whatever transport produced a raw record, it takes the same path:
//! decode (malformed records are dropped and logged), dedup on the event
//! id, fan out to the league-scoped sinks and then the wildcard sinks, and
//! finally a best-effort delete of the durable copy. Sink invocations are
//! spawned, never awaited: one slow or panicking consumer cannot block or
//! abort delivery to the rest.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use leaguewire_channels::{DurableRecord, FallbackRecord, PushTransport};
use leaguewire_types::{LeagueEvent, UserId};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::dedup::DedupWindow;
use crate::registry::SubscriptionRegistry;
use crate::sink::Delivery;

/// Routes raw channel records to registered sinks, exactly once per event
/// id per process.
pub struct Dispatcher {
    registry: Arc<SubscriptionRegistry>,
    push: Arc<dyn PushTransport>,
    viewer: Option<UserId>,
    seen: Mutex<DedupWindow>,
}

impl Dispatcher {
    /// Create a dispatcher over a registry and the primary channel handle
    /// (held for durable cleanup).
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        push: Arc<dyn PushTransport>,
        viewer: Option<UserId>,
        dedup_window: usize,
    ) -> Self {
        Self {
            registry,
            push,
            viewer,
            seen: Mutex::new(DedupWindow::new(dedup_window)),
        }
    }

    /// Route a raw primary-channel payload.
    ///
    /// Malformed payloads are dropped and logged, never propagated: a
    /// corrupt record must not take the watcher down.
    pub async fn dispatch_raw(&self, payload: &[u8]) {
        match serde_json::from_slice::<DurableRecord>(payload) {
            Ok(record) => self.dispatch_event(record.into_event()).await,
            Err(e) => warn!(error = %e, "dropping malformed primary channel record"),
        }
    }

    /// Route a fallback-channel record.
    pub async fn dispatch_fallback(&self, record: FallbackRecord) {
        self.dispatch_event(record.into_event()).await;
    }

    /// Dedup, fan out, clean up.
    pub async fn dispatch_event(&self, event: LeagueEvent) {
        let fresh = { self.seen.lock().await.insert(event.id) };
        if !fresh {
            debug!(event_id = %event.id, "skipping duplicate delivery");
            return;
        }

        let sinks = self.registry.sinks_for(&event.league_id).await;
        debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            league_id = %event.league_id,
            sinks = sinks.len(),
            "dispatching event"
        );

        let event = Arc::new(event);
        for sink in sinks {
            let delivery = Delivery::new(Arc::clone(&event), self.viewer.clone());
            let name = sink.name();
            tokio::spawn(async move {
                let fut = sink.on_event(delivery);
                if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                    error!(sink = name, "event sink panicked; other sinks unaffected");
                }
            });
        }

        // Whichever process dispatches first clears the durable copy;
        // losing that race, or the copy being gone already, is fine.
        if let Err(e) = self.push.remove(event.id).await {
            debug!(event_id = %event.id, error = %e, "durable cleanup failed; ignoring");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use leaguewire_channels::LoopbackPush;
    use leaguewire_types::{EventType, IdError, LeagueId, Payload, Scope};

    use super::*;
    use crate::sink::EventSink;

    struct CountingSink {
        hits: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventSink for CountingSink {
        async fn on_event(&self, _delivery: Delivery) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn test_event(league: &str) -> Result<LeagueEvent, IdError> {
        Ok(LeagueEvent::new(
            EventType::ScoringEvent,
            LeagueId::new(league)?,
            Payload::new(),
        ))
    }

    async fn dispatcher_with_counter(
        league: &str,
    ) -> Result<(Dispatcher, Arc<AtomicUsize>), IdError> {
        let registry = Arc::new(SubscriptionRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        registry
            .insert(
                &Scope::League(LeagueId::new(league)?),
                Arc::new(CountingSink {
                    hits: Arc::clone(&hits),
                }),
            )
            .await;
        let dispatcher = Dispatcher::new(
            registry,
            Arc::new(LoopbackPush::default()),
            None,
            256,
        );
        Ok((dispatcher, hits))
    }

    #[tokio::test]
    async fn same_id_is_delivered_once() -> Result<(), IdError> {
        let (dispatcher, hits) = dispatcher_with_counter("L1").await?;
        let event = test_event("L1")?;

        dispatcher.dispatch_event(event.clone()).await;
        dispatcher.dispatch_event(event).await;
        settle().await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_payload_is_dropped() -> Result<(), IdError> {
        let (dispatcher, hits) = dispatcher_with_counter("L1").await?;

        dispatcher.dispatch_raw(b"not a record").await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // The dispatcher keeps working after a bad record.
        let record = DurableRecord::from_event(&test_event("L1")?, Duration::from_secs(60));
        let payload = serde_json::to_vec(&record).unwrap_or_default();
        dispatcher.dispatch_raw(&payload).await;
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn events_for_other_leagues_reach_nobody() -> Result<(), IdError> {
        let (dispatcher, hits) = dispatcher_with_counter("L1").await?;

        dispatcher.dispatch_event(test_event("L2")?).await;
        settle().await;

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        Ok(())
    }
}
