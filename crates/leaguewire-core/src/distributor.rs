//! The distribution service facade.
//!
//! [`EventDistributor`] owns the two transports, the subscription
//! registry, the dispatcher, and the background tasks: one watcher per
//! subscribed scope (started by the first subscriber, torn down by the
//! last unsubscribe) and one process-wide fallback poller. Publishing is
//! fire-and-forget: both channel writes are attempted, and only a double
//! failure surfaces to the caller.
//!
//! The distributor is a dependency-injected service value, not a
//! singleton; tests run several isolated instances against shared
//! loopback channels to simulate a multi-process topology.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use leaguewire_channels::{
    DurableBroadcast, DurableRecord, FallbackRecord, PollTransport, PushTransport, SharedStore,
};
use leaguewire_types::{EventId, EventType, LeagueEvent, LeagueId, Payload, Scope, UserId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, info, warn};

use crate::config::DistributorConfig;
use crate::dispatch::Dispatcher;
use crate::error::DistributeError;
use crate::registry::{SubscriptionId, SubscriptionRegistry};
use crate::sink::EventSink;

/// The real-time event distribution service.
pub struct EventDistributor {
    push: Arc<dyn PushTransport>,
    poll: Arc<dyn PollTransport>,
    registry: Arc<SubscriptionRegistry>,
    dispatcher: Arc<Dispatcher>,
    config: DistributorConfig,
    source_tag: String,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl EventDistributor {
    /// Build a distributor over explicit transports, observing as nobody.
    pub fn new(
        push: Arc<dyn PushTransport>,
        poll: Arc<dyn PollTransport>,
        config: DistributorConfig,
    ) -> Self {
        Self::build(push, poll, config, None)
    }

    /// Build a distributor that observes as the given user.
    ///
    /// The viewer only affects the targeting flag on deliveries; it never
    /// filters which events arrive.
    pub fn with_viewer(
        push: Arc<dyn PushTransport>,
        poll: Arc<dyn PollTransport>,
        config: DistributorConfig,
        viewer: UserId,
    ) -> Self {
        Self::build(push, poll, config, Some(viewer))
    }

    /// Connect the production transports (NATS + shared store) from the
    /// configured URLs.
    ///
    /// # Errors
    ///
    /// Returns [`DistributeError::Init`] when either transport cannot be
    /// reached.
    pub async fn connect(
        config: DistributorConfig,
        viewer: Option<UserId>,
    ) -> Result<Self, DistributeError> {
        let store = SharedStore::connect(&config.store_url)
            .await?
            .with_retention(config.fallback_retention);
        let broadcast = DurableBroadcast::connect(&config.nats_url, store.clone()).await?;
        Ok(Self::build(
            Arc::new(broadcast),
            Arc::new(store),
            config,
            viewer,
        ))
    }

    fn build(
        push: Arc<dyn PushTransport>,
        poll: Arc<dyn PollTransport>,
        config: DistributorConfig,
        viewer: Option<UserId>,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&push),
            viewer,
            config.dedup_window,
        ));
        Self {
            push,
            poll,
            registry,
            dispatcher,
            config,
            source_tag: format!("lw-{}", uuid::Uuid::new_v4()),
            poller: Mutex::new(None),
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &DistributorConfig {
        &self.config
    }

    /// Start the fallback poller. Idempotent.
    pub async fn start(&self) {
        let mut poller = self.poller.lock().await;
        if poller.is_some() {
            return;
        }
        info!(interval = ?self.config.poll_interval, "starting fallback poller");
        *poller = Some(spawn_poller(
            Arc::clone(&self.poll),
            Arc::clone(&self.dispatcher),
            self.config.poll_interval,
        ));
    }

    /// Stop the poller and every scope watcher, dropping all
    /// subscriptions.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.poller.lock().await.take() {
            handle.abort();
        }
        for handle in self.registry.clear().await {
            handle.abort();
        }
        info!("event distributor shut down");
    }

    /// Publish an event to both channels.
    ///
    /// The push write and the fallback write are independent; either one
    /// succeeding counts as delivered. There is no retry and no blocking
    /// on delivery confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`DistributeError::TransportWrite`] only when both writes
    /// failed.
    pub async fn publish(&self, event: LeagueEvent) -> Result<EventId, DistributeError> {
        let id = event.id;
        let durable = DurableRecord::from_event(&event, self.config.durable_ttl);
        let fallback = FallbackRecord::from_event(event, &self.source_tag);

        let push_result = self.push.publish(&durable).await;
        if let Err(e) = &push_result {
            warn!(event_id = %id, error = %e, "primary channel write failed; relying on fallback");
        }
        let poll_result = self.poll.append(&fallback).await;
        if let Err(e) = &poll_result {
            warn!(event_id = %id, error = %e, "fallback channel write failed");
        }

        match (push_result, poll_result) {
            (Err(push), Err(fallback)) => Err(DistributeError::TransportWrite {
                id,
                push: Box::new(push),
                fallback: Box::new(fallback),
            }),
            _ => Ok(id),
        }
    }

    /// Build and publish an event in one call.
    ///
    /// # Errors
    ///
    /// Returns [`DistributeError::TransportWrite`] only when both channel
    /// writes failed.
    pub async fn publish_event(
        &self,
        event_type: EventType,
        league_id: LeagueId,
        payload: Payload,
        target: Option<UserId>,
    ) -> Result<EventId, DistributeError> {
        let mut event = LeagueEvent::new(event_type, league_id, payload);
        if let Some(user) = target {
            event = event.with_target(user);
        }
        self.publish(event).await
    }

    /// Register a sink under a scope.
    ///
    /// The first sink for a scope starts that scope's watcher; later
    /// sinks share it. Wildcard watcher startup is deferred by the
    /// configured delay so it never races transport initialization.
    pub async fn subscribe(&self, scope: Scope, sink: Arc<dyn EventSink>) -> Subscription {
        let (id, first) = self.registry.insert(&scope, sink).await;
        if first {
            let initial_delay = if scope.is_wildcard() {
                self.config.wildcard_start_delay
            } else {
                Duration::ZERO
            };
            let handle = spawn_watcher(
                scope.clone(),
                Arc::clone(&self.push),
                Arc::clone(&self.dispatcher),
                initial_delay,
                self.config.watch_retry_delay,
            );
            self.registry.attach_watcher(&scope, handle).await;
        }
        Subscription {
            registry: Arc::clone(&self.registry),
            scope,
            id,
        }
    }
}

/// Handle returned by [`EventDistributor::subscribe`].
///
/// Dropping the handle does not unsubscribe; call
/// [`Subscription::unsubscribe`]. An in-flight dispatch may still complete
/// once after unsubscribing (delivery is at-least-once).
pub struct Subscription {
    registry: Arc<SubscriptionRegistry>,
    scope: Scope,
    id: SubscriptionId,
}

impl Subscription {
    /// The scope this subscription was registered under.
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Remove this sink. When it was the scope's last sink, the scope's
    /// watcher is torn down as well.
    pub async fn unsubscribe(self) {
        if let Some(watcher) = self.registry.remove(&self.scope, self.id).await {
            watcher.abort();
        }
    }
}

/// Watch one scope on the push channel, feeding the dispatcher.
///
/// Channel faults never surface to subscribers; the watch is retried with
/// a fixed bounded delay, favoring availability over signaling transient
/// faults.
fn spawn_watcher(
    scope: Scope,
    push: Arc<dyn PushTransport>,
    dispatcher: Arc<Dispatcher>,
    initial_delay: Duration,
    retry_delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !initial_delay.is_zero() {
            sleep(initial_delay).await;
        }
        loop {
            match push.watch(&scope).await {
                Ok(mut stream) => {
                    debug!(scope = %scope, "channel watcher attached");
                    while let Some(payload) = stream.next().await {
                        dispatcher.dispatch_raw(&payload).await;
                    }
                    warn!(scope = %scope, "channel watch stream ended; retrying");
                }
                Err(e) => {
                    warn!(scope = %scope, error = %e, "channel watch failed; retrying");
                }
            }
            sleep(retry_delay).await;
        }
    })
}

/// Poll the fallback feed on a fixed interval, feeding the dispatcher.
///
/// The watermark starts at task startup and advances to the newest record
/// seen; records at or before the watermark are never re-fetched, and the
/// dispatcher's dedup absorbs anything the push path already delivered.
fn spawn_poller(
    poll: Arc<dyn PollTransport>,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut watermark = Utc::now();
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match poll.records_since(watermark).await {
                Ok(records) => {
                    for record in records {
                        if record.timestamp > watermark {
                            watermark = record.timestamp;
                        }
                        dispatcher.dispatch_fallback(record).await;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "fallback poll failed; retrying next interval");
                }
            }
        }
    })
}
