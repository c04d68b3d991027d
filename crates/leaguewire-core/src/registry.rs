//! Per-process subscription registry.
//!
//! Maps a scope key (a league id, or `*` for all leagues) to the set of
//! sinks registered under it, and owns the watcher task attached to each
//! scope. The reference-counting rule lives here: the first sink for a
//! scope triggers watcher startup (the caller spawns it and attaches the
//! handle), and removing the last sink hands the watcher back for
//! teardown.
//!
//! The registry is an explicit, dependency-injected table -- never a
//! module-level singleton -- so multiple isolated distributor instances
//! can coexist in one process.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use leaguewire_types::{LeagueId, Scope};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::sink::EventSink;

/// Handle identifying one registered sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Everything registered under one scope key.
struct ScopeEntry {
    sinks: BTreeMap<SubscriptionId, Arc<dyn EventSink>>,
    watcher: Option<JoinHandle<()>>,
}

/// Scope key to sink-set table with watcher lifecycle.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: RwLock<BTreeMap<String, ScopeEntry>>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink under a scope.
    ///
    /// Returns the sink's id and whether it is the first sink for the
    /// scope -- in which case starting a watcher (and attaching it via
    /// [`Self::attach_watcher`]) is the caller's job.
    pub async fn insert(
        &self,
        scope: &Scope,
        sink: Arc<dyn EventSink>,
    ) -> (SubscriptionId, bool) {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(scope.as_key().to_owned())
            .or_insert_with(|| ScopeEntry {
                sinks: BTreeMap::new(),
                watcher: None,
            });
        let first = entry.sinks.is_empty() && entry.watcher.is_none();
        entry.sinks.insert(id, sink);
        (id, first)
    }

    /// Attach the watcher task for a scope.
    ///
    /// If every sink already unsubscribed while the watcher was starting
    /// up, the handle is aborted immediately instead.
    pub async fn attach_watcher(&self, scope: &Scope, handle: JoinHandle<()>) {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(scope.as_key()) else {
            handle.abort();
            return;
        };
        if entry.sinks.is_empty() {
            handle.abort();
            entries.remove(scope.as_key());
            return;
        }
        if let Some(previous) = entry.watcher.replace(handle) {
            previous.abort();
        }
    }

    /// Remove one sink from a scope.
    ///
    /// When it was the last sink, the scope entry is dropped and its
    /// watcher handle is returned for the caller to abort. Removing an
    /// already-removed sink is a no-op.
    pub async fn remove(&self, scope: &Scope, id: SubscriptionId) -> Option<JoinHandle<()>> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(scope.as_key())?;
        entry.sinks.remove(&id);
        if entry.sinks.is_empty() {
            let watcher = entry.watcher.take();
            entries.remove(scope.as_key());
            return watcher;
        }
        None
    }

    /// Sinks a dispatched event must reach: the league-scoped set first,
    /// then the wildcard set.
    pub async fn sinks_for(&self, league: &LeagueId) -> Vec<Arc<dyn EventSink>> {
        let entries = self.entries.read().await;
        let mut sinks = Vec::new();
        if let Some(entry) = entries.get(league.as_str()) {
            sinks.extend(entry.sinks.values().cloned());
        }
        if let Some(entry) = entries.get(Scope::WILDCARD_KEY) {
            sinks.extend(entry.sinks.values().cloned());
        }
        sinks
    }

    /// Number of scopes with at least one sink.
    pub async fn scope_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop every registration, returning all watcher handles for the
    /// caller to abort.
    pub async fn clear(&self) -> Vec<JoinHandle<()>> {
        let mut entries = self.entries.write().await;
        let drained = std::mem::take(&mut *entries);
        drained
            .into_values()
            .filter_map(|mut entry| entry.watcher.take())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use leaguewire_types::IdError;

    use super::*;
    use crate::sink::Delivery;

    struct NullSink;

    #[async_trait]
    impl EventSink for NullSink {
        async fn on_event(&self, _delivery: Delivery) {}
    }

    fn scope(league: &str) -> Result<Scope, IdError> {
        Ok(Scope::League(LeagueId::new(league)?))
    }

    #[tokio::test]
    async fn first_sink_per_scope_is_flagged() -> Result<(), IdError> {
        let registry = SubscriptionRegistry::new();
        let (_, first) = registry.insert(&scope("L1")?, Arc::new(NullSink)).await;
        assert!(first);
        let (_, second_first) = registry.insert(&scope("L1")?, Arc::new(NullSink)).await;
        assert!(!second_first);
        let (_, other_scope_first) = registry.insert(&Scope::AllLeagues, Arc::new(NullSink)).await;
        assert!(other_scope_first);
        Ok(())
    }

    #[tokio::test]
    async fn removing_last_sink_drops_the_scope() -> Result<(), IdError> {
        let registry = SubscriptionRegistry::new();
        let (a, _) = registry.insert(&scope("L1")?, Arc::new(NullSink)).await;
        let (b, _) = registry.insert(&scope("L1")?, Arc::new(NullSink)).await;
        assert_eq!(registry.scope_count().await, 1);

        registry.remove(&scope("L1")?, a).await;
        assert_eq!(registry.scope_count().await, 1);
        registry.remove(&scope("L1")?, b).await;
        assert_eq!(registry.scope_count().await, 0);

        // Removing again is a quiet no-op.
        assert!(registry.remove(&scope("L1")?, b).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn sinks_for_combines_league_and_wildcard() -> Result<(), IdError> {
        let registry = SubscriptionRegistry::new();
        registry.insert(&scope("L1")?, Arc::new(NullSink)).await;
        registry.insert(&scope("L2")?, Arc::new(NullSink)).await;
        registry.insert(&Scope::AllLeagues, Arc::new(NullSink)).await;

        assert_eq!(registry.sinks_for(&LeagueId::new("L1")?).await.len(), 2);
        assert_eq!(registry.sinks_for(&LeagueId::new("L2")?).await.len(), 2);
        assert_eq!(registry.sinks_for(&LeagueId::new("L3")?).await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn attach_after_full_unsubscribe_aborts_the_watcher() -> Result<(), IdError> {
        let registry = SubscriptionRegistry::new();
        let (id, first) = registry.insert(&scope("L1")?, Arc::new(NullSink)).await;
        assert!(first);
        registry.remove(&scope("L1")?, id).await;

        // The watcher finished starting up only after the scope emptied.
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });
        registry.attach_watcher(&scope("L1")?, handle).await;
        assert_eq!(registry.scope_count().await, 0);
        Ok(())
    }
}
