//! NATS-backed primary channel.
//!
//! Publishing writes the durable copy to the shared store, then pushes the
//! record to the league's subject; watchers receive the record bytes
//! directly from the subject. Subjects follow the scheme
//! `league.{league_id}.events`, with `league.*.events` as the wildcard
//! watch. League ids are validated upstream to never contain subject
//! metacharacters.

use async_trait::async_trait;
use futures::StreamExt;
use leaguewire_types::{EventId, LeagueId, Scope};
use tracing::{debug, info, warn};

use crate::error::ChannelError;
use crate::record::DurableRecord;
use crate::store::SharedStore;
use crate::transport::{PushTransport, RecordStream};

/// The subject a league's events are published to.
fn league_subject(league: &LeagueId) -> String {
    format!("league.{league}.events")
}

/// The subject filter a scope watches.
fn scope_subject(scope: &Scope) -> String {
    match scope {
        Scope::League(id) => league_subject(id),
        Scope::AllLeagues => "league.*.events".to_owned(),
    }
}

/// The durable broadcast channel over NATS plus the shared store.
///
/// The push notification rides NATS; the durable copy (and its cleanup)
/// lives in the [`SharedStore`].
pub struct DurableBroadcast {
    client: async_nats::Client,
    store: SharedStore,
}

impl DurableBroadcast {
    /// Connect to a NATS server and pair the channel with a store handle.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Push`] if the connection cannot be
    /// established.
    pub async fn connect(url: &str, store: SharedStore) -> Result<Self, ChannelError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| ChannelError::Push(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client, store })
    }

    /// Pair an existing NATS client with a store handle.
    pub const fn new(client: async_nats::Client, store: SharedStore) -> Self {
        Self { client, store }
    }
}

impl std::fmt::Debug for DurableBroadcast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableBroadcast")
            .field("connected", &true)
            .finish()
    }
}

#[async_trait]
impl PushTransport for DurableBroadcast {
    async fn publish(&self, record: &DurableRecord) -> Result<(), ChannelError> {
        // Durable copy first, so a watcher that fires immediately can
        // already observe and delete it.
        if let Err(e) = self.store.put_durable(record).await {
            warn!(
                event_id = %record.id,
                error = %e,
                "durable copy write failed; continuing with push-only delivery"
            );
        }

        let subject = league_subject(&record.league_id);
        let payload = serde_json::to_vec(record)?;
        debug!(
            subject = subject.as_str(),
            event_id = %record.id,
            event_type = %record.event_type,
            "publishing event record"
        );
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| ChannelError::Push(format!("failed to publish to {subject}: {e}")))?;
        Ok(())
    }

    async fn watch(&self, scope: &Scope) -> Result<RecordStream, ChannelError> {
        let subject = scope_subject(scope);
        debug!(subject = subject.as_str(), "subscribing to league subjects");
        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| ChannelError::Push(format!("failed to subscribe to {subject}: {e}")))?;
        Ok(Box::pin(subscriber.map(|msg| msg.payload.to_vec())))
    }

    async fn remove(&self, id: EventId) -> Result<(), ChannelError> {
        self.store.delete_durable(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaguewire_types::IdError;

    #[test]
    fn league_subject_embeds_the_key() -> Result<(), IdError> {
        let league = LeagueId::new("L1")?;
        assert_eq!(league_subject(&league), "league.L1.events");
        Ok(())
    }

    #[test]
    fn scope_subject_for_wildcard() {
        assert_eq!(scope_subject(&Scope::AllLeagues), "league.*.events");
    }

    #[test]
    fn scope_subject_for_league() -> Result<(), IdError> {
        let scope = Scope::League(LeagueId::new("summer-league")?);
        assert_eq!(scope_subject(&scope), "league.summer-league.events");
        Ok(())
    }
}
