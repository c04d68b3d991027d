//! Wire records for the two channels.
//!
//! Both records are projections of a [`LeagueEvent`] plus transport
//! metadata: the durable record carries its own expiry, the fallback record
//! carries the poll watermark timestamp and the publishing process's source
//! tag. Conversion back to an event is lossless; the metadata stays behind
//! in the channel layer.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use leaguewire_types::{EventId, EventType, LeagueEvent, LeagueId, Payload, UserId};
use serde::{Deserialize, Serialize};

/// Floor for durable-record TTLs so a record never expires mid-write.
const MIN_TTL: Duration = Duration::from_secs(1);

/// A primary-channel record: the durable copy of a published event.
///
/// Written to the shared store at publish time and deleted by whichever
/// process first dispatches the event; `expires_at` bounds its lifetime
/// when no process ever does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableRecord {
    /// Unique event id, also the durable store key.
    pub id: EventId,
    /// League scope the record was published under.
    pub league_id: LeagueId,
    /// Domain event type.
    pub event_type: EventType,
    /// Opaque event payload.
    pub payload: Payload,
    /// Target recipient, when the event has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<UserId>,
    /// Publish time.
    pub created_at: DateTime<Utc>,
    /// When the durable copy lapses regardless of consumption.
    pub expires_at: DateTime<Utc>,
}

impl DurableRecord {
    /// Build the durable record for an event with the given retention TTL.
    pub fn from_event(event: &LeagueEvent, ttl: Duration) -> Self {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| event.created_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            id: event.id,
            league_id: event.league_id.clone(),
            event_type: event.event_type,
            payload: event.payload.clone(),
            target_user_id: event.target_user_id.clone(),
            created_at: event.created_at,
            expires_at,
        }
    }

    /// Recover the event descriptor this record was built from.
    pub fn into_event(self) -> LeagueEvent {
        LeagueEvent {
            id: self.id,
            event_type: self.event_type,
            league_id: self.league_id,
            payload: self.payload,
            target_user_id: self.target_user_id,
            created_at: self.created_at,
        }
    }

    /// Time left until `expires_at`, floored at one second.
    ///
    /// The floor keeps an already-lapsed record storable long enough for
    /// the store's own expiry to reap it.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at
            .signed_duration_since(now)
            .to_std()
            .map_or(MIN_TTL, |ttl| ttl.max(MIN_TTL))
    }
}

/// A fallback-channel record: the short-lived copy in the polling feed.
///
/// `timestamp` drives the per-process poll watermark; `source_tag`
/// identifies the publishing process so concurrent publishes never
/// collide on a synthetic key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackRecord {
    /// Unique event id, shared with the durable record for dedup.
    pub id: EventId,
    /// League scope the record was published under.
    pub league_id: LeagueId,
    /// Domain event type.
    pub event_type: EventType,
    /// Opaque event payload.
    pub payload: Payload,
    /// Target recipient, when the event has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<UserId>,
    /// Publish time; pollers fetch records strictly newer than their
    /// watermark.
    pub timestamp: DateTime<Utc>,
    /// Synthetic tag of the publishing process.
    pub source_tag: String,
}

impl FallbackRecord {
    /// Build the fallback record for an event, consuming it.
    pub fn from_event(event: LeagueEvent, source_tag: &str) -> Self {
        Self {
            id: event.id,
            league_id: event.league_id,
            event_type: event.event_type,
            payload: event.payload,
            target_user_id: event.target_user_id,
            timestamp: event.created_at,
            source_tag: source_tag.to_owned(),
        }
    }

    /// Recover the event descriptor this record was built from.
    pub fn into_event(self) -> LeagueEvent {
        LeagueEvent {
            id: self.id,
            event_type: self.event_type,
            league_id: self.league_id,
            payload: self.payload,
            target_user_id: self.target_user_id,
            created_at: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaguewire_types::IdError;

    fn sample_event() -> Result<LeagueEvent, IdError> {
        let mut payload = Payload::new();
        payload.insert("team_name".to_owned(), serde_json::json!("Alpha"));
        Ok(LeagueEvent::new(
            EventType::DraftPickMade,
            leaguewire_types::LeagueId::new("L1")?,
            payload,
        ))
    }

    #[test]
    fn durable_record_roundtrips() -> Result<(), IdError> {
        let event = sample_event()?;
        let record = DurableRecord::from_event(&event, Duration::from_secs(300));
        assert!(record.expires_at > record.created_at);
        assert_eq!(record.into_event(), event);
        Ok(())
    }

    #[test]
    fn fallback_record_roundtrips() -> Result<(), IdError> {
        let event = sample_event()?;
        let record = FallbackRecord::from_event(event.clone(), "proc-a");
        assert_eq!(record.timestamp, event.created_at);
        assert_eq!(record.source_tag, "proc-a");
        assert_eq!(record.into_event(), event);
        Ok(())
    }

    #[test]
    fn remaining_ttl_is_floored() -> Result<(), IdError> {
        let event = sample_event()?;
        let record = DurableRecord::from_event(&event, Duration::from_secs(60));
        // Well past expiry: the floor applies.
        let later = record
            .expires_at
            .checked_add_signed(TimeDelta::seconds(600))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        assert_eq!(record.remaining_ttl(later), Duration::from_secs(1));
        // Before expiry: roughly the full window remains.
        assert!(record.remaining_ttl(record.created_at) >= Duration::from_secs(59));
        Ok(())
    }

    #[test]
    fn target_is_carried_through_both_records() -> Result<(), IdError> {
        let event = sample_event()?.with_target(leaguewire_types::UserId::new("U1"));
        let durable = DurableRecord::from_event(&event, Duration::from_secs(300));
        let fallback = FallbackRecord::from_event(event.clone(), "proc-a");
        assert_eq!(durable.target_user_id, event.target_user_id);
        assert_eq!(fallback.target_user_id, event.target_user_id);
        Ok(())
    }
}
