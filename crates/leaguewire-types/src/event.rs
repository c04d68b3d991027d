//! The event descriptor and its closed type set.
//!
//! A [`LeagueEvent`] is the immutable value that flows through both
//! channels: created once at publish time, decoded zero-to-many times by
//! subscribing processes, and never mutated in between. The payload is an
//! opaque JSON map interpreted only by consumers outside the distribution
//! layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{EventId, LeagueId, UserId};

/// Opaque event payload: string keys mapped to JSON values.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// The closed set of domain event types the platform distributes.
///
/// The wire form is `snake_case` (`draft_pick_made`); anything outside this
/// set fails decoding and is dropped by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A draft has opened and teams may begin picking.
    DraftStarted,
    /// The pick order advanced; one team is now on the clock.
    DraftTurn,
    /// A team made a pick.
    DraftPickMade,
    /// Every roster slot is filled; the draft is over.
    DraftCompleted,
    /// The draft was cancelled by a commissioner.
    DraftDeleted,
    /// A contestant scored points during an episode.
    ScoringEvent,
    /// League standings were recomputed.
    StandingsUpdate,
    /// An episode started airing.
    EpisodeStarted,
    /// An episode finished and its scoring is closed.
    EpisodeEnded,
    /// League settings or membership changed.
    LeagueUpdate,
}

impl EventType {
    /// The wire name of this event type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DraftStarted => "draft_started",
            Self::DraftTurn => "draft_turn",
            Self::DraftPickMade => "draft_pick_made",
            Self::DraftCompleted => "draft_completed",
            Self::DraftDeleted => "draft_deleted",
            Self::ScoringEvent => "scoring_event",
            Self::StandingsUpdate => "standings_update",
            Self::EpisodeStarted => "episode_started",
            Self::EpisodeEnded => "episode_ended",
            Self::LeagueUpdate => "league_update",
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable domain event scoped to one league.
///
/// `target_user_id` marks an event whose user-visible effect differs for one
/// recipient; the event itself is still delivered to every listener so they
/// can refresh state. Consumers branch on [`LeagueEvent::is_targeted_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeagueEvent {
    /// Unique id assigned at publish time, used for dedup and cleanup.
    pub id: EventId,
    /// Which kind of domain event this is.
    pub event_type: EventType,
    /// The league this event belongs to. Events never cross league
    /// boundaries except via the wildcard subscription.
    pub league_id: LeagueId,
    /// Opaque payload interpreted by consumers (team names, points, ...).
    #[ts(type = "Record<string, unknown>")]
    pub payload: Payload,
    /// The one recipient whose user-visible surface differs, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub target_user_id: Option<UserId>,
    /// Creation time. Monotonically informative, not strictly ordered
    /// across processes.
    pub created_at: DateTime<Utc>,
}

impl LeagueEvent {
    /// Create a new event descriptor, assigning its id and timestamp.
    pub fn new(event_type: EventType, league_id: LeagueId, payload: Payload) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            league_id,
            payload,
            target_user_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a target recipient to this event.
    #[must_use]
    pub fn with_target(mut self, user: UserId) -> Self {
        self.target_user_id = Some(user);
        self
    }

    /// Whether this event names a target recipient at all.
    pub const fn is_targeted(&self) -> bool {
        self.target_user_id.is_some()
    }

    /// Whether this event is targeted at the given user.
    ///
    /// Untargeted events return `false` for every user: there is no
    /// targeted surface to show, only the shared one.
    pub fn is_targeted_at(&self, user: &UserId) -> bool {
        self.target_user_id.as_ref() == Some(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdError;

    #[test]
    fn event_type_wire_form_is_snake_case() {
        let value = serde_json::to_value(EventType::DraftPickMade).ok();
        assert_eq!(value, Some(serde_json::json!("draft_pick_made")));
        assert_eq!(EventType::StandingsUpdate.as_str(), "standings_update");
    }

    #[test]
    fn event_type_decodes_from_wire_form() {
        let parsed: Option<EventType> = serde_json::from_str("\"episode_started\"").ok();
        assert_eq!(parsed, Some(EventType::EpisodeStarted));
    }

    #[test]
    fn unknown_event_type_fails_decoding() {
        let parsed: Result<EventType, _> = serde_json::from_str("\"draft_paused\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn new_assigns_id_and_timestamp() -> Result<(), IdError> {
        let a = LeagueEvent::new(EventType::DraftStarted, LeagueId::new("L1")?, Payload::new());
        let b = LeagueEvent::new(EventType::DraftStarted, LeagueId::new("L1")?, Payload::new());
        assert_ne!(a.id, b.id);
        assert!(a.target_user_id.is_none());
        Ok(())
    }

    #[test]
    fn targeting_resolves_per_user() -> Result<(), IdError> {
        let event = LeagueEvent::new(EventType::DraftTurn, LeagueId::new("L1")?, Payload::new())
            .with_target(UserId::new("U1"));
        assert!(event.is_targeted());
        assert!(event.is_targeted_at(&UserId::new("U1")));
        assert!(!event.is_targeted_at(&UserId::new("U2")));
        Ok(())
    }

    #[test]
    fn untargeted_event_targets_nobody() -> Result<(), IdError> {
        let event =
            LeagueEvent::new(EventType::StandingsUpdate, LeagueId::new("L1")?, Payload::new());
        assert!(!event.is_targeted());
        assert!(!event.is_targeted_at(&UserId::new("U1")));
        Ok(())
    }

    #[test]
    fn descriptor_roundtrips_through_json() -> Result<(), IdError> {
        let mut payload = Payload::new();
        payload.insert("team_name".to_owned(), serde_json::json!("Alpha"));
        let event = LeagueEvent::new(EventType::DraftPickMade, LeagueId::new("L1")?, payload);

        let json = serde_json::to_string(&event).ok();
        assert!(json.is_some());
        let parsed: Option<LeagueEvent> =
            json.as_deref().and_then(|j| serde_json::from_str(j).ok());
        assert_eq!(parsed.as_ref().map(|e| e.id), Some(event.id));
        assert_eq!(
            parsed
                .as_ref()
                .and_then(|e| e.payload.get("team_name"))
                .and_then(serde_json::Value::as_str),
            Some("Alpha")
        );
        Ok(())
    }

    #[test]
    fn absent_target_is_omitted_from_wire_form() -> Result<(), IdError> {
        let event = LeagueEvent::new(EventType::LeagueUpdate, LeagueId::new("L1")?, Payload::new());
        let value = serde_json::to_value(&event).unwrap_or_default();
        assert!(value.get("target_user_id").is_none());
        Ok(())
    }
}
