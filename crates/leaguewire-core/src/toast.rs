//! User-facing toast rendering for delivered events.
//!
//! The thin consumer layer between the distribution core and the UI: an
//! [`EventSink`] that renders each delivery into a [`Toast`] and pushes it
//! over a broadcast channel the UI reads. Message text lives here, not in
//! the core contract -- the core only guarantees the raw descriptor plus
//! the targeting flag, and this module does the branching between the
//! targeted and the observer wording.

use async_trait::async_trait;
use leaguewire_types::{EventType, LeagueId, Payload};
use tokio::sync::broadcast;

use crate::sink::{Delivery, EventSink};

/// Capacity of the toast broadcast ring buffer.
///
/// A UI receiver that falls further behind skips to the newest toasts.
const TOAST_CAPACITY: usize = 64;

/// How strongly the UI should surface a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Addressed at the viewing user specifically.
    Personal,
    /// Shared league news, same wording for everyone.
    League,
}

/// One rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// How to surface it.
    pub kind: ToastKind,
    /// The league the underlying event belonged to.
    pub league_id: LeagueId,
    /// The underlying event type.
    pub event_type: EventType,
    /// Ready-to-display message text.
    pub message: String,
}

/// Event sink that renders deliveries into toasts for UI consumption.
pub struct ToastFeed {
    tx: broadcast::Sender<Toast>,
}

impl ToastFeed {
    /// Create a feed with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe a UI consumer to the rendered toasts.
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }

    /// Render a delivery into its toast.
    pub fn render(delivery: &Delivery) -> Toast {
        let event = delivery.event();
        let payload = &event.payload;
        let team = text_field(payload, "team_name").unwrap_or("A team");
        let contestant = text_field(payload, "contestant_name").unwrap_or("a contestant");
        let personal = delivery.is_targeted_at_viewer();

        let (kind, message) = match event.event_type {
            EventType::DraftStarted => (ToastKind::League, "The draft has started".to_owned()),
            EventType::DraftTurn => {
                if personal {
                    (ToastKind::Personal, "You're on the clock!".to_owned())
                } else {
                    (ToastKind::League, format!("{team} is on the clock"))
                }
            }
            EventType::DraftPickMade => {
                if personal {
                    (ToastKind::Personal, format!("You drafted {contestant}"))
                } else {
                    (ToastKind::League, format!("{team} drafted {contestant}"))
                }
            }
            EventType::DraftCompleted => (ToastKind::League, "The draft is complete".to_owned()),
            EventType::DraftDeleted => (ToastKind::League, "The draft was cancelled".to_owned()),
            EventType::ScoringEvent => {
                let points = payload
                    .get("points")
                    .and_then(serde_json::Value::as_i64)
                    .unwrap_or(0);
                (ToastKind::League, format!("{contestant} scored {points} points"))
            }
            EventType::StandingsUpdate => {
                (ToastKind::League, "Standings have been updated".to_owned())
            }
            EventType::EpisodeStarted => {
                (ToastKind::League, "A new episode is airing".to_owned())
            }
            EventType::EpisodeEnded => {
                (ToastKind::League, "Episode scoring is closed".to_owned())
            }
            EventType::LeagueUpdate => {
                (ToastKind::League, "League settings were updated".to_owned())
            }
        };

        Toast {
            kind,
            league_id: event.league_id.clone(),
            event_type: event.event_type,
            message,
        }
    }
}

impl Default for ToastFeed {
    fn default() -> Self {
        Self::new(TOAST_CAPACITY)
    }
}

#[async_trait]
impl EventSink for ToastFeed {
    async fn on_event(&self, delivery: Delivery) {
        let toast = Self::render(&delivery);
        // send fails only when no UI receiver is attached, which is normal.
        let _ = self.tx.send(toast);
    }

    fn name(&self) -> &'static str {
        "toast-feed"
    }
}

/// Fetch a string payload field.
fn text_field<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(serde_json::Value::as_str)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use leaguewire_types::{IdError, LeagueEvent, UserId};

    use super::*;

    fn pick_event(league: &str) -> Result<LeagueEvent, IdError> {
        let mut payload = Payload::new();
        payload.insert("team_name".to_owned(), serde_json::json!("Alpha"));
        payload.insert("contestant_name".to_owned(), serde_json::json!("Jane"));
        Ok(LeagueEvent::new(
            EventType::DraftPickMade,
            leaguewire_types::LeagueId::new(league)?,
            payload,
        ))
    }

    fn delivery(event: LeagueEvent, viewer: Option<&str>) -> Delivery {
        Delivery::new(Arc::new(event), viewer.map(UserId::new))
    }

    #[test]
    fn targeted_delivery_gets_the_personal_wording() -> Result<(), IdError> {
        let event = pick_event("L1")?.with_target(UserId::new("U1"));
        let toast = ToastFeed::render(&delivery(event, Some("U1")));
        assert_eq!(toast.kind, ToastKind::Personal);
        assert_eq!(toast.message, "You drafted Jane");
        Ok(())
    }

    #[test]
    fn observers_get_the_shared_wording() -> Result<(), IdError> {
        let event = pick_event("L1")?.with_target(UserId::new("U1"));
        let toast = ToastFeed::render(&delivery(event, Some("U2")));
        assert_eq!(toast.kind, ToastKind::League);
        assert_eq!(toast.message, "Alpha drafted Jane");
        Ok(())
    }

    #[test]
    fn missing_payload_fields_fall_back_to_generic_text() -> Result<(), IdError> {
        let event = LeagueEvent::new(
            EventType::DraftPickMade,
            leaguewire_types::LeagueId::new("L1")?,
            Payload::new(),
        );
        let toast = ToastFeed::render(&delivery(event, None));
        assert_eq!(toast.message, "A team drafted a contestant");
        Ok(())
    }

    #[test]
    fn scoring_events_include_the_points() -> Result<(), IdError> {
        let mut payload = Payload::new();
        payload.insert("contestant_name".to_owned(), serde_json::json!("Jane"));
        payload.insert("points".to_owned(), serde_json::json!(12));
        let event = LeagueEvent::new(
            EventType::ScoringEvent,
            leaguewire_types::LeagueId::new("L1")?,
            payload,
        );
        let toast = ToastFeed::render(&delivery(event, None));
        assert_eq!(toast.message, "Jane scored 12 points");
        Ok(())
    }

    #[tokio::test]
    async fn feed_pushes_rendered_toasts_to_subscribers() -> Result<(), IdError> {
        let feed = ToastFeed::default();
        let mut rx = feed.subscribe();

        feed.on_event(delivery(pick_event("L1")?, None)).await;

        let toast = rx.try_recv().ok();
        assert_eq!(toast.map(|t| t.message), Some("Alpha drafted Jane".to_owned()));
        Ok(())
    }
}
