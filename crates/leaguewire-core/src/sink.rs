//! The subscriber contract and the delivered view of an event.
//!
//! A [`Delivery`] pairs the raw event descriptor with the observing
//! process's user so consumers can branch between the targeted and the
//! observer surface. The descriptor itself is always delivered -- targeting
//! changes what a consumer shows, never whether it hears about the event.

use std::sync::Arc;

use async_trait::async_trait;
use leaguewire_types::{LeagueEvent, UserId};

/// One delivered event plus the observing user's perspective.
#[derive(Debug, Clone)]
pub struct Delivery {
    event: Arc<LeagueEvent>,
    viewer: Option<UserId>,
}

impl Delivery {
    pub(crate) const fn new(event: Arc<LeagueEvent>, viewer: Option<UserId>) -> Self {
        Self { event, viewer }
    }

    /// The raw event descriptor.
    pub fn event(&self) -> &LeagueEvent {
        &self.event
    }

    /// The user this process observes as, when known.
    pub const fn viewer(&self) -> Option<&UserId> {
        self.viewer.as_ref()
    }

    /// Whether the event is targeted at the observing user.
    ///
    /// `false` for untargeted events, for events targeted at someone else,
    /// and when the process has no current user. Consumers use the
    /// non-targeted ("observer") surface in all three cases.
    pub fn is_targeted_at_viewer(&self) -> bool {
        self.viewer
            .as_ref()
            .is_some_and(|viewer| self.event.is_targeted_at(viewer))
    }
}

/// Contract for event consumers.
///
/// Called from a dispatch-owned task. The dispatcher does not await
/// completion: a slow sink delays nobody, and a panicking sink is caught
/// and logged without aborting delivery to the others.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Handle a single delivered event.
    async fn on_event(&self, delivery: Delivery);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
