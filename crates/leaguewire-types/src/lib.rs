//! Shared type definitions for the `LeagueWire` event distribution layer.
//!
//! This crate is the single source of truth for the types that cross the
//! workspace: event descriptors, identifiers, and subscription scopes.
//! Types defined here flow downstream to `TypeScript` via `ts-rs` for the
//! web frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes (event, league, user)
//! - [`event`] -- The event descriptor and its closed type set
//! - [`scope`] -- Subscription scopes (one league or the wildcard)

pub mod event;
pub mod ids;
pub mod scope;

// Re-export all public types at crate root for convenience.
pub use event::{EventType, LeagueEvent, Payload};
pub use ids::{EventId, IdError, LeagueId, UserId};
pub use scope::Scope;

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        use ts_rs::TS;

        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::LeagueId::export_all();
        let _ = crate::ids::UserId::export_all();
        let _ = crate::event::EventType::export_all();
        let _ = crate::event::LeagueEvent::export_all();
    }
}
