//! Identifier types for events, leagues, and recipients.
//!
//! [`EventId`] is a UUID v7 (time-ordered) assigned at publish time and used
//! for per-process deduplication and durable-store cleanup. [`LeagueId`] and
//! [`UserId`] wrap the string keys assigned by the upstream platform; league
//! keys are validated here because they flow into channel subjects and store
//! keys.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Errors produced when constructing an identifier from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// A league id was empty.
    #[error("league id must not be empty")]
    Empty,
    /// A league id contained a character reserved by the channel layer.
    #[error("league id {0:?} contains a reserved character")]
    Reserved(String),
}

/// Unique identifier for a published event.
///
/// Assigned once at publish time and never reused; subscribing processes
/// dedup on it when the same event arrives over both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

/// Scope key of a league, assigned by the upstream platform.
///
/// Never empty, and never the wildcard sentinel `*`: the wildcard is a
/// subscription concept (see `Scope`), not a publish scope. Characters with
/// meaning in channel subjects (`*`, `>`, `.`) and whitespace are rejected
/// so a league key can always be embedded in a subject or store key verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(try_from = "String", into = "String")]
pub struct LeagueId(String);

impl LeagueId {
    /// Validate and wrap a league scope key.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Empty`] for an empty key and [`IdError::Reserved`]
    /// when the key contains `*`, `>`, `.`, or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        if id.chars().any(is_reserved) {
            return Err(IdError::Reserved(id));
        }
        Ok(Self(id))
    }

    /// Return the scope key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Characters that carry meaning in channel subjects or the wildcard scope.
const fn is_reserved(c: char) -> bool {
    matches!(c, '*' | '>' | '.') || c.is_whitespace()
}

impl core::fmt::Display for LeagueId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LeagueId {
    type Error = IdError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<LeagueId> for String {
    fn from(id: LeagueId) -> Self {
        id.0
    }
}

/// Identifier of a recipient, assigned by the upstream auth layer.
///
/// Opaque to the distribution layer; only ever compared for equality when
/// resolving event targeting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserId(String);

impl UserId {
    /// Wrap a user key.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the user key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_ids_are_unique() {
        let a = EventId::new();
        let b = EventId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn event_id_display_matches_uuid() {
        let id = EventId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn league_id_accepts_plain_keys() {
        let id = LeagueId::new("league-42");
        assert_eq!(id.as_ref().map(LeagueId::as_str), Ok("league-42"));
    }

    #[test]
    fn league_id_rejects_empty() {
        assert_eq!(LeagueId::new(""), Err(IdError::Empty));
    }

    #[test]
    fn league_id_rejects_wildcard_and_subject_chars() {
        assert!(matches!(LeagueId::new("*"), Err(IdError::Reserved(_))));
        assert!(matches!(LeagueId::new("a.b"), Err(IdError::Reserved(_))));
        assert!(matches!(LeagueId::new("a b"), Err(IdError::Reserved(_))));
        assert!(matches!(LeagueId::new("a>b"), Err(IdError::Reserved(_))));
    }

    #[test]
    fn league_id_serde_validates_on_deserialize() {
        let ok: Result<LeagueId, _> = serde_json::from_str("\"L1\"");
        assert!(ok.is_ok());
        let bad: Result<LeagueId, _> = serde_json::from_str("\"*\"");
        assert!(bad.is_err());
    }

    #[test]
    fn user_id_roundtrip() {
        let id = UserId::new("U1");
        assert_eq!(id.as_str(), "U1");
        assert_eq!(id.to_string(), "U1");
    }
}
