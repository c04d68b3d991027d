//! Subscription scopes: one league, or every league.
//!
//! A [`Scope`] is the key a process subscribes under. The wildcard scope
//! exists only on the subscription side; events are always published to a
//! concrete league.

use crate::ids::{IdError, LeagueId};

/// The scope of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// Receive events for a single league.
    League(LeagueId),
    /// Receive events for every league this process can observe.
    AllLeagues,
}

impl Scope {
    /// The wire sentinel for the wildcard scope.
    pub const WILDCARD_KEY: &'static str = "*";

    /// Whether an event published to `league` falls under this scope.
    pub fn matches(&self, league: &LeagueId) -> bool {
        match self {
            Self::League(own) => own == league,
            Self::AllLeagues => true,
        }
    }

    /// The registry key for this scope (`*` for the wildcard).
    pub fn as_key(&self) -> &str {
        match self {
            Self::League(id) => id.as_str(),
            Self::AllLeagues => Self::WILDCARD_KEY,
        }
    }

    /// Parse a registry key back into a scope.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] when the key is neither the wildcard sentinel nor
    /// a valid league id.
    pub fn parse_key(key: &str) -> Result<Self, IdError> {
        if key == Self::WILDCARD_KEY {
            return Ok(Self::AllLeagues);
        }
        LeagueId::new(key).map(Self::League)
    }

    /// Whether this is the wildcard scope.
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::AllLeagues)
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_key())
    }
}

impl From<LeagueId> for Scope {
    fn from(id: LeagueId) -> Self {
        Self::League(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn league_scope_matches_only_its_league() -> Result<(), IdError> {
        let scope = Scope::League(LeagueId::new("L1")?);
        assert!(scope.matches(&LeagueId::new("L1")?));
        assert!(!scope.matches(&LeagueId::new("L2")?));
        assert!(!scope.is_wildcard());
        Ok(())
    }

    #[test]
    fn wildcard_matches_everything() -> Result<(), IdError> {
        assert!(Scope::AllLeagues.matches(&LeagueId::new("L1")?));
        assert!(Scope::AllLeagues.matches(&LeagueId::new("L2")?));
        assert!(Scope::AllLeagues.is_wildcard());
        Ok(())
    }

    #[test]
    fn key_roundtrip() -> Result<(), IdError> {
        assert_eq!(Scope::AllLeagues.as_key(), "*");
        assert_eq!(Scope::parse_key("*"), Ok(Scope::AllLeagues));
        assert_eq!(Scope::parse_key("L1"), Ok(Scope::League(LeagueId::new("L1")?)));
        assert!(Scope::parse_key("").is_err());
        Ok(())
    }
}
