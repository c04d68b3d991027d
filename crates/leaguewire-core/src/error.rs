//! Error taxonomy for the distribution service.
//!
//! Only [`DistributeError::TransportWrite`] is ever raised for a publish:
//! every other runtime fault (a broken watch, a malformed record, a
//! panicking sink) is absorbed, logged, and retried internally so the
//! distribution layer stays available when one transport or one consumer
//! misbehaves.

use leaguewire_channels::ChannelError;
use leaguewire_types::EventId;

/// Errors surfaced by the distribution service.
#[derive(Debug, thiserror::Error)]
pub enum DistributeError {
    /// Both channel writes failed for one publish. The event reached no
    /// transport; retrying is the caller's decision.
    #[error("event {id} reached no transport: push: {push}; fallback: {fallback}")]
    TransportWrite {
        /// Id of the event that was lost.
        id: EventId,
        /// The primary channel failure.
        push: Box<ChannelError>,
        /// The fallback channel failure.
        fallback: Box<ChannelError>,
    },

    /// A transport could not be initialized at startup.
    #[error("transport initialization failed: {0}")]
    Init(#[from] ChannelError),

    /// A configuration value was invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
