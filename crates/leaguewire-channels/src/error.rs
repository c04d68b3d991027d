//! Error types for the channel layer.
//!
//! All channel faults are propagated via [`ChannelError`], which wraps the
//! underlying [`fred`] errors and flattens NATS errors (the `async-nats`
//! error types are generic over the failed operation) into operation
//! context strings.

/// Errors that can occur in the channel layer.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A push-channel connect, publish, or subscribe call failed.
    #[error("push channel error: {0}")]
    Push(String),

    /// A shared store operation failed.
    #[error("shared store error: {0}")]
    Store(#[from] fred::error::Error),

    /// A record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A channel is temporarily unreachable.
    ///
    /// Raised by transport implementations that are not backed by the
    /// built-in adapters (and by test doubles simulating an outage).
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
