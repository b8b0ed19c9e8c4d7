//! Socket error types.
//!
//! Only request-shaped failures surface as errors. Abnormal closes and
//! reconnect exhaustion are state transitions on the manager's watch
//! channel, not `Err` values.

use thiserror::Error;

/// Errors produced by connection-manager operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// No bearer token is available to authenticate the connection.
    #[error("no bearer token available")]
    MissingCredentials,

    /// The connection URL could not be built or parsed.
    #[error("invalid connection url: {0}")]
    InvalidUrl(String),

    /// `send` was called while the connection is not open.
    #[error("socket is not connected")]
    NotConnected,

    /// A frame could not be serialized for the wire.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    /// The write channel to the transport is gone.
    #[error("transport write channel closed")]
    ChannelClosed,

    /// A transport-level failure (dial, send, or close).
    #[error("transport error: {0}")]
    Transport(String),
}
