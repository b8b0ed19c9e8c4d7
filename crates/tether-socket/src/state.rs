//! Connection state machine states.

use std::fmt;

/// Lifecycle states of the managed connection.
///
/// Transitions:
///
/// ```text
/// Disconnected ── connect ──▶ Connecting ──▶ Open
///       ▲                         ▲           │ abnormal close
///       │ disconnect              │ dial      ▼
///       └───── (any state)        └── Reconnecting ── exhausted ──▶ Closed
///                                                     normal close ─▶ Closed
/// ```
///
/// `Closed` is terminal: no further automatic reconnection is scheduled.
/// A fresh `connect` call leaves it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport; nothing scheduled.
    #[default]
    Disconnected,
    /// A dial is in flight.
    Connecting,
    /// The transport is live; `send` is allowed.
    Open,
    /// Waiting out a backoff delay before redialing.
    Reconnecting,
    /// Terminal: normal closure, or reconnect attempts exhausted.
    Closed,
}

impl ConnectionState {
    /// Whether `send` is currently allowed.
    #[must_use]
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
