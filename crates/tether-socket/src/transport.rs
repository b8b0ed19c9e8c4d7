//! Transport abstraction.
//!
//! The manager never touches a socket library directly; it dials through
//! a [`Connector`] and drives the two halves it gets back. This is the
//! seam the tests use to inject scripted transports, and [`crate::ws`]
//! provides the production `tokio-tungstenite` implementation.

use async_trait::async_trait;

use crate::error::SocketError;

/// WebSocket normal-closure code.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code used when the peer vanishes without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Something observed on the read half of a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame arrived.
    Text(String),
    /// The transport closed with the given code.
    Closed {
        /// WebSocket close code (1000 is normal).
        code: u16,
    },
    /// A transport-level error. Logged only; the subsequent close event
    /// drives the state machine.
    Error(String),
}

/// Write half of a connected transport.
#[async_trait]
pub trait TransportSink: Send {
    /// Send one text frame.
    async fn send(&mut self, text: String) -> Result<(), SocketError>;

    /// Close the transport with the given code.
    async fn close(&mut self, code: u16) -> Result<(), SocketError>;
}

/// Read half of a connected transport.
#[async_trait]
pub trait TransportSource: Send {
    /// The next event, or `None` when the stream has ended without a
    /// close frame (treated as abnormal closure).
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

/// A freshly dialed transport, split into its two halves.
pub struct Transport {
    /// Write half.
    pub sink: Box<dyn TransportSink>,
    /// Read half.
    pub source: Box<dyn TransportSource>,
}

/// Dials transports.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a transport to `url`.
    async fn connect(&self, url: &str) -> Result<Transport, SocketError>;
}
