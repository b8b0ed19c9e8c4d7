//! # tether-socket
//!
//! The connection manager: owns the one live transport per session,
//! drives the connection state machine, and feeds inbound frames to the
//! session router.
//!
//! Key behaviors:
//!
//! - **Single-flight connect**: dialing unconditionally tears down any
//!   prior transport first; there is exactly one live transport per
//!   manager at any time.
//! - **Bounded linear backoff**: an abnormal close schedules reconnect
//!   attempt `k` after `k × base_delay` (2 s, 4 s, … 10 s), up to 5
//!   attempts; a normal close or exhaustion is a terminal transition to
//!   `Closed`, observable through the state watch channel, never an error.
//! - **Generation guards**: every connection task carries the generation
//!   it was spawned under and becomes a no-op once superseded, so a stale
//!   transport or a late reconnect timer can never mutate current state.
//! - **No outbound queue**: `send` fails synchronously unless the state
//!   is `Open`.

#![deny(unsafe_code)]

pub mod error;
pub mod manager;
pub mod state;
pub mod transport;
pub mod ws;

pub use error::SocketError;
pub use manager::{SocketConfig, SocketManager};
pub use state::ConnectionState;
pub use transport::{Connector, Transport, TransportEvent, TransportSink, TransportSource};
pub use ws::WsConnector;
