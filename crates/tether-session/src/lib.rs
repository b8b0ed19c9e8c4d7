//! # tether-session
//!
//! Session-scoped view state and the inbound message router.
//!
//! [`SessionView`] is the chat timeline, terminal output, and connection
//! metadata the application reads. [`Router`] is the single writer: it
//! consumes one raw inbound frame at a time, in arrival order, and
//! dispatches into the view and the presence merger. Frame-level failures
//! (malformed JSON, unrecognized kinds) are logged and dropped without
//! ever halting dispatch.

#![deny(unsafe_code)]

pub mod router;
pub mod view;

pub use router::Router;
pub use view::{SessionView, SharedPresence, SharedView};
