//! # tether-events
//!
//! The closed wire model for the persistent connection and the data types
//! that make up a session's view state.
//!
//! Inbound traffic is a single tagged union, [`ServerEvent`], covering the
//! four frame kinds (`chat`, `terminal`, `system`, `error`), the four
//! collaboration kinds (`user_joined`, `user_left`, `user_activity`,
//! `cursor_update`), and an explicit `Unknown` arm for anything the server
//! starts sending that this client does not recognize yet. Outbound frames
//! are [`ClientFrame`].

#![deny(unsafe_code)]

pub mod types;
pub mod wire;

pub use types::{Activity, ChatEntry, CursorPosition, Participant, Sender, User};
pub use wire::{
    ChatPayload, ClientFrame, ErrorPayload, FrameKind, ServerEvent, SystemPayload,
    TerminalPayload,
};
