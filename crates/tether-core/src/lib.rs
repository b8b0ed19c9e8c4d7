//! # tether-core
//!
//! Foundation types for the Tether client synchronization layer.
//!
//! This crate provides the shared vocabulary the other Tether crates depend on:
//!
//! - **Branded IDs**: `SessionId`, `UserId`, `EntryId`, `ActivityId`,
//!   `ConnectionId` as newtypes for type safety
//! - **Credentials**: the [`CredentialProvider`] seam to the external
//!   credential store (bearer token + unauthorized side-effect)
//! - **Logging**: `tracing-subscriber` initialization helper

#![deny(unsafe_code)]

pub mod credentials;
pub mod ids;
pub mod logging;

pub use credentials::{CredentialProvider, StaticCredentials};
pub use ids::{ActivityId, ConnectionId, EntryId, SessionId, UserId};
pub use logging::init_tracing;
