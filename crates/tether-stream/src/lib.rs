//! # tether-stream
//!
//! Streaming response assembly. The session message endpoint answers with
//! an SSE-framed body (`data:` lines ending in a `data: [DONE]` sentinel);
//! this crate buffers the byte stream into complete lines, feeds fragments
//! to a caller-supplied callback, and grows an assistant placeholder entry
//! in the shared session view so the timeline streams in place.

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod lines;

pub use client::StreamingClient;
pub use error::StreamError;
pub use lines::{LineBuffer, SseLine, parse_line};
