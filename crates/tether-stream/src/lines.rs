//! SSE line framing.
//!
//! Streaming responses arrive as arbitrary byte chunks; chunk boundaries
//! do not respect line boundaries. [`LineBuffer`] accumulates bytes and
//! yields only complete newline-terminated lines, carrying any trailing
//! partial line over to the next chunk. [`parse_line`] then classifies a
//! line as a text fragment, the `[DONE]` sentinel, or noise.

use bytes::BytesMut;

/// What an SSE line means for the assembler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseLine {
    /// A `data:` line carrying a fragment of response text.
    Fragment(String),
    /// The `data: [DONE]` end-of-stream sentinel.
    Done,
    /// Anything else: blank lines, comments, non-data fields.
    Ignored,
}

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(8192),
        }
    }

    /// Append a chunk and drain every complete line it unlocked.
    ///
    /// Lines are split on `\n`; a trailing `\r` is stripped. Bytes after
    /// the last newline stay buffered until a later chunk completes them.
    /// Lines that are not valid UTF-8 are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(pos + 1);
            line.truncate(line.len() - 1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if let Ok(text) = std::str::from_utf8(&line) {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Take whatever partial line is left after end-of-stream.
    pub fn take_remaining(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = self.buf.split();
        std::str::from_utf8(&rest).ok().map(str::to_string)
    }
}

/// Classify one complete SSE line.
#[must_use]
pub fn parse_line(line: &str) -> SseLine {
    let trimmed = line.trim_end_matches('\r');
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return SseLine::Ignored;
    }
    let Some(data) = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))
    else {
        return SseLine::Ignored;
    };
    if data.trim() == "[DONE]" {
        return SseLine::Done;
    }
    SseLine::Fragment(data.to_string())
}
