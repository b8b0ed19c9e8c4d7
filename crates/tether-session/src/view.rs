//! The session view: what the rest of the application reads.

use std::sync::Arc;

use parking_lot::Mutex;

use tether_core::{ConnectionId, EntryId};
use tether_events::ChatEntry;
use tether_presence::PresenceState;

/// Shared handle to a session's view state.
pub type SharedView = Arc<Mutex<SessionView>>;

/// Shared handle to a session's presence state.
pub type SharedPresence = Arc<Mutex<PresenceState>>;

/// Chat timeline, terminal output, and connection metadata for one session.
///
/// Mutated only by the router, the socket manager's optimistic chat
/// append, and the streaming assembler's in-place placeholder fill.
#[derive(Debug, Default)]
pub struct SessionView {
    chat: Vec<ChatEntry>,
    terminal: Vec<String>,
    connection_id: Option<ConnectionId>,
}

impl SessionView {
    /// Create an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty view behind a shared handle.
    #[must_use]
    pub fn shared() -> SharedView {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Append a chat entry, returning its id.
    pub fn push_chat(&mut self, entry: ChatEntry) -> EntryId {
        let id = entry.id.clone();
        self.chat.push(entry);
        id
    }

    /// Append a fragment to an existing entry's text, in place.
    ///
    /// This is the single non-append mutation of the timeline, used while
    /// a streamed assistant response grows. Returns `false` when the entry
    /// is gone (e.g. the timeline was cleared mid-stream).
    pub fn append_to_entry(&mut self, id: &EntryId, fragment: &str) -> bool {
        match self.chat.iter_mut().find(|e| &e.id == id) {
            Some(entry) => {
                entry.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// The chat timeline, oldest first.
    #[must_use]
    pub fn chat(&self) -> &[ChatEntry] {
        &self.chat
    }

    /// The most recent chat entry.
    #[must_use]
    pub fn last_chat(&self) -> Option<&ChatEntry> {
        self.chat.last()
    }

    /// Append a formatted terminal line.
    pub fn push_terminal(&mut self, line: String) {
        self.terminal.push(line);
    }

    /// Terminal output lines, oldest first.
    #[must_use]
    pub fn terminal(&self) -> &[String] {
        &self.terminal
    }

    /// Record the server-assigned connection id.
    pub fn set_connection_id(&mut self, id: Option<ConnectionId>) {
        self.connection_id = id;
    }

    /// The server-assigned connection id, when connected.
    #[must_use]
    pub fn connection_id(&self) -> Option<&ConnectionId> {
        self.connection_id.as_ref()
    }

    /// Drop the chat timeline.
    pub fn clear_chat(&mut self) {
        self.chat.clear();
    }

    /// Drop the terminal output.
    pub fn clear_terminal(&mut self) {
        self.terminal.clear();
    }

    /// Drop everything (session left or torn down).
    pub fn clear(&mut self) {
        self.chat.clear();
        self.terminal.clear();
        self.connection_id = None;
    }
}
