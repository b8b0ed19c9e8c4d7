//! Session view data types.
//!
//! These are the entities the router and presence merger mutate and the
//! rest of the application reads: chat timeline entries, participants,
//! cursors, and activities. Wire shapes live in [`crate::wire`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tether_core::{ActivityId, EntryId, UserId};

/// Who authored a chat entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The local user.
    User,
    /// The remote assistant.
    Assistant,
}

/// A user participating in a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
}

/// One entry in the session chat timeline.
///
/// The timeline is append-only, with a single exception: while an
/// assistant response streams in, its placeholder entry grows in place
/// (see `tether-stream`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Locally generated entry id (UUID v7).
    pub id: EntryId,
    /// Message text.
    pub text: String,
    /// Author of the entry.
    pub sender: Sender,
    /// When the entry was authored.
    pub timestamp: DateTime<Utc>,
    /// Authoring user, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Model that produced an assistant entry, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatEntry {
    /// An entry authored by the local user, stamped now.
    ///
    /// Used for optimistic appends before server confirmation.
    #[must_use]
    pub fn local_user(text: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            text: text.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            user_id: None,
            model: None,
        }
    }

    /// An assistant-authored entry.
    #[must_use]
    pub fn assistant(
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
        user_id: Option<UserId>,
        model: Option<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            text: text.into(),
            sender: Sender::Assistant,
            timestamp,
            user_id,
            model,
        }
    }

    /// An empty assistant entry, stamped now, to be filled in place while
    /// a streamed response arrives.
    #[must_use]
    pub fn streaming_placeholder() -> Self {
        Self::assistant(String::new(), Utc::now(), None, None)
    }
}

/// A cursor location inside the shared workspace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    /// File the cursor is in, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    /// Opaque selection payload, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Value>,
}

/// A user currently associated with the session.
///
/// Keyed uniquely by `user.id`; the presence merger upserts on join and
/// keeps `cursor` in agreement with the separate cursor lookup table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// The user.
    pub user: User,
    /// When the user joined the session.
    pub joined_at: DateTime<Utc>,
    /// Last time any event arrived for this user.
    pub last_seen: DateTime<Utc>,
    /// The user's cursor, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
}

/// One recorded collaboration activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Locally generated activity id (UUID v7, not globally unique).
    pub id: ActivityId,
    /// User who performed the activity.
    pub user: User,
    /// Activity kind, e.g. `file_edit` or `cursor_move`.
    pub activity_type: String,
    /// Opaque activity payload.
    pub activity_data: Map<String, Value>,
    /// When the activity happened.
    pub timestamp: DateTime<Utc>,
}
