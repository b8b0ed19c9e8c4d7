//! Wire frames for the persistent connection.
//!
//! Every inbound message is one JSON object discriminated by its `type`
//! field. Frame kinds carry their payload nested under `data` (matching
//! the `{type, data, session_id?, timestamp}` envelope); collaboration
//! kinds carry their fields at the top level. Unknown `type` values
//! deserialize to [`ServerEvent::Unknown`] so new server kinds are never
//! fatal to the dispatch loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tether_core::{ConnectionId, SessionId, UserId};

use crate::types::{CursorPosition, Sender, User};

/// Payload of a `chat` frame.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatPayload {
    /// Message text.
    pub message: String,
    /// Author of the message.
    pub sender: Sender,
    /// Authoring user, when the server reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Model that produced the message, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Payload of a `terminal` frame.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TerminalPayload {
    /// Command that was executed.
    pub command: String,
    /// Captured output.
    #[serde(default)]
    pub output: String,
}

/// Payload of a `system` frame.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SystemPayload {
    /// Server-assigned connection id, when the frame announces one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    /// Informational text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of an `error` frame.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ErrorPayload {
    /// Server-reported error description.
    pub error: String,
}

/// One inbound message, discriminated by its `type` field.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A chat message relayed by the server.
    Chat {
        /// Frame payload.
        data: ChatPayload,
        /// Session the frame belongs to.
        #[serde(default)]
        session_id: Option<SessionId>,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// Output from a terminal command.
    Terminal {
        /// Frame payload.
        data: TerminalPayload,
        /// Session the frame belongs to.
        #[serde(default)]
        session_id: Option<SessionId>,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// Connection housekeeping from the server.
    System {
        /// Frame payload.
        data: SystemPayload,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A server-side failure to surface in the chat timeline.
    Error {
        /// Frame payload.
        data: ErrorPayload,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A user joined the session.
    UserJoined {
        /// The joining user.
        user: User,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A user left the session.
    UserLeft {
        /// The leaving user.
        user: User,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A user performed an activity.
    UserActivity {
        /// The acting user.
        user: User,
        /// Activity kind.
        activity_type: String,
        /// Opaque activity payload.
        #[serde(default)]
        activity_data: Map<String, Value>,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A user moved their cursor.
    CursorUpdate {
        /// The user whose cursor moved.
        user: User,
        /// New cursor position.
        cursor: CursorPosition,
        /// Server timestamp.
        timestamp: DateTime<Utc>,
    },
    /// Any `type` value this client does not recognize.
    #[serde(other)]
    Unknown,
}

/// Outbound frame kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// Chat message.
    Chat,
    /// Terminal command.
    Terminal,
    /// Housekeeping.
    System,
    /// Error report.
    Error,
}

/// One outbound message: `{type, data, session_id?, timestamp}`.
#[derive(Clone, Debug, Serialize)]
pub struct ClientFrame {
    /// Frame kind.
    #[serde(rename = "type")]
    pub kind: FrameKind,
    /// Opaque payload.
    pub data: Value,
    /// Session the frame targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Client timestamp.
    pub timestamp: DateTime<Utc>,
}

impl ClientFrame {
    /// Build a frame of the given kind, stamped now.
    #[must_use]
    pub fn new(kind: FrameKind, data: Value, session_id: Option<SessionId>) -> Self {
        Self {
            kind,
            data,
            session_id,
            timestamp: Utc::now(),
        }
    }

    /// A chat frame carrying the user's message.
    #[must_use]
    pub fn chat(message: &str, session_id: Option<SessionId>) -> Self {
        Self::new(
            FrameKind::Chat,
            serde_json::json!({ "message": message }),
            session_id,
        )
    }

    /// A terminal frame carrying a command to execute.
    #[must_use]
    pub fn terminal(command: &str, session_id: Option<SessionId>) -> Self {
        Self::new(
            FrameKind::Terminal,
            serde_json::json!({ "command": command }),
            session_id,
        )
    }
}
