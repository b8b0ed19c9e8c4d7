//! Inbound frame dispatch.
//!
//! One router per session. The socket read task calls
//! [`Router::handle_raw`] once per inbound text frame, synchronously and
//! in arrival order; collaboration and chat correctness both depend on
//! last-writer-wins merges applied in server-delivery order, so there is
//! deliberately no buffering or concurrent handling here. Raw frames are
//! never retained after dispatch.

use tracing::{debug, warn};

use tether_events::{ChatEntry, Sender, ServerEvent};
use tether_presence::PresenceEvent;

use crate::view::{SharedPresence, SharedView};

/// Dispatches typed inbound events into the session view and the
/// presence merger.
#[derive(Clone)]
pub struct Router {
    view: SharedView,
    presence: SharedPresence,
}

impl Router {
    /// Create a router over the given view and presence state.
    #[must_use]
    pub fn new(view: SharedView, presence: SharedPresence) -> Self {
        Self { view, presence }
    }

    /// The view this router writes to.
    #[must_use]
    pub fn view(&self) -> &SharedView {
        &self.view
    }

    /// The presence state this router writes to.
    #[must_use]
    pub fn presence(&self) -> &SharedPresence {
        &self.presence
    }

    /// Handle one raw inbound frame.
    ///
    /// Malformed frames are logged and dropped; they never abort dispatch
    /// of subsequent frames.
    pub fn handle_raw(&self, raw: &str) {
        match serde_json::from_str::<ServerEvent>(raw) {
            Ok(event) => self.handle(event),
            Err(e) => warn!(error = %e, "dropping malformed frame"),
        }
    }

    /// Handle one typed inbound event.
    pub fn handle(&self, event: ServerEvent) {
        match event {
            ServerEvent::Chat {
                data, timestamp, ..
            } => {
                // The local optimistic append already put the user's own
                // message in the timeline; only assistant entries land here.
                if data.sender == Sender::User {
                    debug!("dropping echoed user chat frame");
                    return;
                }
                let entry =
                    ChatEntry::assistant(data.message, timestamp, data.user_id, data.model);
                let _ = self.view.lock().push_chat(entry);
            }
            ServerEvent::Terminal { data, .. } => {
                let line = format!("$ {}\n{}", data.command, data.output);
                self.view.lock().push_terminal(line);
            }
            ServerEvent::System { data, .. } => {
                if let Some(id) = data.connection_id {
                    debug!(connection = %id, "connection id assigned");
                    self.view.lock().set_connection_id(Some(id));
                } else if let Some(message) = data.message {
                    debug!(message, "system frame");
                }
            }
            ServerEvent::Error { data, timestamp } => {
                // Surface server failures in the same timeline as normal
                // responses.
                let entry = ChatEntry::assistant(
                    format!("Error: {}", data.error),
                    timestamp,
                    None,
                    None,
                );
                let _ = self.view.lock().push_chat(entry);
            }
            ServerEvent::UserJoined { user, timestamp } => {
                self.presence
                    .lock()
                    .apply(PresenceEvent::Joined { user, timestamp });
            }
            ServerEvent::UserLeft { user, .. } => {
                self.presence
                    .lock()
                    .apply(PresenceEvent::Left { user_id: user.id });
            }
            ServerEvent::UserActivity {
                user,
                activity_type,
                activity_data,
                timestamp,
            } => {
                self.presence.lock().apply(PresenceEvent::Activity {
                    user,
                    activity_type,
                    activity_data,
                    timestamp,
                });
            }
            ServerEvent::CursorUpdate {
                user,
                cursor,
                timestamp,
            } => {
                self.presence.lock().apply(PresenceEvent::Cursor {
                    user_id: user.id,
                    cursor,
                    timestamp,
                });
            }
            ServerEvent::Unknown => {
                warn!("discarding frame with unrecognized kind");
            }
        }
    }
}
