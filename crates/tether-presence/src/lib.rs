//! # tether-presence
//!
//! Last-writer-wins merging of collaboration push events into the
//! session's presence view: who is here, where their cursors are, and
//! what they have been doing.
//!
//! Invariants maintained across every merge:
//!
//! - At most one [`Participant`] per user id (upsert semantics).
//! - A user id appears in the cursor table only while it also appears in
//!   the participant collection; `user_left` removes both together.
//! - A participant's embedded cursor always agrees with the cursor table.
//! - The activity feed holds at most [`MAX_ACTIVITIES`] entries,
//!   newest-first; overflow drops the oldest.
//!
//! "Active" participants are a snapshot property computed per query
//! against [`ACTIVE_WINDOW_SECS`], not an event-driven expiry: a silent
//! participant ages out of the active view without any removal event.

#![deny(unsafe_code)]

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use tether_core::{ActivityId, UserId};
use tether_events::{Activity, CursorPosition, Participant, User};

/// Hard cap on the activity feed. A bounded-memory policy, not a server
/// requirement.
pub const MAX_ACTIVITIES: usize = 100;

/// How recently a participant must have been seen to count as active.
pub const ACTIVE_WINDOW_SECS: i64 = 5 * 60;

/// One collaboration push event, ready for merging.
#[derive(Clone, Debug)]
pub enum PresenceEvent {
    /// A user joined the session.
    Joined {
        /// The joining user.
        user: User,
        /// Server timestamp of the join.
        timestamp: DateTime<Utc>,
    },
    /// A user left the session.
    Left {
        /// Id of the leaving user.
        user_id: UserId,
    },
    /// A user performed an activity.
    Activity {
        /// The acting user.
        user: User,
        /// Activity kind.
        activity_type: String,
        /// Opaque activity payload.
        activity_data: Map<String, Value>,
        /// Server timestamp of the activity.
        timestamp: DateTime<Utc>,
    },
    /// A user moved their cursor.
    Cursor {
        /// Id of the user whose cursor moved.
        user_id: UserId,
        /// New cursor position.
        cursor: CursorPosition,
        /// Server timestamp of the update.
        timestamp: DateTime<Utc>,
    },
}

/// The merged presence view of one session.
///
/// Mutated only by the message router in response to inbound events, one
/// event at a time; everything else reads.
#[derive(Debug, Default)]
pub struct PresenceState {
    participants: Vec<Participant>,
    cursors: HashMap<UserId, CursorPosition>,
    activities: Vec<Activity>,
}

impl PresenceState {
    /// Create an empty presence view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one collaboration event.
    pub fn apply(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::Joined { user, timestamp } => {
                debug!(user = %user.id, "participant joined");
                let entry = Participant {
                    user,
                    joined_at: timestamp,
                    last_seen: timestamp,
                    cursor: None,
                };
                // A rejoin starts fresh: the replaced participant has no
                // cursor, so the table entry goes too.
                let _ = self.cursors.remove(&entry.user.id);
                match self
                    .participants
                    .iter_mut()
                    .find(|p| p.user.id == entry.user.id)
                {
                    Some(existing) => *existing = entry,
                    None => self.participants.push(entry),
                }
            }
            PresenceEvent::Left { user_id } => {
                debug!(user = %user_id, "participant left");
                self.participants.retain(|p| p.user.id != user_id);
                let _ = self.cursors.remove(&user_id);
            }
            PresenceEvent::Activity {
                user,
                activity_type,
                activity_data,
                timestamp,
            } => {
                self.activities.insert(
                    0,
                    Activity {
                        id: ActivityId::new(),
                        user,
                        activity_type,
                        activity_data,
                        timestamp,
                    },
                );
                self.activities.truncate(MAX_ACTIVITIES);
            }
            PresenceEvent::Cursor {
                user_id,
                cursor,
                timestamp,
            } => {
                let _ = self.cursors.insert(user_id.clone(), cursor.clone());
                if let Some(p) = self
                    .participants
                    .iter_mut()
                    .find(|p| p.user.id == user_id)
                {
                    p.cursor = Some(cursor);
                    p.last_seen = timestamp;
                }
            }
        }
    }

    /// All participants, in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Participants seen within the last [`ACTIVE_WINDOW_SECS`] relative
    /// to `now`. Recomputed on every call.
    #[must_use]
    pub fn active_participants(&self, now: DateTime<Utc>) -> Vec<&Participant> {
        let cutoff = now - Duration::seconds(ACTIVE_WINDOW_SECS);
        self.participants
            .iter()
            .filter(|p| p.last_seen > cutoff)
            .collect()
    }

    /// Number of active participants as of `now`.
    #[must_use]
    pub fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.active_participants(now).len()
    }

    /// Cursor for a user, if one is known.
    #[must_use]
    pub fn cursor_of(&self, user_id: &UserId) -> Option<&CursorPosition> {
        self.cursors.get(user_id)
    }

    /// The activity feed, newest first.
    #[must_use]
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Drop all presence state (session left or torn down).
    pub fn clear(&mut self) {
        self.participants.clear();
        self.cursors.clear();
        self.activities.clear();
    }
}
