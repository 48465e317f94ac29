use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::due::{self, DueParseError};

/// Primary key of a stored reminder (SQLite autoincrement rowid).
///
/// Numeric on purpose: the trailing token of every reminder action id
/// (`done_<id>`, `delete_<id>`) is parsed back into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReminderId(pub i64);

/// Chat that owns a reminder and receives its notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub i64);

/// Transport-level identity of the person behind an inbound event.
///
/// Conversation state and admin checks are keyed by user, reminders by chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Primary key of a registered gating channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub i64);

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })*
    };
}

display_inner!(ReminderId, OwnerId, UserId, ChannelId);

/// A persisted reminder row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub owner: OwnerId,
    pub text: String,
    /// Wall-clock due time exactly as stored: `YYYY-MM-DD HH:MM[:SS]`.
    ///
    /// Kept as text so a corrupt row still loads and can be reported by the
    /// scanner instead of failing the whole query.
    pub due_at: String,
}

impl Reminder {
    /// Parse [`Reminder::due_at`] with the seconds / minutes fallback.
    pub fn due_time(&self) -> Result<NaiveDateTime, DueParseError> {
        due::parse_due(&self.due_at)
    }
}

/// An entry in the admin-managed channel gating list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub link: String,
}

/// Who sent an inbound event and in which chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sender {
    pub user: UserId,
    pub chat: OwnerId,
}

impl Sender {
    pub fn new(user: u64, chat: i64) -> Self {
        Self {
            user: UserId(user),
            chat: OwnerId(chat),
        }
    }
}

/// Reference to a message previously sent by the bot, used for in-place edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat: OwnerId,
    pub message_id: i32,
}
