//! `tickler-store`: SQLite persistence for reminders and the channel gating list.
//!
//! Each store wraps its own connection in a `Mutex`; callers never see raw
//! connections. Open one connection per store against the same database file
//! (WAL mode) the way the gateway does.

pub mod channels;
pub mod db;
pub mod error;
pub mod reminders;

pub use channels::ChannelStore;
pub use error::{Result, StoreError};
pub use reminders::{CorruptRow, Pending, ReminderStore};
