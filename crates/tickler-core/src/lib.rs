//! `tickler-core`: types, configuration and collaborator traits shared by every
//! Tickler crate.

pub mod action;
pub mod config;
pub mod due;
pub mod error;
pub mod transport;
pub mod types;

pub use error::{Result, TicklerError};
pub use types::{Channel, ChannelId, MessageRef, OwnerId, Reminder, ReminderId, Sender, UserId};
