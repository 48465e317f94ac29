//! `tickler-router`: turns inbound chat events into state transitions,
//! store mutations and replies.
//!
//! | Module     | Role |
//! |------------|------|
//! | `command`  | slash command decoding |
//! | `inbound`  | transport-neutral inbound events |
//! | `replies`  | every user-facing text and keyboard |
//! | `router`   | the [`Router`] itself |

pub mod command;
pub mod error;
pub mod inbound;
pub mod replies;
pub mod router;

pub use command::Command;
pub use error::{Result, RouterError};
pub use inbound::Inbound;
pub use router::Router;
