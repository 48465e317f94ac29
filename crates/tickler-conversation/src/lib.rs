//! `tickler-conversation`: per-user dialogue state for the multi-step flows.
//!
//! The state machine itself is pure ([`classify`]); the [`ConversationTracker`]
//! only stores one state per user behind a per-user async lock.

pub mod state;
pub mod tracker;

pub use state::{classify, ConversationState, LinkPolicy, TextIntent};
pub use tracker::{ConversationGuard, ConversationTracker};
