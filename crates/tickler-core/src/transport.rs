//! Collaborator contracts the engine talks to.
//!
//! The scheduler and router never touch a chat SDK directly; they send through
//! [`Transport`] and ask [`Access`] before privileged or gated flows. The
//! Telegram adapter implements both; tests use in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Channel, MessageRef, OwnerId, UserId};

/// A control attached below a message, rendered one per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    /// Sends `action_id` back to the bot when pressed.
    Action { label: String, action_id: String },
    /// Opens `url` on the client.
    Link { label: String, url: String },
}

impl Button {
    pub fn action(label: impl Into<String>, action_id: impl Into<String>) -> Self {
        Button::Action {
            label: label.into(),
            action_id: action_id.into(),
        }
    }

    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Button::Link {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Errors reported by a transport implementation.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The recipient can never be reached again (blocked the bot, chat gone).
    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    /// Anything that may succeed on a later attempt (network, rate limit, 5xx).
    #[error("transport failure: {0}")]
    Transient(String),
}

impl TransportError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportError::Unreachable(_))
    }
}

/// Outbound half of the messaging transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `text` to `recipient` with optional buttons.
    async fn send(
        &self,
        recipient: OwnerId,
        text: &str,
        buttons: &[Button],
    ) -> Result<MessageRef, TransportError>;

    /// Replace the text (and buttons) of a message the bot sent earlier.
    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        buttons: &[Button],
    ) -> Result<(), TransportError>;
}

/// Access-control collaborator.
#[async_trait]
pub trait Access: Send + Sync {
    /// `true` when `user` belongs to every channel in `channels`.
    async fn is_member(&self, channels: &[Channel], user: UserId) -> bool;

    /// `true` when `user` may run privileged flows (channel management).
    fn is_admin(&self, user: UserId) -> bool;
}
