//! [`Transport`] over the Telegram Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

use tickler_core::transport::{Button, Transport, TransportError};
use tickler_core::{MessageRef, OwnerId};

use crate::keyboard::{markup, split_chunks};

/// Sends and edits messages with a shared teloxide `Bot`.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    /// Long texts go out in several messages; buttons ride on the last one,
    /// which is the message returned.
    async fn send(
        &self,
        recipient: OwnerId,
        text: &str,
        buttons: &[Button],
    ) -> Result<MessageRef, TransportError> {
        let chat_id = ChatId(recipient.0);
        let keyboard = markup(buttons).map_err(|e| TransportError::Transient(e.to_string()))?;
        let chunks = split_chunks(text);
        let last = chunks.len().saturating_sub(1);

        let mut sent = None;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let request = self.bot.send_message(chat_id, chunk);
            let result = if i == last && !buttons.is_empty() {
                request.reply_markup(keyboard.clone()).await
            } else {
                request.await
            };
            sent = Some(result.map_err(|e| classify(&e))?);
        }

        let message = sent.ok_or_else(|| TransportError::Transient("empty message".into()))?;
        debug!(chat = recipient.0, message_id = message.id.0, "telegram: message sent");
        Ok(MessageRef {
            chat: recipient,
            message_id: message.id.0,
        })
    }

    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        buttons: &[Button],
    ) -> Result<(), TransportError> {
        let request = self
            .bot
            .edit_message_text(ChatId(message.chat.0), MessageId(message.message_id), text);
        let result = if buttons.is_empty() {
            request.await
        } else {
            let keyboard =
                markup(buttons).map_err(|e| TransportError::Transient(e.to_string()))?;
            request.reply_markup(keyboard).await
        };

        match result {
            Ok(_) => Ok(()),
            // Pressing the same button twice edits to identical text.
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => {
                warn!(chat = message.chat.0, message_id = message.message_id, error = %e, "telegram: edit failed");
                Err(classify(&e))
            }
        }
    }
}

/// Sort a Bot API failure into terminal (the chat is gone for good) or transient.
pub fn classify(err: &RequestError) -> TransportError {
    match err {
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::ChatNotFound
            | ApiError::UserDeactivated
            | ApiError::CantInitiateConversation,
        ) => TransportError::Unreachable(err.to_string()),
        _ => TransportError::Transient(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_chats_are_terminal() {
        for api in [ApiError::BotBlocked, ApiError::ChatNotFound, ApiError::UserDeactivated] {
            assert!(classify(&RequestError::Api(api)).is_terminal());
        }
    }

    #[test]
    fn other_api_errors_are_transient() {
        let err = RequestError::Api(ApiError::Unknown("Bad Gateway".into()));
        assert!(!classify(&err).is_terminal());
        let err = RequestError::Api(ApiError::MessageNotModified);
        assert!(!classify(&err).is_terminal());
    }
}
