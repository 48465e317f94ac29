//! Update handlers registered in the teloxide Dispatcher.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, warn};

use tickler_core::{MessageRef, OwnerId, Sender};
use tickler_router::Router;

/// Text messages and slash commands.
pub async fn handle_message(msg: Message, router: Arc<Router>) -> ResponseResult<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    // Ignore other bots.
    if from.is_bot {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        debug!(chat = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };

    let sender = Sender::new(from.id.0, msg.chat.id.0);
    if let Err(e) = router.handle_text(sender, text).await {
        warn!(user = %sender.user, chat = %sender.chat, error = %e, "Telegram: message handling failed");
    }
    Ok(())
}

/// Inline button presses.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, router: Arc<Router>) -> ResponseResult<()> {
    // Stop the client-side spinner first; a late answer is harmless.
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        debug!(error = %e, "answerCallbackQuery failed");
    }

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        debug!(user = q.from.id.0, "callback without data or message");
        return Ok(());
    };

    let chat = message.chat().id;
    let sender = Sender::new(q.from.id.0, chat.0);
    let target = MessageRef {
        chat: OwnerId(chat.0),
        message_id: message.id().0,
    };
    if let Err(e) = router.handle_action(sender, data, target).await {
        warn!(user = %sender.user, chat = %sender.chat, payload = data, error = %e, "Telegram: callback handling failed");
    }
    Ok(())
}
