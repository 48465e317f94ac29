//! Telegram channel adapter.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and drives the long-polling event
//! loop. Long polling, so no public URL is required.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use tickler_router::Router;

use crate::error::TelegramError;
use crate::handler::{handle_callback, handle_message};

/// Build the shared `Bot`. A missing or blank token is a startup error.
pub fn bot_from_token(token: Option<&str>) -> Result<Bot, TelegramError> {
    match token.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(Bot::new(t)),
        _ => Err(TelegramError::NoToken),
    }
}

pub struct TelegramAdapter {
    bot: Bot,
    router: Arc<Router>,
}

impl TelegramAdapter {
    pub fn new(bot: Bot, router: Arc<Router>) -> Self {
        Self { bot, router }
    }

    /// Check the token against the Bot API and return the bot's username.
    pub async fn verify(&self) -> Result<String, TelegramError> {
        let me = self.bot.get_me().await?;
        Ok(me.user.username.clone().unwrap_or_default())
    }

    /// Drive the long-polling loop. Returns only when the dispatcher stops.
    pub async fn run(self) {
        info!("Telegram: starting long-polling dispatcher");

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handle_message))
            .branch(Update::filter_callback_query().endpoint(handle_callback));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.router])
            .default_handler(|_upd| async {})
            .build()
            .dispatch()
            .await;

        info!("Telegram: dispatcher stopped");
    }
}
