//! [`Access`] backed by `getChatMember` and the configured admin list.

use std::collections::HashSet;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, warn};

use tickler_core::transport::Access;
use tickler_core::{Channel, UserId};

pub struct TelegramAccess {
    bot: Bot,
    admins: HashSet<u64>,
    link_prefix: String,
}

impl TelegramAccess {
    pub fn new(bot: Bot, admin_ids: &[u64], link_prefix: impl Into<String>) -> Self {
        Self {
            bot,
            admins: admin_ids.iter().copied().collect(),
            link_prefix: link_prefix.into(),
        }
    }
}

#[async_trait]
impl Access for TelegramAccess {
    /// Fails closed: a channel the bot cannot query counts as not joined.
    /// Links that name no checkable chat (private invite links) are skipped.
    async fn is_member(&self, channels: &[Channel], user: UserId) -> bool {
        for channel in channels {
            let Some(recipient) = channel_recipient(&channel.link, &self.link_prefix) else {
                warn!(channel_id = %channel.id, link = %channel.link, "cannot check membership for link; skipping");
                continue;
            };
            match self
                .bot
                .get_chat_member(recipient, teloxide::types::UserId(user.0))
                .await
            {
                Ok(member) if member.kind.is_present() => {}
                Ok(_) => {
                    debug!(user = %user, channel_id = %channel.id, "not a channel member");
                    return false;
                }
                Err(e) => {
                    warn!(user = %user, channel_id = %channel.id, error = %e, "getChatMember failed");
                    return false;
                }
            }
        }
        true
    }

    fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user.0)
    }
}

/// The chat a stored channel link refers to.
///
/// Accepts `https://t.me/name`, `t.me/name`, `@name`, `name` and numeric
/// chat ids. Returns `None` for invite links (`t.me/+…`, `joinchat/…`).
pub fn channel_recipient(link: &str, link_prefix: &str) -> Option<Recipient> {
    let link = link.trim();
    let rest = link
        .strip_prefix(link_prefix)
        .or_else(|| link.strip_prefix("https://t.me/"))
        .or_else(|| link.strip_prefix("http://t.me/"))
        .or_else(|| link.strip_prefix("t.me/"))
        .unwrap_or(link);
    let name = rest
        .trim_start_matches('@')
        .split(['/', '?'])
        .next()
        .unwrap_or_default();

    if name.is_empty() || name.starts_with('+') || name == "joinchat" {
        return None;
    }
    if let Ok(id) = name.parse::<i64>() {
        return Some(Recipient::Id(ChatId(id)));
    }
    Some(Recipient::ChannelUsername(format!("@{name}")))
}
