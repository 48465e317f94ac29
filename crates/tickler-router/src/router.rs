use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use tickler_conversation::{classify, ConversationState, ConversationTracker, LinkPolicy, TextIntent};
use tickler_core::action::Action;
use tickler_core::config::BotConfig;
use tickler_core::due::parse_due;
use tickler_core::transport::{Access, Transport};
use tickler_core::{ChannelId, MessageRef, ReminderId, Sender};
use tickler_scheduler::{AckOutcome, Scheduler};
use tickler_store::ChannelStore;

use crate::command::Command;
use crate::error::Result;
use crate::inbound::Inbound;
use crate::replies::{self, Screen};

/// Routes inbound events for every user.
///
/// Each event runs under its sender's conversation lock, so two messages from
/// the same user are handled one after the other.
pub struct Router {
    scheduler: Arc<Scheduler>,
    channels: Arc<ChannelStore>,
    conversations: ConversationTracker,
    transport: Arc<dyn Transport>,
    access: Arc<dyn Access>,
    links: LinkPolicy,
}

impl Router {
    pub fn new(
        scheduler: Arc<Scheduler>,
        channels: Arc<ChannelStore>,
        transport: Arc<dyn Transport>,
        access: Arc<dyn Access>,
        bot: &BotConfig,
    ) -> Self {
        Self {
            scheduler,
            channels,
            conversations: ConversationTracker::new(),
            transport,
            access,
            links: LinkPolicy::new(bot.channel_link_prefix.clone(), bot.link_override),
        }
    }

    pub fn conversations(&self) -> &ConversationTracker {
        &self.conversations
    }

    pub async fn handle(&self, event: Inbound) -> Result<()> {
        match event {
            Inbound::Text { sender, text } => self.handle_text(sender, &text).await,
            Inbound::Action {
                sender,
                action_id,
                message,
            } => self.handle_action(sender, &action_id, message).await,
        }
    }

    /// Typed text: slash commands first, then free text routed by state.
    #[instrument(skip(self, text), fields(user = %sender.user, chat = %sender.chat))]
    pub async fn handle_text(&self, sender: Sender, text: &str) -> Result<()> {
        let mut state = self.conversations.lock(sender.user).await;

        if let Some(cmd) = Command::parse(text) {
            return self.on_command(sender, cmd, &mut state).await;
        }

        let intent = classify(&state, text, &self.links);
        debug!(state = state.name(), ?intent, "free text");
        match intent {
            TextIntent::ChannelLink { link } => self.on_channel_link(sender, &link, &mut state).await,
            TextIntent::ReminderText { text } => {
                if !self.admit(sender).await? {
                    return Ok(());
                }
                if text.is_empty() {
                    return self.send(sender, Screen::plain(replies::REMINDER_TEXT_PROMPT)).await;
                }
                *state = ConversationState::AwaitingReminderDate { text };
                self.send(sender, Screen::plain(replies::date_prompt())).await
            }
            TextIntent::ReminderDate { text, raw } => {
                if !self.admit(sender).await? {
                    return Ok(());
                }
                let due = match parse_due(&raw) {
                    Ok(due) => due,
                    Err(e) => {
                        debug!(error = %e, "rejected due time");
                        return self.send(sender, Screen::plain(replies::invalid_date())).await;
                    }
                };
                let id = self.scheduler.store().create(sender.chat, &text, due)?;
                *state = ConversationState::Idle;
                info!(reminder_id = %id, owner = %sender.chat, %due, "reminder created");
                self.send(sender, Screen::plain(replies::REMINDER_SET)).await
            }
            TextIntent::Stray { .. } => self.send(sender, Screen::plain(replies::IDLE_HINT)).await,
        }
    }

    /// Button press. Actions carry their own context; only `press_button`
    /// and `restart` touch conversation state.
    #[instrument(skip(self, message), fields(user = %sender.user, chat = %sender.chat))]
    pub async fn handle_action(
        &self,
        sender: Sender,
        action_id: &str,
        message: MessageRef,
    ) -> Result<()> {
        let mut state = self.conversations.lock(sender.user).await;

        let action = Action::try_decode(action_id).unwrap_or_else(|e| {
            warn!(payload = action_id, error = %e, "undecodable button payload");
            Action::Unknown(action_id.to_string())
        });
        debug!(%action, "button action");

        match action {
            Action::Done(id) => self.on_done(sender, id, message).await,
            Action::Delete(id) => self.on_delete(sender, id, message).await,
            Action::RemoveChannel(id) => self.on_remove_channel(sender, id, message).await,
            Action::SetReminder => {
                if !self.admit(sender).await? {
                    return Ok(());
                }
                *state = ConversationState::AwaitingReminderText;
                self.edit(message, replies::REMINDER_TEXT_PROMPT).await
            }
            Action::ShowReminders => {
                if !self.admit(sender).await? {
                    return Ok(());
                }
                let reminders = self.scheduler.store().list(sender.chat)?;
                self.send(sender, replies::reminder_list(&reminders)).await
            }
            Action::Restart => {
                if !self.admit(sender).await? {
                    return Ok(());
                }
                *state = ConversationState::Idle;
                self.send(sender, Screen::plain(replies::RESTARTING)).await?;
                self.send(sender, replies::welcome(self.access.is_admin(sender.user))).await
            }
            Action::Unknown(payload) => self.edit(message, &replies::invalid_callback(&payload)).await,
        }
    }

    // --- commands ----------------------------------------------------------

    async fn on_command(
        &self,
        sender: Sender,
        cmd: Command,
        state: &mut ConversationState,
    ) -> Result<()> {
        debug!(?cmd, "command");
        let is_admin = self.access.is_admin(sender.user);

        if cmd.is_admin_only() {
            if !is_admin {
                warn!(?cmd, "admin command from non-admin");
                let text = match cmd {
                    Command::RemoveChannel => replies::NOT_AUTHORIZED_REMOVE,
                    _ => replies::NOT_AUTHORIZED,
                };
                return self.send(sender, Screen::plain(text)).await;
            }
        } else if cmd != Command::Cancel && !self.admit(sender).await? {
            return Ok(());
        }

        match cmd {
            Command::Start | Command::Help => self.send(sender, replies::welcome(is_admin)).await,
            Command::Restart => {
                *state = ConversationState::Idle;
                self.send(sender, replies::welcome(is_admin)).await
            }
            Command::SetReminder => {
                *state = ConversationState::AwaitingReminderText;
                self.send(sender, Screen::plain(replies::REMINDER_TEXT_PROMPT)).await
            }
            Command::MyReminders => {
                let reminders = self.scheduler.store().list(sender.chat)?;
                self.send(sender, replies::reminder_list(&reminders)).await
            }
            Command::DeleteReminder => {
                let reminders = self.scheduler.store().list(sender.chat)?;
                self.send(sender, replies::delete_picker(&reminders)).await
            }
            Command::AddChannel => {
                *state = ConversationState::AwaitingChannelLink;
                self.send(sender, Screen::plain(replies::CHANNEL_LINK_PROMPT)).await
            }
            Command::RemoveChannel => {
                let channels = self.channels.list()?;
                self.send(sender, replies::channel_picker(&channels)).await
            }
            Command::Cancel => {
                let text = if state.is_idle() {
                    replies::NOTHING_TO_CANCEL
                } else {
                    *state = ConversationState::Idle;
                    replies::CANCELLED
                };
                self.send(sender, Screen::plain(text)).await
            }
            Command::Unknown(name) => {
                debug!(command = %name, "unknown command");
                self.send(sender, Screen::plain(replies::UNKNOWN_COMMAND)).await
            }
        }
    }

    // --- flows -------------------------------------------------------------

    /// A channel link, either awaited or caught by the link override.
    async fn on_channel_link(
        &self,
        sender: Sender,
        link: &str,
        state: &mut ConversationState,
    ) -> Result<()> {
        if !self.access.is_admin(sender.user) {
            warn!(%link, "channel link from non-admin rejected");
            return self.send(sender, Screen::plain(replies::LINK_REJECTED)).await;
        }
        if link.is_empty() {
            return self.send(sender, Screen::plain(replies::CHANNEL_LINK_PROMPT)).await;
        }

        let id = self.channels.add(link)?;
        if !state.is_idle() {
            debug!(abandoned = %state, "channel link resets pending flow");
        }
        *state = ConversationState::Idle;
        info!(channel_id = %id, "channel added by admin");
        self.send(sender, Screen::plain(replies::channel_saved(link))).await
    }

    async fn on_done(&self, sender: Sender, id: ReminderId, message: MessageRef) -> Result<()> {
        if let Some(reminder) = self.scheduler.store().get(id)? {
            if reminder.owner != sender.chat {
                warn!(reminder_id = %id, owner = %reminder.owner, "done pressed for foreign reminder");
                return self.edit(message, &replies::no_job(id)).await;
            }
        }

        match self.scheduler.acknowledge(id)? {
            AckOutcome::Acknowledged => self.edit(message, &replies::marked_done(id)).await,
            AckOutcome::NotArmed => self.edit(message, &replies::no_job(id)).await,
        }
    }

    async fn on_delete(&self, sender: Sender, id: ReminderId, message: MessageRef) -> Result<()> {
        match self.scheduler.store().get(id)? {
            Some(reminder) if reminder.owner == sender.chat => {
                self.scheduler.retire(id)?;
                info!(reminder_id = %id, "reminder deleted by owner");
                self.edit(message, &replies::reminder_deleted(id)).await
            }
            Some(reminder) => {
                warn!(reminder_id = %id, owner = %reminder.owner, "delete pressed for foreign reminder");
                self.edit(message, &replies::reminder_not_found(id)).await
            }
            None => self.edit(message, &replies::reminder_not_found(id)).await,
        }
    }

    async fn on_remove_channel(
        &self,
        sender: Sender,
        id: ChannelId,
        message: MessageRef,
    ) -> Result<()> {
        if !self.access.is_admin(sender.user) {
            warn!(channel_id = %id, "channel removal from non-admin rejected");
            return self.edit(message, replies::NOT_AUTHORIZED_REMOVE).await;
        }
        if self.channels.remove(id)? {
            self.edit(message, &replies::channel_removed(id)).await
        } else {
            self.edit(message, &replies::channel_not_found(id)).await
        }
    }

    // --- helpers -----------------------------------------------------------

    /// Membership gate. Admins always pass; with no registered channels
    /// everyone passes. Otherwise a non-member gets the join screen and `false`.
    async fn admit(&self, sender: Sender) -> Result<bool> {
        if self.access.is_admin(sender.user) {
            return Ok(true);
        }
        let channels = self.channels.list()?;
        if channels.is_empty() || self.access.is_member(&channels, sender.user).await {
            return Ok(true);
        }
        debug!(channels = channels.len(), "user has not joined every channel");
        self.send(sender, replies::join_channels(&channels, &self.links.prefix))
            .await?;
        Ok(false)
    }

    async fn send(&self, sender: Sender, screen: Screen) -> Result<()> {
        self.transport
            .send(sender.chat, &screen.text, &screen.buttons)
            .await?;
        Ok(())
    }

    async fn edit(&self, message: MessageRef, text: &str) -> Result<()> {
        self.transport.edit(message, text, &[]).await?;
        Ok(())
    }
}
