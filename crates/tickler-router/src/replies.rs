//! User-facing texts and keyboards.

use tickler_core::action::Action;
use tickler_core::due::INPUT_HINT;
use tickler_core::transport::Button;
use tickler_core::{Channel, ChannelId, Reminder, ReminderId};

pub const REMINDER_TEXT_PROMPT: &str = "Please enter the text of the reminder:";
pub const REMINDER_SET: &str = "Reminder set successfully!";
pub const CHANNEL_LINK_PROMPT: &str = "Please provide the link to the Telegram channel.";
pub const LINK_REJECTED: &str = "Invalid command or unauthorized.";
pub const NOT_AUTHORIZED: &str = "You are not authorized to use this command.";
pub const NOT_AUTHORIZED_REMOVE: &str = "You are not authorized to remove channels.";
pub const RESTARTING: &str = "Restarting...";
pub const IDLE_HINT: &str =
    "Use /setreminder to set a reminder. You can also use /myreminders to see your reminders.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Use /help to see what I can do.";
pub const CANCELLED: &str = "Cancelled.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";

const WELCOME: &str =
    "Welcome! Use /setreminder to set a reminder. You can also use /myreminders to see your reminders.";
const ADMIN_HINT: &str = "You are an admin. Use /addchannel to add a new channel. \
                          Additionally, you can use /removechannel to remove a channel.";

/// A message body plus its buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl Screen {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    fn with_buttons(text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Self {
            text: text.into(),
            buttons,
        }
    }
}

pub fn welcome(is_admin: bool) -> Screen {
    let text = if is_admin {
        format!("{WELCOME}\n\n{ADMIN_HINT}")
    } else {
        WELCOME.to_string()
    };
    Screen::with_buttons(
        text,
        vec![
            Button::action("Set Reminder", Action::SetReminder.encode()),
            Button::action("My Reminders", Action::ShowReminders.encode()),
        ],
    )
}

/// Shown to users who have not joined every registered channel.
pub fn join_channels(channels: &[Channel], link_prefix: &str) -> Screen {
    let buttons = channels
        .iter()
        .enumerate()
        .map(|(i, ch)| Button::link(format!("Join Channel {}", i + 1), join_url(&ch.link, link_prefix)))
        .collect();
    Screen::with_buttons(
        "Welcome!\n\nTo use our bot, join all specified channels first.\n\n\
         Use the buttons below to join, then send /start again.",
        buttons,
    )
}

/// A clickable URL for a stored channel link. Bare `@name` / `name` links get
/// the configured prefix.
pub fn join_url(link: &str, link_prefix: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("{link_prefix}{}", link.trim_start_matches('@'))
    }
}

pub fn date_prompt() -> String {
    format!("Please provide the date and time for the reminder ({INPUT_HINT}):")
}

pub fn invalid_date() -> String {
    format!("Invalid date format. Please use {INPUT_HINT}.")
}

/// `/myreminders` and the `My Reminders` button.
pub fn reminder_list(reminders: &[Reminder]) -> Screen {
    if reminders.is_empty() {
        return Screen::plain("You have no reminders.");
    }
    let mut text = String::from("Your reminders:\n");
    for r in reminders {
        text.push_str(&format!("{}. {} - {}\n", r.id, r.text, r.due_at));
    }
    Screen::with_buttons(text, delete_buttons(reminders))
}

/// `/deletereminder`.
pub fn delete_picker(reminders: &[Reminder]) -> Screen {
    if reminders.is_empty() {
        return Screen::plain("You have no reminders to delete.");
    }
    Screen::with_buttons("Select a reminder to delete:", delete_buttons(reminders))
}

fn delete_buttons(reminders: &[Reminder]) -> Vec<Button> {
    reminders
        .iter()
        .map(|r| Button::action(format!("Delete {}", r.id), Action::Delete(r.id).encode()))
        .collect()
}

/// `/removechannel`.
pub fn channel_picker(channels: &[Channel]) -> Screen {
    if channels.is_empty() {
        return Screen::plain("No channels to remove.");
    }
    let buttons = channels
        .iter()
        .map(|ch| {
            Button::action(
                format!("Remove {}", ch.link),
                Action::RemoveChannel(ch.id).encode(),
            )
        })
        .collect();
    Screen::with_buttons("Select a channel to remove:", buttons)
}

pub fn channel_saved(link: &str) -> String {
    format!("Channel link saved successfully: {link}")
}

pub fn marked_done(id: ReminderId) -> String {
    format!("Reminder ({id}) marked as done.")
}

pub fn no_job(id: ReminderId) -> String {
    format!("No associated job found for reminder ID {id}.")
}

pub fn reminder_deleted(id: ReminderId) -> String {
    format!("Reminder ({id}) deleted successfully.")
}

pub fn reminder_not_found(id: ReminderId) -> String {
    format!("Reminder ({id}) not found.")
}

pub fn channel_removed(id: ChannelId) -> String {
    format!("Channel ({id}) removed successfully.")
}

pub fn channel_not_found(id: ChannelId) -> String {
    format!("Channel ({id}) not found.")
}

pub fn invalid_callback(payload: &str) -> String {
    format!("Invalid button callback: {payload}")
}
