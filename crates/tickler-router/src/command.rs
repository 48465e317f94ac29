/// Slash commands understood by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Restart,
    SetReminder,
    MyReminders,
    DeleteReminder,
    AddChannel,
    RemoveChannel,
    Cancel,
    /// Any other `/word`, kept for the reply.
    Unknown(String),
}

impl Command {
    /// Decode a slash command. Returns `None` when `text` is not a command.
    ///
    /// Arguments after the command word are ignored, as is a `@botname`
    /// suffix (`/start@tickler_bot`). Matching is case-insensitive.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?;
        let word = word.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word);
        if name.is_empty() {
            return None;
        }

        let cmd = match name.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "restart" => Command::Restart,
            "setreminder" => Command::SetReminder,
            "myreminders" => Command::MyReminders,
            "deletereminder" => Command::DeleteReminder,
            "addchannel" => Command::AddChannel,
            "removechannel" => Command::RemoveChannel,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name.to_string()),
        };
        Some(cmd)
    }

    pub fn is_admin_only(&self) -> bool {
        matches!(self, Command::AddChannel | Command::RemoveChannel)
    }
}
