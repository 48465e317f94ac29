use std::fmt;

/// Where a user is in a multi-step flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingReminderText,
    /// Text collected, waiting for a due time.
    AwaitingReminderDate { text: String },
    AwaitingChannelLink,
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short stable name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingReminderText => "awaiting_reminder_text",
            Self::AwaitingReminderDate { .. } => "awaiting_reminder_date",
            Self::AwaitingChannelLink => "awaiting_channel_link",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How channel links are recognised in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    pub prefix: String,
    /// When set, a link is treated as a channel submission in any state.
    pub override_pending: bool,
}

impl LinkPolicy {
    pub fn new(prefix: impl Into<String>, override_pending: bool) -> Self {
        Self {
            prefix: prefix.into(),
            override_pending,
        }
    }

    pub fn is_link(&self, text: &str) -> bool {
        text.starts_with(&self.prefix)
    }
}

/// What a piece of free text means given the sender's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextIntent {
    /// Register `link` as a gating channel.
    ChannelLink { link: String },
    /// The body of a new reminder.
    ReminderText { text: String },
    /// A due time for the reminder whose body was collected earlier.
    ReminderDate { text: String, raw: String },
    /// Text with no flow to continue.
    Stray { text: String },
}

/// Route free text by state. Content only matters for the channel-link override.
pub fn classify(state: &ConversationState, text: &str, links: &LinkPolicy) -> TextIntent {
    let text = text.trim();
    if links.override_pending && links.is_link(text) {
        return TextIntent::ChannelLink {
            link: text.to_string(),
        };
    }

    match state {
        ConversationState::Idle => TextIntent::Stray {
            text: text.to_string(),
        },
        ConversationState::AwaitingReminderText => TextIntent::ReminderText {
            text: text.to_string(),
        },
        ConversationState::AwaitingReminderDate { text: body } => TextIntent::ReminderDate {
            text: body.clone(),
            raw: text.to_string(),
        },
        ConversationState::AwaitingChannelLink => TextIntent::ChannelLink {
            link: text.to_string(),
        },
    }
}
