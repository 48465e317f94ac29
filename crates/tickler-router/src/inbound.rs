use tickler_core::{MessageRef, Sender};

/// One event from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A typed message, slash commands included.
    Text { sender: Sender, text: String },
    /// A button press on a message the bot sent.
    Action {
        sender: Sender,
        action_id: String,
        message: MessageRef,
    },
}
