//! Button action ids.
//!
//! Wire format (kept compatible with messages already sitting in users' chats):
//!
//! | Action          | Payload               |
//! |-----------------|-----------------------|
//! | `Done`          | `done_<id>`           |
//! | `Delete`        | `delete_<id>`         |
//! | `RemoveChannel` | `remove_channel_<id>` |
//! | `SetReminder`   | `press_button`        |
//! | `ShowReminders` | `my_reminders`        |
//! | `Restart`       | `restart`             |
//!
//! Payloads are split on `_`; the token count is checked before the trailing
//! id is parsed, so a malformed payload never reaches a handler.

use std::fmt;

use thiserror::Error;

use crate::types::{ChannelId, ReminderId};

const DELIMITER: char = '_';

/// A decoded button action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Done(ReminderId),
    Delete(ReminderId),
    RemoveChannel(ChannelId),
    SetReminder,
    ShowReminders,
    Restart,
    /// Anything that failed to decode; carries the raw payload for diagnostics.
    Unknown(String),
}

/// Why a payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionDecodeError {
    #[error("unknown action verb {0:?}")]
    UnknownVerb(String),

    #[error("{verb}: expected {expected} tokens, got {got}")]
    Arity {
        verb: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{verb}: id {token:?} is not a number")]
    BadId { verb: &'static str, token: String },
}

impl Action {
    /// Decode a payload, folding every failure into [`Action::Unknown`].
    pub fn decode(payload: &str) -> Action {
        Self::try_decode(payload).unwrap_or_else(|_| Action::Unknown(payload.to_string()))
    }

    /// Decode a payload, reporting why it was rejected.
    pub fn try_decode(payload: &str) -> Result<Action, ActionDecodeError> {
        let tokens: Vec<&str> = payload.trim().split(DELIMITER).collect();
        let verb = tokens.first().copied().unwrap_or_default();

        match verb {
            "done" => {
                expect_arity("done", &tokens, 2)?;
                parse_id("done", tokens[1]).map(|id| Action::Done(ReminderId(id)))
            }
            "delete" => {
                expect_arity("delete", &tokens, 2)?;
                parse_id("delete", tokens[1]).map(|id| Action::Delete(ReminderId(id)))
            }
            "remove" => {
                expect_arity("remove_channel", &tokens, 3)?;
                if tokens[1] != "channel" {
                    return Err(ActionDecodeError::UnknownVerb(format!("remove_{}", tokens[1])));
                }
                parse_id("remove_channel", tokens[2]).map(|id| Action::RemoveChannel(ChannelId(id)))
            }
            "press" if tokens == ["press", "button"] => Ok(Action::SetReminder),
            "my" if tokens == ["my", "reminders"] => Ok(Action::ShowReminders),
            "restart" => {
                expect_arity("restart", &tokens, 1)?;
                Ok(Action::Restart)
            }
            _ => Err(ActionDecodeError::UnknownVerb(payload.to_string())),
        }
    }

    /// Render the payload for a button.
    pub fn encode(&self) -> String {
        match self {
            Action::Done(id) => format!("done_{id}"),
            Action::Delete(id) => format!("delete_{id}"),
            Action::RemoveChannel(id) => format!("remove_channel_{id}"),
            Action::SetReminder => "press_button".to_string(),
            Action::ShowReminders => "my_reminders".to_string(),
            Action::Restart => "restart".to_string(),
            Action::Unknown(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn expect_arity(
    verb: &'static str,
    tokens: &[&str],
    expected: usize,
) -> Result<(), ActionDecodeError> {
    if tokens.len() != expected {
        return Err(ActionDecodeError::Arity {
            verb,
            expected,
            got: tokens.len(),
        });
    }
    Ok(())
}

fn parse_id(verb: &'static str, token: &str) -> Result<i64, ActionDecodeError> {
    token.parse::<i64>().map_err(|_| ActionDecodeError::BadId {
        verb,
        token: token.to_string(),
    })
}
