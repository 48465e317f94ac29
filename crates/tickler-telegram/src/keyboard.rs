//! Message shaping for Telegram: inline keyboards and the 4096-char limit.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use tickler_core::transport::Button;

use crate::error::TelegramError;

/// Maximum characters per Telegram message (limit is 4096; we use 4090 for safety).
const CHUNK_MAX: usize = 4090;

/// One button per row, in order.
pub fn markup(buttons: &[Button]) -> Result<InlineKeyboardMarkup, TelegramError> {
    let rows = buttons
        .iter()
        .map(|b| to_inline(b).map(|btn| vec![btn]))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

fn to_inline(button: &Button) -> Result<InlineKeyboardButton, TelegramError> {
    match button {
        Button::Action { label, action_id } => {
            Ok(InlineKeyboardButton::callback(label.clone(), action_id.clone()))
        }
        Button::Link { label, url } => {
            let parsed = reqwest::Url::parse(url).map_err(|e| TelegramError::BadUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
            Ok(InlineKeyboardButton::url(label.clone(), parsed))
        }
    }
}

/// Split `text` into chunks Telegram accepts, preferring line boundaries.
///
/// Long reminder lists are the only texts that get near the limit.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.chars().count() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.split('\n') {
        let needed = current.chars().count() + line.chars().count() + 1;
        if !current.is_empty() && needed > CHUNK_MAX {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);

        // A single line longer than the limit is force-split.
        while current.chars().count() > CHUNK_MAX {
            let split_at = current
                .char_indices()
                .nth(CHUNK_MAX)
                .map(|(i, _)| i)
                .unwrap_or(current.len());
            let rest = current.split_off(split_at);
            chunks.push(std::mem::replace(&mut current, rest));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
