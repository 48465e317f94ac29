//! Due-time text codec.
//!
//! Reminders are stored as local wall-clock text. Rows written by this crate
//! always carry seconds; rows without seconds (older data, hand edits, user
//! input) are accepted through the coarser fallback format.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Format written to the database.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Fallback accepted when the seconds field is missing.
pub const COARSE_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Human-readable shape of [`COARSE_FORMAT`], shown in prompts and errors.
pub const INPUT_HINT: &str = "YYYY-MM-DD HH:MM";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable due time {raw:?} (expected {INPUT_HINT}[:SS])")]
pub struct DueParseError {
    pub raw: String,
}

/// Parse a due time, trying [`STORAGE_FORMAT`] first and [`COARSE_FORMAT`] second.
pub fn parse_due(raw: &str) -> Result<NaiveDateTime, DueParseError> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, STORAGE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, COARSE_FORMAT))
        .map_err(|_| DueParseError {
            raw: raw.to_string(),
        })
}

/// Render a due time in [`STORAGE_FORMAT`].
pub fn format_due(due: NaiveDateTime) -> String {
    due.format(STORAGE_FORMAT).to_string()
}
