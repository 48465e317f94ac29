use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, instrument, warn};

use tickler_core::due::format_due;
use tickler_core::{OwnerId, Reminder, ReminderId};

use crate::error::{Result, StoreError};

/// A stored row whose columns cannot be turned into a [`Reminder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptRow {
    pub id: ReminderId,
    pub reason: String,
}

/// Result of [`ReminderStore::all_pending`]: loadable reminders plus the rows
/// that could not be mapped. One bad row never hides the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pending {
    pub reminders: Vec<Reminder>,
    pub corrupt: Vec<CorruptRow>,
}

/// Durable reminder table.
///
/// Knows nothing about scheduling: the scanner reads [`all_pending`](Self::all_pending)
/// and decides what to arm on its own.
pub struct ReminderStore {
    db: Mutex<Connection>,
}

impl ReminderStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-applied SQL
        // statement behind, so the connection is still usable.
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a reminder and return its new id.
    #[instrument(skip(self, text), fields(owner = %owner))]
    pub fn create(&self, owner: OwnerId, text: &str, due_at: NaiveDateTime) -> Result<ReminderId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Empty { field: "reminder text" });
        }
        let db = self.conn();
        db.execute(
            "INSERT INTO reminders (chat_id, text, date) VALUES (?1, ?2, ?3)",
            rusqlite::params![owner.0, text, format_due(due_at)],
        )?;
        let id = ReminderId(db.last_insert_rowid());
        debug!(reminder_id = %id, "reminder created");
        Ok(id)
    }

    /// Fetch one reminder, `None` if it does not exist (or was deleted).
    pub fn get(&self, id: ReminderId) -> Result<Option<Reminder>> {
        let db = self.conn();
        let row = db
            .query_row(
                "SELECT id, chat_id, text, date FROM reminders WHERE id = ?1",
                rusqlite::params![id.0],
                read_row,
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some(Ok(reminder)) => Ok(Some(reminder)),
            Some(Err(corrupt)) => Err(StoreError::Corrupt {
                id: corrupt.id,
                reason: corrupt.reason,
            }),
        }
    }

    /// All reminders owned by `owner`, oldest first. Unreadable rows are skipped.
    pub fn list(&self, owner: OwnerId) -> Result<Vec<Reminder>> {
        let db = self.conn();
        let mut stmt = db.prepare_cached(
            "SELECT id, chat_id, text, date FROM reminders WHERE chat_id = ?1 ORDER BY id",
        )?;
        let mut reminders = Vec::new();
        for row in stmt.query_map(rusqlite::params![owner.0], read_row)? {
            match row? {
                Ok(reminder) => reminders.push(reminder),
                Err(corrupt) => warn!(
                    reminder_id = %corrupt.id,
                    reason = %corrupt.reason,
                    "skipping unreadable reminder"
                ),
            }
        }
        Ok(reminders)
    }

    /// Every stored reminder regardless of owner, oldest first. Used by the scanner.
    pub fn all_pending(&self) -> Result<Pending> {
        let db = self.conn();
        let mut stmt =
            db.prepare_cached("SELECT id, chat_id, text, date FROM reminders ORDER BY id")?;
        let mut pending = Pending::default();
        for row in stmt.query_map([], read_row)? {
            match row? {
                Ok(reminder) => pending.reminders.push(reminder),
                Err(corrupt) => pending.corrupt.push(corrupt),
            }
        }
        Ok(pending)
    }

    /// Delete a reminder. Returns `false` when the id was already gone.
    ///
    /// Never an error for a missing id: acknowledgment and follow-up cleanup
    /// may both try to delete the same row.
    #[instrument(skip(self), fields(reminder_id = %id))]
    pub fn delete(&self, id: ReminderId) -> Result<bool> {
        let db = self.conn();
        let n = db.execute(
            "DELETE FROM reminders WHERE id = ?1",
            rusqlite::params![id.0],
        )?;
        if n == 0 {
            debug!("delete: reminder already gone");
        }
        Ok(n > 0)
    }

    /// Number of stored reminders.
    pub fn count(&self) -> Result<u64> {
        let db = self.conn();
        let n: i64 = db.query_row("SELECT COUNT(*) FROM reminders", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

type RowResult = std::result::Result<Reminder, CorruptRow>;

/// Map a SQLite row to a `Reminder`, or to a [`CorruptRow`] when a column holds
/// something no reminder can be built from.
///
/// Columns are read untyped: SQLite does not enforce declared types, and a
/// strict `get::<String>` on a BLOB would fail the whole query.
/// `text` and `date` are nullable in the legacy schema; missing values load
/// as empty strings and the scanner reports the unparseable date.
fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RowResult> {
    let id = ReminderId(row.get(0)?);
    let corrupt = |reason: String| -> rusqlite::Result<RowResult> {
        Ok(Err(CorruptRow { id, reason }))
    };

    let owner = match row.get_ref(1)? {
        ValueRef::Integer(n) => n,
        ValueRef::Text(t) => {
            match std::str::from_utf8(t).ok().and_then(|t| t.trim().parse::<i64>().ok()) {
                Some(n) => n,
                None => {
                    let raw = String::from_utf8_lossy(t);
                    return corrupt(format!("chat_id is not a number: {raw}"));
                }
            }
        }
        other => return corrupt(format!("chat_id holds {}", other.data_type())),
    };
    let text = match text_column(row.get_ref(2)?) {
        Some(text) => text,
        None => return corrupt("text is not a string".to_string()),
    };
    let due_at = match text_column(row.get_ref(3)?) {
        Some(due_at) => due_at,
        None => return corrupt(format!("date holds {}", row.get_ref(3)?.data_type())),
    };

    Ok(Ok(Reminder {
        id,
        owner: OwnerId(owner),
        text,
        due_at,
    }))
}

/// Text-ish column as a `String`: NULL is empty, numbers are stringified, BLOBs are rejected.
fn text_column(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => Some(String::new()),
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) => std::str::from_utf8(t).ok().map(str::to_owned),
        ValueRef::Blob(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn store() -> ReminderStore {
        ReminderStore::new(open_in_memory().unwrap())
    }

    fn at(s: &str) -> NaiveDateTime {
        tickler_core::due::parse_due(s).unwrap()
    }

    #[test]
    fn create_then_get() {
        let store = store();
        let id = store
            .create(OwnerId(42), "Buy milk", at("2025-03-01 09:00"))
            .unwrap();
        let r = store.get(id).unwrap().unwrap();
        assert_eq!(r.owner, OwnerId(42));
        assert_eq!(r.text, "Buy milk");
        assert_eq!(r.due_at, "2025-03-01 09:00:00");
    }

    #[test]
    fn empty_text_is_rejected() {
        let store = store();
        let err = store.create(OwnerId(1), "   ", at("2025-03-01 09:00"));
        assert!(matches!(err, Err(StoreError::Empty { .. })));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn list_filters_by_owner_in_id_order() {
        let store = store();
        let a = store.create(OwnerId(1), "a", at("2025-03-02 09:00")).unwrap();
        store.create(OwnerId(2), "b", at("2025-03-01 09:00")).unwrap();
        let c = store.create(OwnerId(1), "c", at("2025-03-01 08:00")).unwrap();

        let ids: Vec<_> = store.list(OwnerId(1)).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(store.all_pending().unwrap().reminders.len(), 3);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = store();
        let id = store.create(OwnerId(1), "x", at("2025-03-01 09:00")).unwrap();
        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert!(store.get(id).unwrap().is_none());
        assert!(!store.delete(ReminderId(999)).unwrap());
    }

    #[test]
    fn legacy_rows_without_seconds_load() {
        let conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO reminders (chat_id, text, date) VALUES (5, 'old', '2024-01-01 10:30')",
            [],
        )
        .unwrap();
        let store = ReminderStore::new(conn);
        let all = store.all_pending().unwrap().reminders;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].due_at, "2024-01-01 10:30");
        assert!(all[0].due_time().is_ok());
    }

    #[test]
    fn null_date_loads_as_empty_string() {
        let conn = open_in_memory().unwrap();
        conn.execute("INSERT INTO reminders (chat_id, text) VALUES (5, 'no date')", [])
            .unwrap();
        let store = ReminderStore::new(conn);
        let all = store.all_pending().unwrap().reminders;
        assert_eq!(all[0].due_at, "");
        assert!(all[0].due_time().is_err());
    }

    #[test]
    fn mistyped_columns_are_reported_not_fatal() {
        let conn = open_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO reminders (id, chat_id, text, date) VALUES (1, 1, 'blob', x'ff00');
             INSERT INTO reminders (id, chat_id, text, date) VALUES (2, 'abc', 'bad owner', '2025-03-01 09:00');
             INSERT INTO reminders (id, chat_id, text, date) VALUES (3, 1, 'fine', '2025-03-01 09:00');",
        )
        .unwrap();
        let store = ReminderStore::new(conn);

        let pending = store.all_pending().unwrap();
        assert_eq!(pending.reminders.len(), 1);
        assert_eq!(pending.reminders[0].id, ReminderId(3));
        let bad: Vec<_> = pending.corrupt.iter().map(|c| c.id).collect();
        assert_eq!(bad, vec![ReminderId(1), ReminderId(2)]);

        assert_eq!(store.list(OwnerId(1)).unwrap().len(), 1);
        assert!(matches!(store.get(ReminderId(1)), Err(StoreError::Corrupt { .. })));
        assert!(store.get(ReminderId(3)).unwrap().is_some());
    }
}
