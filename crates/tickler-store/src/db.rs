use rusqlite::Connection;

use crate::error::Result;

/// Initialise the reminder and channel tables. Safe to call on every startup.
///
/// Column names (`chat_id`, `date`) match the legacy `reminders.db` layout so
/// an existing database can be opened in place.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reminders (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id INTEGER,
            text    TEXT,
            date    TEXT            -- YYYY-MM-DD HH:MM[:SS], local wall clock
        );
        CREATE INDEX IF NOT EXISTS idx_reminders_chat ON reminders (chat_id);

        CREATE TABLE IF NOT EXISTS channels (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            link TEXT
        );
        ",
    )?;
    Ok(())
}

/// Open an in-memory database with the schema applied.
///
/// Used by tests across the workspace.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_db(&conn)?;
    Ok(conn)
}
