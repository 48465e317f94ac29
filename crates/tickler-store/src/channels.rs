use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tracing::info;

use tickler_core::{Channel, ChannelId};

use crate::error::{Result, StoreError};

/// Admin-managed list of channels a user must join before using the bot.
pub struct ChannelStore {
    db: Mutex<Connection>,
}

impl ChannelStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a channel link and return its id.
    pub fn add(&self, link: &str) -> Result<ChannelId> {
        let link = link.trim();
        if link.is_empty() {
            return Err(StoreError::Empty { field: "channel link" });
        }
        let db = self.conn();
        db.execute("INSERT INTO channels (link) VALUES (?1)", [link])?;
        let id = ChannelId(db.last_insert_rowid());
        info!(channel_id = %id, %link, "channel registered");
        Ok(id)
    }

    /// All registered channels, oldest first.
    pub fn list(&self) -> Result<Vec<Channel>> {
        let db = self.conn();
        let mut stmt = db.prepare_cached("SELECT id, link FROM channels ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Channel {
                id: ChannelId(row.get(0)?),
                link: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Remove a channel. Returns `false` when the id did not exist.
    pub fn remove(&self, id: ChannelId) -> Result<bool> {
        let db = self.conn();
        let n = db.execute("DELETE FROM channels WHERE id = ?1", [id.0])?;
        if n > 0 {
            info!(channel_id = %id, "channel removed");
        }
        Ok(n > 0)
    }
}
