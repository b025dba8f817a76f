//! Persisted per-tab navigation state.
//!
//! Stores the last URL of each tab in the `tab_state` table and, for the video
//! tab, when it was last saved. Reads happen once per materialization; writes
//! happen on every navigation and position capture, last write wins.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};

use crate::database::connection::Database;
use crate::services::clock::Clock;
use crate::types::errors::StateError;
use crate::types::tab::TabKind;

const VIDEO_SAVED_AT_KEY: &str = "video_last_saved_at";

/// Trait defining persisted tab state operations.
pub trait TabStateStoreTrait {
    fn save(&self, tab: TabKind, url: &str) -> Result<(), StateError>;
    fn load(&self, tab: TabKind) -> Result<Option<String>, StateError>;
    fn saved_at(&self, tab: TabKind) -> Result<Option<i64>, StateError>;
    fn clear(&self, tab: TabKind) -> Result<(), StateError>;
}

/// SQLite-backed tab state store.
pub struct TabStateStore {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl TabStateStore {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn put(&self, key: &str, value: &str, now: i64) -> Result<(), StateError> {
        self.db
            .connection()
            .execute(
                "INSERT INTO tab_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map_err(|e| StateError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        self.db
            .connection()
            .query_row("SELECT value FROM tab_state WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StateError::DatabaseError(e.to_string()))
    }
}

impl TabStateStoreTrait for TabStateStore {
    /// Saves the URL for `tab`. The video tab also records the save time.
    fn save(&self, tab: TabKind, url: &str) -> Result<(), StateError> {
        let now = self.clock.now();
        self.put(tab.storage_key(), url, now)?;
        if tab.supports_resume() {
            self.put(VIDEO_SAVED_AT_KEY, &now.to_string(), now)?;
        }
        log::debug!("Saved {} state: {}", tab, url);
        Ok(())
    }

    /// Returns the last saved URL, or `None` if nothing was saved yet.
    fn load(&self, tab: TabKind) -> Result<Option<String>, StateError> {
        self.get(tab.storage_key())
    }

    /// Returns when the URL was last saved. Only tracked for resumable tabs.
    fn saved_at(&self, tab: TabKind) -> Result<Option<i64>, StateError> {
        if !tab.supports_resume() {
            return Ok(None);
        }
        Ok(self.get(VIDEO_SAVED_AT_KEY)?.and_then(|v| v.parse().ok()))
    }

    fn clear(&self, tab: TabKind) -> Result<(), StateError> {
        let conn = self.db.connection();
        conn.execute("DELETE FROM tab_state WHERE key = ?1", params![tab.storage_key()])
            .map_err(|e| StateError::DatabaseError(e.to_string()))?;
        if tab.supports_resume() {
            conn.execute("DELETE FROM tab_state WHERE key = ?1", params![VIDEO_SAVED_AT_KEY])
                .map_err(|e| StateError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }
}
