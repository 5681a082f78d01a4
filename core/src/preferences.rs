/// SQLite-backed key-value preferences.
///
/// Holds small durable flags such as the "existing user" marker.
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::entry::PersistentStore;
use crate::error::Result;

pub struct Preferences {
    conn: Mutex<Connection>,
}

impl Preferences {
    /// Open (or create) the preferences DB at `path`.
    pub fn open_at(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }
        let conn = Connection::open(path).context("Failed to open preferences database")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        let prefs = Self {
            conn: Mutex::new(conn),
        };
        prefs.init_schema()?;
        Ok(prefs)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let prefs = Self {
            conn: Mutex::new(conn),
        };
        prefs.init_schema()?;
        Ok(prefs)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS preferences (
                key         TEXT    PRIMARY KEY,
                value       TEXT    NOT NULL,
                updated_at  INTEGER NOT NULL
            );",
            )
            .context("Failed to initialize preferences schema")
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        self.conn().execute(
            "INSERT INTO preferences (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }
}

#[async_trait]
impl PersistentStore for Preferences {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EXISTING_USER_KEY;

    #[test]
    fn set_and_overwrite() {
        let prefs = Preferences::open_in_memory().unwrap();
        assert_eq!(prefs.get("theme").unwrap(), None);
        prefs.set("theme", "dark").unwrap();
        assert_eq!(prefs.get("theme").unwrap().as_deref(), Some("dark"));
        prefs.set("theme", "light").unwrap();
        assert_eq!(prefs.get("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.db");
        {
            let prefs = Preferences::open_at(&path).unwrap();
            prefs.set(EXISTING_USER_KEY, "true").unwrap();
        }
        let prefs = Preferences::open_at(&path).unwrap();
        assert_eq!(prefs.get(EXISTING_USER_KEY).unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn persistent_store_reads_marker() {
        let prefs = Preferences::open_in_memory().unwrap();
        assert_eq!(prefs.get_item(EXISTING_USER_KEY).await.unwrap(), None);
        prefs.set(EXISTING_USER_KEY, "true").unwrap();
        assert!(prefs.get_item(EXISTING_USER_KEY).await.unwrap().is_some());
    }
}
