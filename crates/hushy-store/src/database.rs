//! The cache database handle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

const FILE_NAME: &str = "hushy.db";

/// A migrated SQLite connection. Every cache operation is an `impl` block
/// on this type, spread over the sibling modules.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the cache in the platform cache directory, e.g.
    /// `~/.cache/hushy/hushy.db` on Linux.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("app", "hushy", "hushy").ok_or(StoreError::NoDataDir)?;
        let path = dirs.cache_dir().join(FILE_NAME);
        tracing::info!(path = %path.display(), "opening cache database");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        // another handle may hold the file briefly during a restart
        conn.busy_timeout(Duration::from_secs(2))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::with_connection(conn)
    }

    /// Cache that disappears with the handle.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing the cache; `None` when it is in memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    pub fn schema_version(&self) -> Result<u32> {
        migrations::schema_version(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join(FILE_NAME);

        let db = Database::open_at(&path).unwrap();
        assert!(path.exists());
        assert!(db.path().is_some_and(|p| p.ends_with(FILE_NAME)));
    }

    #[test]
    fn in_memory_has_no_path() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.path().is_none());
        assert_eq!(db.schema_version().unwrap(), migrations::CURRENT_VERSION);
    }

    #[test]
    fn reopening_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_put("greeting", &"hello").unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        let entry = db.kv_get::<String>("greeting").unwrap().unwrap();
        assert_eq!(entry.value, "hello");
    }
}
