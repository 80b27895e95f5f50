//! SQLite database module for blabber
//!
//! One `Database` value implements both store contracts. The connection sits
//! behind a mutex so a handle can be shared across threads; separate handles
//! opened on the same file are serialized by SQLite itself (WAL mode plus a
//! busy timeout).

mod posts;
mod schema;
mod tag_counts;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{BlabberError, Result};

pub use schema::{create_schema, CURRENT_SCHEMA_VERSION};

/// How long a connection waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database for blabber
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database file at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                BlabberError::store_operation(
                    &format!("create database directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            BlabberError::store_operation(&format!("open database at {}", db_path.display()), e)
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| BlabberError::store_operation("enable WAL mode", e))?;

        tracing::debug!(path = %db_path.display(), "opened database");
        Self::init(conn, Some(db_path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BlabberError::store_operation("open in-memory database", e))?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| BlabberError::store_operation("set busy timeout", e))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| BlabberError::store_operation("enable foreign keys", e))?;

        create_schema(&conn)?;

        Ok(Database {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path of the backing file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Acquire the connection for one store operation
    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| BlabberError::store_operation(operation, e))
    }

    pub fn get_schema_version(&self) -> Result<i64> {
        let conn = self.lock("read schema version")?;
        schema::stored_version(&conn)?
            .ok_or_else(|| BlabberError::store_operation("read schema version", "missing"))
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Fold the WAL back into the main file so the next open starts clean
        if self.path.is_some() {
            if let Ok(conn) = self.conn.get_mut() {
                let _ = conn.pragma_update(None, "wal_checkpoint", "TRUNCATE");
            }
        }
    }
}

#[cfg(test)]
mod tests;
