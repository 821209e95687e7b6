//! Store manager owning the SQLite connection.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::migrations;

/// Store manager that owns the SQLite connection.
///
/// Both keyed stores (media cache, video history) live in the same database
/// file; readers and writers serialize at the connection. Share a handle
/// with `Arc<Database>`.
pub struct Database {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the store at the given path and bring the schema up
    /// to date.
    pub fn open(db_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)
            .map_err(|e| StoreError::open_failed(format!("{}: {}", db_path.display(), e)))?;

        Self::init(conn, Some(db_path))
    }

    /// Open an in-memory store. Used by tests and throwaway sessions.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::open_failed(e.to_string()))?;

        Self::init(conn, None)
    }

    fn init(conn: Connection, db_path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;

        migrations::run_migrations(&conn)?;

        match &db_path {
            Some(path) => info!(path = %path.display(), "Store opened"),
            None => info!("In-memory store opened"),
        }

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Execute a function with exclusive access to the connection.
    pub(crate) fn with_connection<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::lock(e.to_string()))?;
        f(&mut conn)
    }

    /// Path of the backing database file, if any.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}
