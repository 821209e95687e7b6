//! Store schema migrations.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::StoreResult;

/// Current schema version.
const SCHEMA_VERSION: i32 = 2;

/// Run all necessary migrations to bring the store up to date.
pub fn run_migrations(conn: &Connection) -> StoreResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    debug!(version = SCHEMA_VERSION, "Store schema up to date");
    Ok(())
}

/// Get the current schema version from the store.
fn get_schema_version(conn: &Connection) -> StoreResult<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Initial schema (version 1): media cache plus the original history shape
/// keyed by a reusable auto-incrementing row id.
fn migrate_v1(conn: &Connection) -> StoreResult<()> {
    info!("Running store migration v1");

    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Media cache: one record per source URL, put overwrites
        CREATE TABLE IF NOT EXISTS media_cache (
            url TEXT PRIMARY KEY NOT NULL,
            bytes BLOB NOT NULL,
            kind TEXT NOT NULL,
            stored_at TEXT NOT NULL
        );

        -- Video history, legacy shape (auto-increment keys are reused after
        -- deletions, which is why this shape was superseded)
        CREATE TABLE IF NOT EXISTS video_history (
            key INTEGER PRIMARY KEY AUTOINCREMENT,
            timeline TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at TEXT,
            thumbnail_url TEXT
        );

        INSERT INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}

/// Version 2: history records keyed by a process-unique id. The legacy table
/// is kept; its rows stay readable until `history_list` migrates them.
fn migrate_v2(conn: &Connection) -> StoreResult<()> {
    info!("Running store migration v2");

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS video_history_v2 (
            id TEXT PRIMARY KEY NOT NULL,
            timeline TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at TEXT NOT NULL,
            thumbnail_url TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_video_history_v2_created_at
            ON video_history_v2 (created_at DESC);

        INSERT INTO schema_version (version) VALUES (2);
        "#,
    )?;

    Ok(())
}
