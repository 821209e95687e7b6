//! Video history repository.
//!
//! Completed compositions are persisted for replay, keyed by a
//! process-unique uuid that is never reused, even across deletions. An
//! older record shape keyed by the reusable auto-increment row id still
//! exists on disk for long-lived installs; `history_list` upgrades any such
//! row it encounters so later reads only ever see current-shape records.

use chrono::{DateTime, Utc};
use rusqlite::{params, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use sreel_models::ScriptTimeline;

use crate::error::StoreResult;
use crate::manager::Database;

/// A persisted composition.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// Process-unique id, assigned at write time and never reused.
    pub id: String,
    pub timeline: ScriptTimeline,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub thumbnail_url: String,
}

/// Legacy on-disk shape, keyed by the reused auto-increment row id.
struct LegacyRow {
    key: i64,
    timeline: ScriptTimeline,
    title: String,
    created_at: Option<String>,
    thumbnail_url: Option<String>,
}

impl Database {
    /// Persist a composition and return its new id.
    ///
    /// The id is not returned until the enclosing transaction has fully
    /// committed; a returned id always names a durable record.
    pub fn history_put(&self, timeline: &ScriptTimeline, title: &str) -> StoreResult<String> {
        let record = HistoryRecord {
            id: Uuid::new_v4().to_string(),
            timeline: timeline.clone(),
            title: title.to_string(),
            created_at: Utc::now(),
            thumbnail_url: timeline.first_thumbnail().unwrap_or_default().to_string(),
        };

        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            insert_record(&tx, &record)?;
            tx.commit()?;
            Ok(())
        })?;

        info!(id = %record.id, title = %record.title, "History record stored");
        Ok(record.id)
    }

    /// Load a composition by id.
    pub fn history_get(&self, id: &str) -> StoreResult<Option<HistoryRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, timeline, title, created_at, thumbnail_url
                FROM video_history_v2 WHERE id = ?1
                "#,
            )?;

            let result = stmt.query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            });

            match result {
                Ok(raw) => Ok(Some(record_from_raw(raw)?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// List all compositions, newest first.
    ///
    /// Iteration doubles as the legacy migration pass: every legacy-shape
    /// row encountered is upgraded (fresh unique id, thumbnail preserved or
    /// recomputed from the timeline, original row deleted). The returned
    /// list is built from the upgraded in-memory records directly, so the
    /// results are complete and de-duplicated regardless of when the
    /// upgrade writes land.
    pub fn history_list(&self) -> StoreResult<Vec<HistoryRecord>> {
        let mut records = self.with_connection(|conn| {
            let tx = conn.transaction()?;

            let mut records = read_current(&tx)?;

            for legacy in read_legacy(&tx)? {
                let upgraded = upgrade_legacy_row(&legacy);
                insert_record(&tx, &upgraded)?;
                tx.execute(
                    "DELETE FROM video_history WHERE key = ?1",
                    params![legacy.key],
                )?;
                debug!(legacy_key = legacy.key, id = %upgraded.id, "Upgraded legacy history record");
                records.push(upgraded);
            }

            tx.commit()?;
            Ok(records)
        })?;

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Delete a composition. Returns whether a record was removed.
    pub fn history_delete(&self, id: &str) -> StoreResult<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute(
                "DELETE FROM video_history_v2 WHERE id = ?1",
                params![id],
            )?;
            Ok(deleted > 0)
        })
    }
}

fn insert_record(tx: &Transaction<'_>, record: &HistoryRecord) -> StoreResult<()> {
    tx.execute(
        r#"
        INSERT INTO video_history_v2 (id, timeline, title, created_at, thumbnail_url)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            record.id,
            serde_json::to_string(&record.timeline)?,
            record.title,
            record.created_at.to_rfc3339(),
            record.thumbnail_url,
        ],
    )?;
    Ok(())
}

fn read_current(tx: &Transaction<'_>) -> StoreResult<Vec<HistoryRecord>> {
    let mut stmt = tx.prepare(
        "SELECT id, timeline, title, created_at, thumbnail_url FROM video_history_v2",
    )?;

    let raws = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raws.into_iter().map(record_from_raw).collect()
}

fn read_legacy(tx: &Transaction<'_>) -> StoreResult<Vec<LegacyRow>> {
    let mut stmt = tx.prepare(
        "SELECT key, timeline, title, created_at, thumbnail_url FROM video_history",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(key, timeline, title, created_at, thumbnail_url)| {
            Ok(LegacyRow {
                key,
                timeline: serde_json::from_str(&timeline)?,
                title,
                created_at,
                thumbnail_url,
            })
        })
        .collect()
}

fn upgrade_legacy_row(legacy: &LegacyRow) -> HistoryRecord {
    let thumbnail_url = legacy
        .thumbnail_url
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| legacy.timeline.first_thumbnail().map(String::from))
        .unwrap_or_default();

    HistoryRecord {
        id: Uuid::new_v4().to_string(),
        timeline: legacy.timeline.clone(),
        title: legacy.title.clone(),
        created_at: legacy
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
        thumbnail_url,
    }
}

fn record_from_raw(
    (id, timeline, title, created_at, thumbnail_url): (String, String, String, String, String),
) -> StoreResult<HistoryRecord> {
    Ok(HistoryRecord {
        id,
        timeline: serde_json::from_str(&timeline)?,
        title,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        thumbnail_url,
    })
}
