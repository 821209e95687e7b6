//! Media cache repository.
//!
//! Content-addressed (by source URL) store of previously fetched binary
//! assets. Reads are cache-aside under every fetch; `put` overwrites, so
//! racing writers for the same URL are safe (same URL, same bytes).
//!
//! There is no automatic eviction. `cache_prune` is the explicit capacity
//! policy: the owner decides when to call it and with what budget.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use sreel_models::MediaKind;

use crate::error::StoreResult;
use crate::manager::Database;

/// A cached media asset keyed by its source URL.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    /// Original (non-proxied) source URL.
    pub url: String,
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
    pub stored_at: DateTime<Utc>,
}

impl Database {
    /// Look up a cached asset by URL.
    pub fn cache_get(&self, url: &str) -> StoreResult<Option<CacheRecord>> {
        self.with_connection(|conn| cache_get_impl(conn, url))
    }

    /// Store an asset, overwriting any previous record for the same URL.
    pub fn cache_put(&self, record: &CacheRecord) -> StoreResult<()> {
        self.with_connection(|conn| cache_put_impl(conn, record))
    }

    /// Remove a cached asset. Returns whether a record was deleted.
    pub fn cache_evict(&self, url: &str) -> StoreResult<bool> {
        self.with_connection(|conn| {
            let deleted = conn.execute("DELETE FROM media_cache WHERE url = ?1", params![url])?;
            Ok(deleted > 0)
        })
    }

    /// Delete oldest records until total stored bytes fit the budget.
    /// Returns the number of records evicted.
    pub fn cache_prune(&self, max_total_bytes: u64) -> StoreResult<u64> {
        self.with_connection(|conn| cache_prune_impl(conn, max_total_bytes))
    }
}

fn cache_get_impl(conn: &Connection, url: &str) -> StoreResult<Option<CacheRecord>> {
    let mut stmt = conn.prepare(
        "SELECT url, bytes, kind, stored_at FROM media_cache WHERE url = ?1",
    )?;

    let result = stmt.query_row(params![url], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Vec<u8>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    });

    match result {
        Ok((url, bytes, kind, stored_at)) => {
            debug!(url = %url, "Media cache hit");
            Ok(Some(CacheRecord {
                url,
                bytes,
                kind: kind.parse().unwrap_or(MediaKind::Video),
                stored_at: parse_timestamp(&stored_at),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            debug!(url = %url, "Media cache miss");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn cache_put_impl(conn: &Connection, record: &CacheRecord) -> StoreResult<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO media_cache (url, bytes, kind, stored_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            record.url,
            record.bytes,
            record.kind.as_str(),
            record.stored_at.to_rfc3339(),
        ],
    )?;

    debug!(url = %record.url, size = record.bytes.len(), kind = %record.kind, "Media cached");
    Ok(())
}

fn cache_prune_impl(conn: &mut Connection, max_total_bytes: u64) -> StoreResult<u64> {
    let tx = conn.transaction()?;
    let mut evicted = 0u64;

    {
        let mut total: u64 = tx.query_row(
            "SELECT COALESCE(SUM(LENGTH(bytes)), 0) FROM media_cache",
            [],
            |row| row.get::<_, i64>(0),
        )? as u64;

        if total > max_total_bytes {
            let rows: Vec<(String, u64)> = {
                let mut stmt = tx.prepare(
                    "SELECT url, LENGTH(bytes) FROM media_cache ORDER BY stored_at ASC, url ASC",
                )?;
                let mapped = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
                })?;
                mapped.collect::<Result<Vec<_>, _>>()?
            };

            for (url, size) in rows {
                if total <= max_total_bytes {
                    break;
                }
                tx.execute("DELETE FROM media_cache WHERE url = ?1", params![url])?;
                total = total.saturating_sub(size);
                evicted += 1;
                debug!(url = %url, size = size, "Evicted from media cache");
            }
        }
    }

    tx.commit()?;
    Ok(evicted)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(url: &str, bytes: &[u8], stored_at: DateTime<Utc>) -> CacheRecord {
        CacheRecord {
            url: url.to_string(),
            bytes: bytes.to_vec(),
            kind: MediaKind::Video,
            stored_at,
        }
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, secs).unwrap()
    }

    #[test]
    fn test_get_miss_returns_none() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.cache_get("https://cdn.example.com/a.mp4").unwrap(), None);
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let rec = record("https://cdn.example.com/a.mp4", b"abc", at(0));

        db.cache_put(&rec).unwrap();
        let loaded = db.cache_get(&rec.url).unwrap().unwrap();

        assert_eq!(loaded.bytes, b"abc");
        assert_eq!(loaded.kind, MediaKind::Video);
        assert_eq!(loaded.stored_at, rec.stored_at);
    }

    #[test]
    fn test_put_overwrites_same_url() {
        let db = Database::open_in_memory().unwrap();
        let url = "https://cdn.example.com/a.mp4";

        db.cache_put(&record(url, b"first", at(0))).unwrap();
        db.cache_put(&record(url, b"second", at(1))).unwrap();

        let loaded = db.cache_get(url).unwrap().unwrap();
        assert_eq!(loaded.bytes, b"second");
    }

    #[test]
    fn test_evict() {
        let db = Database::open_in_memory().unwrap();
        let url = "https://cdn.example.com/a.mp4";
        db.cache_put(&record(url, b"abc", at(0))).unwrap();

        assert!(db.cache_evict(url).unwrap());
        assert!(!db.cache_evict(url).unwrap());
        assert_eq!(db.cache_get(url).unwrap(), None);
    }

    #[test]
    fn test_prune_drops_oldest_first() {
        let db = Database::open_in_memory().unwrap();
        db.cache_put(&record("https://a", &[0u8; 100], at(0))).unwrap();
        db.cache_put(&record("https://b", &[0u8; 100], at(1))).unwrap();
        db.cache_put(&record("https://c", &[0u8; 100], at(2))).unwrap();

        let evicted = db.cache_prune(250).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(db.cache_get("https://a").unwrap(), None);
        assert!(db.cache_get("https://b").unwrap().is_some());
        assert!(db.cache_get("https://c").unwrap().is_some());
    }

    #[test]
    fn test_prune_under_budget_is_noop() {
        let db = Database::open_in_memory().unwrap();
        db.cache_put(&record("https://a", &[0u8; 100], at(0))).unwrap();

        assert_eq!(db.cache_prune(1000).unwrap(), 0);
        assert!(db.cache_get("https://a").unwrap().is_some());
    }
}
