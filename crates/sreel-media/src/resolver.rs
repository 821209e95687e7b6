//! Cache-aside media resolution.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use sreel_models::MediaKind;
use sreel_store::{CacheRecord, Database};

use crate::error::MediaResult;
use crate::fetch::{resolve_content_type, MediaFetcher};

/// Bytes plus content type, from cache or network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Resolves logical media references (URL + declared kind) into bytes,
/// consulting the persistent cache before the network.
///
/// Concurrent resolutions of the same URL are not deduplicated; at most one
/// cache write wins, which is fine because writes are idempotent (same URL,
/// same bytes).
pub struct MediaResolver {
    store: Arc<Database>,
    fetcher: MediaFetcher,
}

impl MediaResolver {
    pub fn new(store: Arc<Database>, fetcher: MediaFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Resolve a media reference to bytes.
    ///
    /// Cache hit: returns the stored bytes without touching the network.
    /// Miss: fetches through the indirection, then populates the cache keyed
    /// by the original URL before returning. Fetch failures surface as
    /// `MediaError::FetchFailed` and write nothing; a failed cache write
    /// after a successful fetch is absorbed (the bytes still return).
    pub async fn resolve(&self, url: &str, kind: MediaKind) -> MediaResult<ResolvedMedia> {
        if let Some(record) = self.store.cache_get(url)? {
            return Ok(ResolvedMedia {
                content_type: resolve_content_type(None, url, record.kind),
                bytes: record.bytes,
            });
        }

        let fetched = self.fetcher.fetch(url, kind).await?;

        let record = CacheRecord {
            url: url.to_string(),
            bytes: fetched.bytes,
            kind,
            stored_at: Utc::now(),
        };
        if let Err(e) = self.store.cache_put(&record) {
            // Tolerated: the composition can proceed, the next resolve
            // simply fetches again.
            warn!(url = %url, error = %e, "Failed to populate media cache");
        }

        Ok(ResolvedMedia {
            bytes: record.bytes,
            content_type: fetched.content_type,
        })
    }
}
