//! CORS-safe fetch indirection client.
//!
//! Fetches media bytes either directly or through a configured proxy that
//! shields browser-origin restrictions, and resolves the content-type
//! ambiguity the same way in both cases: the server-declared type wins
//! unless it is missing or generic, otherwise the type is inferred from the
//! kind hint and the URL extension.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use sreel_models::MediaKind;

use crate::error::{MediaError, MediaResult};
use crate::format::url_path;

/// Generic content types that never win over inference.
const GENERIC_CONTENT_TYPES: &[&str] = &["application/octet-stream", "binary/octet-stream"];

/// Configuration for the fetch indirection.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Proxy endpoint. When set, requests go to
    /// `{base}?url=<encoded>&kind=<kind>`; when unset, the URL is fetched
    /// directly.
    pub proxy_base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            proxy_base_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl FetchConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            proxy_base_url: std::env::var("SREEL_PROXY_URL").ok().filter(|s| !s.is_empty()),
            timeout: Duration::from_secs(
                std::env::var("SREEL_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

/// Bytes plus the resolved content type of a fetched asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// HTTP client for media fetches.
pub struct MediaFetcher {
    http: Client,
    config: FetchConfig,
}

impl MediaFetcher {
    /// Create a new fetcher.
    pub fn new(config: FetchConfig) -> MediaResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MediaError::config(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MediaResult<Self> {
        Self::new(FetchConfig::from_env())
    }

    /// Fetch an asset. Errors carry the original URL, never the proxied one.
    pub async fn fetch(&self, url: &str, kind: MediaKind) -> MediaResult<FetchedMedia> {
        let request_url = self.request_url(url, kind);
        debug!(url = %url, kind = %kind, "Fetching media");

        let response = self
            .http
            .get(&request_url)
            .send()
            .await
            .map_err(|e| MediaError::fetch_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::fetch_failed(url, format!("status {}", status)));
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::fetch_failed(url, e))?
            .to_vec();

        let content_type = resolve_content_type(declared.as_deref(), url, kind);
        debug!(url = %url, size = bytes.len(), content_type = %content_type, "Fetched media");

        Ok(FetchedMedia { bytes, content_type })
    }

    fn request_url(&self, url: &str, kind: MediaKind) -> String {
        match &self.config.proxy_base_url {
            Some(base) => format!(
                "{}?url={}&kind={}",
                base.trim_end_matches('/'),
                urlencoding::encode(url),
                kind
            ),
            None => url.to_string(),
        }
    }
}

/// Resolve the final content type: declared header unless missing or
/// generic, else kind-hint/extension inference.
pub fn resolve_content_type(declared: Option<&str>, url: &str, kind: MediaKind) -> String {
    if let Some(raw) = declared {
        let ct = raw.split(';').next().unwrap_or(raw).trim();
        if !ct.is_empty() && !GENERIC_CONTENT_TYPES.contains(&ct) {
            return ct.to_ascii_lowercase();
        }
    }

    infer_content_type(url, kind)
}

/// Extension-based MIME inference within the declared kind.
pub fn infer_content_type(url: &str, kind: MediaKind) -> String {
    let path = url_path(url).to_ascii_lowercase();
    let extension = path.rsplit('.').next().unwrap_or("");

    let inferred = match kind {
        MediaKind::Audio => match extension {
            "mp3" => Some("audio/mpeg"),
            "wav" => Some("audio/wav"),
            "m4a" | "mp4" => Some("audio/mp4"),
            "ogg" => Some("audio/ogg"),
            _ => None,
        },
        MediaKind::Video => match extension {
            "mp4" => Some("video/mp4"),
            "webm" => Some("video/webm"),
            "mov" => Some("video/quicktime"),
            _ => None,
        },
        MediaKind::Image => match extension {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            _ => None,
        },
    };

    inferred.unwrap_or("application/octet-stream").to_string()
}
