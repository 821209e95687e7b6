//! Media kind classification for cached and fetched assets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of media asset handled by the resolver and the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Narration tracks
    Audio,
    /// Point footage
    Video,
    /// Placeholder thumbnails
    Image,
}

impl MediaKind {
    /// Returns the kind name as stored in the cache and sent as a fetch hint.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown media kind string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown media kind: {0}")]
pub struct MediaKindParseError(pub String);

impl FromStr for MediaKind {
    type Err = MediaKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            "image" => Ok(MediaKind::Image),
            _ => Err(MediaKindParseError(s.to_string())),
        }
    }
}
