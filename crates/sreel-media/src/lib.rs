//! Media resolution for the StoryReel compositor.
//!
//! This crate provides:
//! - The format policy (strict for video, lenient for audio)
//! - The CORS-safe fetch indirection client with content-type resolution
//! - The cache-aside `MediaResolver` over the persistent media cache

pub mod error;
pub mod fetch;
pub mod format;
pub mod resolver;

pub use error::{MediaError, MediaResult};
pub use fetch::{FetchConfig, FetchedMedia, MediaFetcher};
pub use format::{audio_format_supported, video_format_supported};
pub use resolver::{MediaResolver, ResolvedMedia};
