//! Rendering engine trait seam.
//!
//! The actual decode-mix-encode engine lives outside this crate. The
//! compositor only needs one composition being assembled: clip insertions
//! at frame offsets, the source resolution, and a render call. Preview
//! controls (mount/play/seek) belong to the UI layer and stay out of the
//! seam.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use sreel_models::RenderSettings;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by the rendering engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Clip rejected: {0}")]
    Clip(String),

    #[error("Render failed: {0}")]
    Render(String),
}

impl EngineError {
    pub fn clip(msg: impl Into<String>) -> Self {
        Self::Clip(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

/// Resolved bytes plus provenance for one clip insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSource {
    /// Original (non-proxied) source URL.
    pub url: String,
    /// Resolved content type (server-declared or inferred).
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One composition being assembled by the engine.
///
/// Insertions are issued in section/point array order; the engine's own
/// compositing governs overlapping frame ranges.
#[async_trait]
pub trait Composition: Send {
    /// Source composition resolution (width, height) in pixels.
    fn resolution(&self) -> (u32, u32);

    /// Insert a narration track starting at `offset_frames`.
    fn add_audio_clip(&mut self, source: ClipSource, offset_frames: u64) -> EngineResult<()>;

    /// Insert footage at `offset_frames`, trimmed to exactly
    /// `duration_frames`. Muted clips rely on the section narration for
    /// sound.
    fn add_video_clip(
        &mut self,
        source: ClipSource,
        offset_frames: u64,
        duration_frames: u64,
        muted: bool,
    ) -> EngineResult<()>;

    /// Insert a still image held for `duration_frames`.
    fn add_image_clip(
        &mut self,
        source: ClipSource,
        offset_frames: u64,
        duration_frames: u64,
    ) -> EngineResult<()>;

    /// Encode the assembled timeline to `destination`.
    async fn render(&mut self, settings: &RenderSettings, destination: &Path) -> EngineResult<()>;
}
