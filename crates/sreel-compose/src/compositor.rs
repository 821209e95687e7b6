//! Timeline compositor.
//!
//! Walks the section/point data model in array order, computing absolute
//! frame offsets and durations, and issues one clip insertion per audio
//! track and per visual point (or a placeholder) against the rendering
//! engine. One section's missing narration or footage never blocks the rest
//! of the video; every absorbed failure is recorded as a diagnostic.

use serde::Serialize;
use tracing::{debug, info, warn};

use sreel_media::{audio_format_supported, video_format_supported, MediaResolver, ResolvedMedia};
use sreel_models::{frames_at, MediaKind, Point, ScriptTimeline, Section, DEFAULT_FPS};

use crate::engine::{ClipSource, Composition};
use crate::error::{ComposeError, ComposeResult};

/// Compositor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositorState {
    Idle,
    Building,
    Ready,
    Failed,
}

/// An absorbed per-asset failure, kept observable alongside the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Section narration dropped; the section plays silent.
    AudioSkipped {
        section_id: String,
        url: String,
        reason: String,
    },
    /// Point footage replaced by its thumbnail.
    PlaceholderUsed {
        section_id: String,
        video_id: String,
        url: String,
        reason: String,
    },
    /// Neither footage nor thumbnail resolved; the point leaves a visual gap.
    PointSkipped {
        section_id: String,
        video_id: String,
        reason: String,
    },
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComposeReport {
    pub audio_clips: usize,
    pub video_clips: usize,
    pub placeholder_clips: usize,
    pub skipped_points: usize,
    pub duration_frames: u64,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds one timeline at a time against a rendering-engine composition.
///
/// `compose` takes `&mut self`: a compositor instance has a single owner and
/// never runs two builds at once. A caller that wants to abandon a build
/// discards the instance.
pub struct TimelineCompositor {
    fps: u32,
    resolver: MediaResolver,
    state: CompositorState,
}

impl TimelineCompositor {
    /// Create a compositor at the default frame rate.
    pub fn new(resolver: MediaResolver) -> Self {
        Self::with_fps(resolver, DEFAULT_FPS)
    }

    /// Create a compositor at an explicit frame rate.
    pub fn with_fps(resolver: MediaResolver, fps: u32) -> Self {
        Self {
            fps,
            resolver,
            state: CompositorState::Idle,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn state(&self) -> CompositorState {
        self.state
    }

    /// Build the timeline into the given composition.
    ///
    /// Insertions are issued strictly in section/point array order, so the
    /// output is deterministic regardless of how long individual
    /// resolutions take. Overlapping point ranges are passed through
    /// uncorrected; the engine's compositing governs the visual result.
    pub async fn compose<C: Composition>(
        &mut self,
        timeline: &ScriptTimeline,
        composition: &mut C,
    ) -> ComposeResult<ComposeReport> {
        self.state = CompositorState::Building;

        match self.build(timeline, composition).await {
            Ok(report) => {
                self.state = CompositorState::Ready;
                info!(
                    audio_clips = report.audio_clips,
                    video_clips = report.video_clips,
                    placeholder_clips = report.placeholder_clips,
                    skipped_points = report.skipped_points,
                    duration_frames = report.duration_frames,
                    "Composition ready"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = CompositorState::Failed;
                Err(e)
            }
        }
    }

    async fn build<C: Composition>(
        &mut self,
        timeline: &ScriptTimeline,
        composition: &mut C,
    ) -> ComposeResult<ComposeReport> {
        if !timeline.success {
            return Err(ComposeError::structural("script job did not succeed"));
        }
        if timeline.sections.is_empty() {
            return Err(ComposeError::structural("timeline has no sections"));
        }

        let mut report = ComposeReport::default();
        let mut previous_end_ms = 0u64;

        for section in &timeline.sections {
            // A section without points is a zero-length marker pinned to the
            // previous section's end; its narration still gets an insertion
            // point there.
            let section_start_ms = section.start_ms().unwrap_or(previous_end_ms);
            let section_end_ms = section.end_ms().unwrap_or(previous_end_ms);

            self.insert_section_audio(section, section_start_ms, composition, &mut report)
                .await?;

            for point in &section.points {
                self.insert_point(section, point, composition, &mut report)
                    .await?;
            }

            previous_end_ms = section_end_ms;
        }

        report.duration_frames = frames_at(timeline.duration_ms(), self.fps);
        Ok(report)
    }

    async fn insert_section_audio<C: Composition>(
        &self,
        section: &Section,
        section_start_ms: u64,
        composition: &mut C,
        report: &mut ComposeReport,
    ) -> ComposeResult<()> {
        let Some(audio_url) = section.audio_url.as_deref() else {
            return Ok(());
        };

        if !audio_format_supported(audio_url) {
            warn!(section_id = %section.section_id, url = %audio_url, "Unsupported narration format, section plays silent");
            report.diagnostics.push(Diagnostic::AudioSkipped {
                section_id: section.section_id.clone(),
                url: audio_url.to_string(),
                reason: "unsupported format".to_string(),
            });
            return Ok(());
        }

        match self.resolver.resolve(audio_url, MediaKind::Audio).await {
            Ok(resolved) => {
                composition
                    .add_audio_clip(clip_source(audio_url, resolved), frames_at(section_start_ms, self.fps))?;
                report.audio_clips += 1;
            }
            Err(e) => {
                warn!(section_id = %section.section_id, url = %audio_url, error = %e, "Narration unavailable, section plays silent");
                report.diagnostics.push(Diagnostic::AudioSkipped {
                    section_id: section.section_id.clone(),
                    url: audio_url.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(())
    }

    async fn insert_point<C: Composition>(
        &self,
        section: &Section,
        point: &Point,
        composition: &mut C,
        report: &mut ComposeReport,
    ) -> ComposeResult<()> {
        let start_frame = frames_at(point.start_time, self.fps);
        let duration_frames = frames_at(point.end_time, self.fps).saturating_sub(start_frame);

        if !video_format_supported(&point.video_url) {
            return self
                .insert_placeholder(
                    section,
                    point,
                    start_frame,
                    duration_frames,
                    "unsupported format",
                    composition,
                    report,
                )
                .await;
        }

        match self.resolver.resolve(&point.video_url, MediaKind::Video).await {
            Ok(resolved) => {
                // Muted: the section narration already carries the sound.
                composition.add_video_clip(
                    clip_source(&point.video_url, resolved),
                    start_frame,
                    duration_frames,
                    true,
                )?;
                report.video_clips += 1;
                Ok(())
            }
            Err(e) => {
                self.insert_placeholder(
                    section,
                    point,
                    start_frame,
                    duration_frames,
                    &e.to_string(),
                    composition,
                    report,
                )
                .await
            }
        }
    }

    /// Substitute the point's thumbnail at the same frame position and
    /// duration, so declared points never leave a time gap. If the
    /// thumbnail fails too, the point is skipped entirely.
    #[allow(clippy::too_many_arguments)]
    async fn insert_placeholder<C: Composition>(
        &self,
        section: &Section,
        point: &Point,
        offset_frames: u64,
        duration_frames: u64,
        reason: &str,
        composition: &mut C,
        report: &mut ComposeReport,
    ) -> ComposeResult<()> {
        debug!(section_id = %section.section_id, video_id = %point.video_id, reason = %reason, "Falling back to thumbnail placeholder");

        match self
            .resolver
            .resolve(&point.video_thumbnail, MediaKind::Image)
            .await
        {
            Ok(resolved) => {
                composition.add_image_clip(
                    clip_source(&point.video_thumbnail, resolved),
                    offset_frames,
                    duration_frames,
                )?;
                report.placeholder_clips += 1;
                report.diagnostics.push(Diagnostic::PlaceholderUsed {
                    section_id: section.section_id.clone(),
                    video_id: point.video_id.clone(),
                    url: point.video_url.clone(),
                    reason: reason.to_string(),
                });
            }
            Err(thumb_err) => {
                warn!(
                    section_id = %section.section_id,
                    video_id = %point.video_id,
                    error = %thumb_err,
                    "Thumbnail unavailable too, skipping point"
                );
                report.skipped_points += 1;
                report.diagnostics.push(Diagnostic::PointSkipped {
                    section_id: section.section_id.clone(),
                    video_id: point.video_id.clone(),
                    reason: format!("{}; thumbnail: {}", reason, thumb_err),
                });
            }
        }

        Ok(())
    }
}

fn clip_source(url: &str, resolved: ResolvedMedia) -> ClipSource {
    ClipSource {
        url: url.to_string(),
        content_type: resolved.content_type,
        bytes: resolved.bytes,
    }
}
