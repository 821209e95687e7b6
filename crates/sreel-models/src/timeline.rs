//! Script timeline data model.
//!
//! A `ScriptTimeline` is the terminal payload of the script-to-media job:
//! an ordered list of narration sections, each carrying one audio track and
//! a sequence of timed visual points. The compositor consumes one timeline
//! per build; the history store persists whole timelines for replay.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A complete script-to-media result ready for composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptTimeline {
    /// Whether the upstream job produced a usable timeline.
    pub success: bool,

    /// Narration sections in playback order.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ScriptTimeline {
    /// Whether the timeline can enter a composition at all.
    ///
    /// Per-asset problems degrade later; this is only the structural gate.
    pub fn is_composable(&self) -> bool {
        self.success && !self.sections.is_empty()
    }

    /// Total timeline length in milliseconds (end of the last timed point).
    pub fn duration_ms(&self) -> u64 {
        self.sections
            .iter()
            .filter_map(Section::end_ms)
            .max()
            .unwrap_or(0)
    }

    /// Best-effort thumbnail: the first point's thumbnail of the first
    /// section that has points. Used when persisting to the history store.
    pub fn first_thumbnail(&self) -> Option<&str> {
        self.sections
            .iter()
            .find_map(|s| s.points.first())
            .map(|p| p.video_thumbnail.as_str())
    }
}

/// A narration unit: one audio track plus an ordered list of visual points.
///
/// A section's on-timeline start/end is derived from its points, never
/// stored. Points are contiguous by convention only; gaps and overlaps must
/// be tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub section_id: String,

    /// Narration audio for this section, if any was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    pub voice_over_id: String,

    #[serde(default)]
    pub points: Vec<Point>,
}

impl Section {
    /// Derived section start: the first point's start time.
    pub fn start_ms(&self) -> Option<u64> {
        self.points.first().map(|p| p.start_time)
    }

    /// Derived section end: the last point's end time.
    pub fn end_ms(&self) -> Option<u64> {
        self.points.last().map(|p| p.end_time)
    }
}

/// A single timed visual insertion within a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Narration text covered by this point.
    #[serde(default)]
    pub text: String,

    pub video_id: String,

    /// Source footage for this point.
    pub video_url: String,

    /// Still image substituted when the footage cannot be used.
    #[serde(default)]
    pub video_thumbnail: String,

    /// Start offset on the timeline, milliseconds.
    pub start_time: u64,

    /// End offset on the timeline, milliseconds. Never precedes `start_time`
    /// in well-formed input; the duration helpers saturate regardless.
    pub end_time: u64,
}

impl Point {
    /// Point duration in milliseconds. Saturates to zero on inverted input.
    pub fn duration_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}
