//! Fixed render settings for reproducible exports.
//!
//! Both export strategies must render with the same settings so that the
//! same timeline always produces the same artifact: resolution comes from
//! the source composition, frame rate from the compositor, and the
//! codec/bitrate pairs are fixed constants.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec
pub const DEFAULT_VIDEO_CODEC: &str = "h264";
/// Default video bitrate (bits per second)
pub const DEFAULT_VIDEO_BITRATE: u32 = 5_000_000;
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate (bits per second)
pub const DEFAULT_AUDIO_BITRATE: u32 = 128_000;
/// Default audio sample rate (Hz)
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 44_100;
/// Default audio channel count
pub const DEFAULT_AUDIO_CHANNELS: u8 = 2;

/// Complete encoder configuration handed to the rendering engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderSettings {
    pub video: VideoEncodeSettings,
    pub audio: AudioEncodeSettings,
}

/// Video half of the encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoEncodeSettings {
    /// Codec name (e.g. "h264")
    pub codec: String,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// Output frame rate
    pub fps: u32,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

/// Audio half of the encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioEncodeSettings {
    /// Codec name (e.g. "aac")
    pub codec: String,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u8,
}

impl RenderSettings {
    /// Settings for a composition of the given resolution and frame rate,
    /// with the fixed default codec/bitrate pairs.
    pub fn for_composition(width: u32, height: u32, fps: u32) -> Self {
        Self {
            video: VideoEncodeSettings {
                codec: DEFAULT_VIDEO_CODEC.to_string(),
                bitrate: DEFAULT_VIDEO_BITRATE,
                fps,
                width,
                height,
            },
            audio: AudioEncodeSettings {
                codec: DEFAULT_AUDIO_CODEC.to_string(),
                bitrate: DEFAULT_AUDIO_BITRATE,
                sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
                channels: DEFAULT_AUDIO_CHANNELS,
            },
        }
    }
}
