//! Timeline composition and export for StoryReel.
//!
//! This crate provides:
//! - The narrow trait seam to the rendering engine (`Composition`)
//! - The timeline compositor: script sections/points to ordered clip
//!   insertions, with per-asset degradation and a diagnostics report
//! - The export pipeline with its two persistence strategies

pub mod compositor;
pub mod engine;
pub mod error;
pub mod export;

pub use compositor::{ComposeReport, CompositorState, Diagnostic, TimelineCompositor};
pub use engine::{ClipSource, Composition, EngineError, EngineResult};
pub use error::{ComposeError, ComposeResult, ExportError, ExportResult};
pub use export::{
    ArtifactLocation, ExportPipeline, ExportStrategy, NoSaveCapability, SaveLocationPicker,
};
