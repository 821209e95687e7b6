//! Export pipeline.
//!
//! Two persistence strategies, tried in order: render directly to a
//! user-directed destination when the runtime offers one, otherwise render
//! an anonymous output into the saved-artifacts directory. Both strategies
//! use the same fixed render settings, so the same timeline always produces
//! the same artifact.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sreel_models::RenderSettings;

use crate::engine::Composition;
use crate::error::ExportResult;

/// Which strategy produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStrategy {
    /// Rendered directly to a destination the user chose.
    UserDirected,
    /// Rendered to an anonymous file in the saved-artifacts directory.
    Anonymous,
}

/// Where the export landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub path: PathBuf,
    pub strategy: ExportStrategy,
}

/// Runtime capability for asking the user where to save.
///
/// `Ok(None)` means the capability is absent or the user cancelled; errors
/// are absorbed by the pipeline, which falls through to the anonymous
/// strategy either way.
#[async_trait]
pub trait SaveLocationPicker: Send + Sync {
    async fn pick(
        &self,
        suggested_filename: &str,
    ) -> Result<Option<PathBuf>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Picker for runtimes without a save-location capability.
pub struct NoSaveCapability;

#[async_trait]
impl SaveLocationPicker for NoSaveCapability {
    async fn pick(
        &self,
        _suggested_filename: &str,
    ) -> Result<Option<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }
}

/// Drives the rendering engine to a playable artifact.
pub struct ExportPipeline {
    fps: u32,
    saved_dir: PathBuf,
}

impl ExportPipeline {
    /// `saved_dir` is the anonymous-output destination of strategy 2; it is
    /// created on demand.
    pub fn new(fps: u32, saved_dir: impl Into<PathBuf>) -> Self {
        Self {
            fps,
            saved_dir: saved_dir.into(),
        }
    }

    /// Export the composition.
    ///
    /// Strategy-1 failures (picker error, cancellation, render error at the
    /// chosen destination) are logged and retried as strategy 2, never
    /// surfaced. The returned error means both strategies failed.
    pub async fn export<C: Composition>(
        &self,
        composition: &mut C,
        picker: &dyn SaveLocationPicker,
        suggested_filename: &str,
    ) -> ExportResult<ArtifactLocation> {
        let (width, height) = composition.resolution();
        let settings = RenderSettings::for_composition(width, height, self.fps);

        match picker.pick(suggested_filename).await {
            Ok(Some(destination)) => {
                match composition.render(&settings, &destination).await {
                    Ok(()) => {
                        info!(path = %destination.display(), "Exported to user-directed destination");
                        return Ok(ArtifactLocation {
                            path: destination,
                            strategy: ExportStrategy::UserDirected,
                        });
                    }
                    Err(e) => {
                        warn!(path = %destination.display(), error = %e, "Direct export failed, retrying anonymously");
                    }
                }
            }
            Ok(None) => {
                debug!("No save-location capability, exporting anonymously");
            }
            Err(e) => {
                warn!(error = %e, "Save-location picker failed, exporting anonymously");
            }
        }

        tokio::fs::create_dir_all(&self.saved_dir).await?;
        let path = self
            .saved_dir
            .join(format!("{}-{}", Uuid::new_v4(), suggested_filename));

        composition.render(&settings, &path).await?;

        info!(path = %path.display(), "Exported to saved-artifacts directory");
        Ok(ArtifactLocation {
            path,
            strategy: ExportStrategy::Anonymous,
        })
    }
}
