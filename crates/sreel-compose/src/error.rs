//! Compositor and export error types.
//!
//! Only structural and engine failures abort a build; per-asset problems
//! degrade locally and surface through `ComposeReport::diagnostics`.

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Fatal composition errors.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Malformed timeline: failed job or no sections. Aborts before any
    /// insertion.
    #[error("Structural error: {0}")]
    Structural(String),

    /// The rendering engine rejected an insertion. Aborts the build;
    /// subsequent insertions could not be trusted.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl ComposeError {
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }
}

/// Result type for exports.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors surfaced when both export strategies fail.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Render failed: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
