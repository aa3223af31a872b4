//! Errors reported by the maintenance pipeline.

use crate::diff::DiffError;
use crate::render::RenderError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
/// The underlying failure of a maintenance run.
pub enum MaintenanceCause {
    #[error("annotation store failure: {0}")]
    /// Reading or writing annotations failed.
    Store(#[from] StoreError),

    #[error("rendering failure: {0}")]
    /// Rendering one of the document versions failed.
    Render(#[from] RenderError),

    #[error("diff failure: {0}")]
    /// Diffing the rendered versions failed.
    Diff(#[from] DiffError),
}

#[derive(Debug, Error)]
#[error("failed to maintain annotations for '{target}'")]
/// Annotation maintenance of a document was aborted. Nothing was persisted.
pub struct MaintenanceError {
    /// The document whose annotations were being maintained.
    pub target: String,
    /// What went wrong.
    #[source]
    pub cause: MaintenanceCause,
}

impl MaintenanceError {
    pub(crate) fn new(target: &str, cause: impl Into<MaintenanceCause>) -> Self {
        Self {
            target: target.to_string(),
            cause: cause.into(),
        }
    }
}
