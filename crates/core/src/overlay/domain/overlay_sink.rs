use std::path::PathBuf;

use crate::detection::domain::blob_detector::Blob;
use crate::preprocessing::domain::frame_preprocessor::PreprocessedFrame;
use crate::tracking::domain::tracked_object::TrackedObject;

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("failed to create overlay directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write overlay {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Receives one annotated view per processed frame.
///
/// Rendering never feeds back into detection or tracking.
pub trait OverlaySink: Send {
    fn render(
        &mut self,
        frame: &PreprocessedFrame,
        blobs: &[Blob],
        tracks: &[&TrackedObject],
    ) -> Result<(), OverlayError>;
}

/// Discards every frame.
pub struct NullOverlaySink;

impl OverlaySink for NullOverlaySink {
    fn render(
        &mut self,
        _frame: &PreprocessedFrame,
        _blobs: &[Blob],
        _tracks: &[&TrackedObject],
    ) -> Result<(), OverlayError> {
        Ok(())
    }
}
