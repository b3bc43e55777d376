use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::sequence_metadata::SequenceMetadata;

/// A frame that could not be read or decoded. Fatal for the whole sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to decode frame {index}: {reason}")]
pub struct FrameDecodeError {
    pub index: usize,
    pub reason: String,
}

impl FrameDecodeError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error(transparent)]
    Decode(#[from] FrameDecodeError),
}

/// An ordered, finite, randomly indexable sequence of grayscale frames.
///
/// Implementations own all decoding details; the tracking pipeline only
/// sees [`Frame`]s and the sequence geometry.
pub trait FrameSource: Send {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes frame `index`. Out-of-range indices are decode errors.
    fn frame(&mut self, index: usize) -> Result<Frame, FrameDecodeError>;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn metadata(&self) -> SequenceMetadata {
        SequenceMetadata {
            width: self.width(),
            height: self.height(),
            total_frames: self.len(),
            source_path: None,
        }
    }
}
