use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameDecodeError, FrameSource};

/// Serves frames that are already decoded, e.g. synthetic fixtures or
/// frames handed over by an embedding application.
pub struct InMemoryFrameSource {
    frames: Vec<Frame>,
    width: u32,
    height: u32,
}

impl InMemoryFrameSource {
    pub fn new(frames: Vec<Frame>, width: u32, height: u32) -> Self {
        Self {
            frames,
            width,
            height,
        }
    }

    /// Takes geometry from the first frame. An empty list yields a 0x0 source.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        Self::new(frames, width, height)
    }
}

impl FrameSource for InMemoryFrameSource {
    fn len(&self) -> usize {
        self.frames.len()
    }

    fn frame(&mut self, index: usize) -> Result<Frame, FrameDecodeError> {
        let frame = self.frames.get(index).ok_or_else(|| {
            FrameDecodeError::new(index, format!("out of range (len {})", self.frames.len()))
        })?;
        if frame.width() != self.width || frame.height() != self.height {
            return Err(FrameDecodeError::new(
                index,
                format!(
                    "frame is {}x{}, sequence is {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            ));
        }
        Ok(frame.clone())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}
