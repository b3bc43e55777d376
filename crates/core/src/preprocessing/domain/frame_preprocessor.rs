use image::{GrayImage, Luma};

use crate::preprocessing::domain::background_model::{BackgroundModel, PreprocessError};
use crate::shared::frame::Frame;

/// Output of [`FramePreprocessor::process`] for one frame.
#[derive(Clone, Debug)]
pub struct PreprocessedFrame {
    pub index: usize,
    /// The raw frame stretched to the full `0..=255` range.
    pub normalized: GrayImage,
    /// Foreground mask from the background model (255 = foreground).
    pub foreground: GrayImage,
}

/// Normalizes raw frames and runs them through a background model.
pub struct FramePreprocessor {
    background: Box<dyn BackgroundModel>,
}

impl FramePreprocessor {
    pub fn new(background: Box<dyn BackgroundModel>) -> Self {
        Self { background }
    }

    pub fn process(&mut self, frame: &Frame) -> Result<PreprocessedFrame, PreprocessError> {
        let normalized = normalize_min_max(frame);
        let foreground = self.background.apply(&normalized)?;
        Ok(PreprocessedFrame {
            index: frame.index(),
            normalized,
            foreground,
        })
    }
}

/// Linearly maps the frame's `[min, max]` onto `[0, 255]`, rounding to nearest.
///
/// A constant frame has no range to stretch and maps to all zeros.
pub fn normalize_min_max(frame: &Frame) -> GrayImage {
    let (width, height) = (frame.width(), frame.height());
    let Some((lo, hi)) = frame.value_range() else {
        return GrayImage::new(width, height);
    };
    let range = (hi - lo) as f64;
    let samples = frame.as_ndarray();

    GrayImage::from_fn(width, height, |x, y| {
        if range == 0.0 {
            return Luma([0]);
        }
        let v = samples[[y as usize, x as usize]];
        let scaled = ((v - lo) as f64 * 255.0 / range).round();
        Luma([scaled as u8])
    })
}
