use ndarray::ArrayView2;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame {index}: {len} samples do not fill a {width}x{height} frame")]
    Geometry {
        index: usize,
        len: usize,
        width: u32,
        height: u32,
    },
}

/// A single raw microscope frame: one grayscale channel, row-major.
///
/// Samples are 16-bit so that camera bit depths above 8 survive until
/// normalization; 8-bit sources are widened at the I/O boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u16>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u16>, width: u32, height: u32, index: usize) -> Result<Self, FrameError> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(FrameError::Geometry {
                index,
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            index,
        })
    }

    /// Builds a frame from 8-bit samples.
    pub fn from_u8(data: &[u8], width: u32, height: u32, index: usize) -> Result<Self, FrameError> {
        Self::new(data.iter().map(|&v| v as u16).collect(), width, height, index)
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Min and max sample value, or `None` for an empty frame.
    pub fn value_range(&self) -> Option<(u16, u16)> {
        let mut iter = self.data.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u16> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("Frame data length is checked at construction")
    }
}
