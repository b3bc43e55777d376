use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage};

use crate::shared::constants::FRAME_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::sequence_metadata::SequenceMetadata;
use crate::video::domain::frame_source::{FrameDecodeError, FrameSource, SourceError};

/// Reads a directory of still images as one frame sequence.
///
/// Files are ordered by file name, so zero-padded numbering
/// (`frame_0001.tif`, ...) yields presentation order. Geometry is taken
/// from the first frame; frames are decoded lazily on access.
#[derive(Debug)]
pub struct ImageSequenceReader {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageSequenceReader {
    pub fn open(dir: &Path) -> Result<Self, SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|e| SourceError::Open {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_frame_file(p))
            .collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let (width, height) = match paths.first() {
            Some(first) => {
                let img = decode(first, 0)?;
                (img.width(), img.height())
            }
            None => {
                log::warn!("No frames found in {}", dir.display());
                (0, 0)
            }
        };

        log::debug!(
            "Opened {} frames ({width}x{height}) from {}",
            paths.len(),
            dir.display()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            paths,
            width,
            height,
        })
    }
}

impl FrameSource for ImageSequenceReader {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn frame(&mut self, index: usize) -> Result<Frame, FrameDecodeError> {
        let path = self.paths.get(index).ok_or_else(|| {
            FrameDecodeError::new(index, format!("out of range (len {})", self.paths.len()))
        })?;
        let img = decode(path, index)?;
        if img.width() != self.width || img.height() != self.height {
            return Err(FrameDecodeError::new(
                index,
                format!(
                    "{} is {}x{}, sequence is {}x{}",
                    path.display(),
                    img.width(),
                    img.height(),
                    self.width,
                    self.height
                ),
            ));
        }
        to_frame(img, index)
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn metadata(&self) -> SequenceMetadata {
        SequenceMetadata {
            width: self.width,
            height: self.height,
            total_frames: self.paths.len(),
            source_path: Some(self.dir.clone()),
        }
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn decode(path: &Path, index: usize) -> Result<DynamicImage, FrameDecodeError> {
    image::open(path).map_err(|e| FrameDecodeError::new(index, format!("{}: {e}", path.display())))
}

/// Collapses to one channel, keeping 16-bit depth when the file has it.
fn to_frame(img: DynamicImage, index: usize) -> Result<Frame, FrameDecodeError> {
    let (width, height) = (img.width(), img.height());
    let frame = match img.color() {
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
            Frame::new(img.into_luma16().into_raw(), width, height, index)
        }
        _ => Frame::from_u8(img.into_luma8().as_raw(), width, height, index),
    };
    frame.map_err(|e| FrameDecodeError::new(index, e.to_string()))
}
