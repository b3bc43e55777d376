use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::sequence_metadata::SequenceMetadata;
use crate::video::domain::frame_source::{FrameDecodeError, FrameSource, SourceError};

/// Decodes a video container to GRAY8 frames via ffmpeg-next.
///
/// Sequential access decodes incrementally. Asking for a frame behind the
/// decode position reopens the stream and decodes forward again.
pub struct FfmpegFrameSource {
    path: PathBuf,
    decode: Option<DecodeState>,
    width: u32,
    height: u32,
    total_frames: usize,
}

struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    next_index: usize,
    flushing: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        ffmpeg_next::init().map_err(|e| open_error(path, e))?;

        let state = DecodeState::open(path).map_err(|e| open_error(path, e))?;
        let width = state.decoder.width();
        let height = state.decoder.height();
        let reported = state
            .ictx
            .stream(state.stream_index)
            .map(|s| s.frames())
            .unwrap_or(0);

        let mut source = Self {
            path: path.to_path_buf(),
            decode: Some(state),
            width,
            height,
            total_frames: reported.max(0) as usize,
        };

        // Containers without a frame count need one full decode pass.
        if source.total_frames == 0 {
            source.total_frames = source.count_frames().map_err(|e| open_error(path, e))?;
            source.decode = None;
        }

        log::debug!(
            "Opened {} ({width}x{height}, {} frames)",
            path.display(),
            source.total_frames
        );
        Ok(source)
    }

    fn count_frames(&mut self) -> Result<usize, ffmpeg_next::Error> {
        let mut state = DecodeState::open(&self.path)?;
        let mut count = 0;
        while state.next_gray(self.width, self.height)?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

impl DecodeState {
    fn open(path: &Path) -> Result<Self, ffmpeg_next::Error> {
        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(ffmpeg_next::Error::StreamNotFound)?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::GRAY8,
            decoder.width(),
            decoder.height(),
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            next_index: 0,
            flushing: false,
        })
    }

    /// Decodes the next frame as tightly packed GRAY8, or `None` at end of stream.
    fn next_gray(&mut self, width: u32, height: u32) -> Result<Option<Vec<u8>>, ffmpeg_next::Error> {
        loop {
            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let mut gray = ffmpeg_next::util::frame::video::Video::empty();
                self.scaler.run(&decoded, &mut gray)?;
                self.next_index += 1;
                return Ok(Some(extract_gray_pixels(&gray, width, height)));
            }
            if self.flushing {
                return Ok(None);
            }

            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == self.stream_index {
                        // Corrupt packets are skipped; the decoder resyncs.
                        let _ = self.decoder.send_packet(&packet);
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn len(&self) -> usize {
        self.total_frames
    }

    fn frame(&mut self, index: usize) -> Result<Frame, FrameDecodeError> {
        if index >= self.total_frames {
            return Err(FrameDecodeError::new(
                index,
                format!("out of range (len {})", self.total_frames),
            ));
        }

        let needs_reopen = self
            .decode
            .as_ref()
            .map(|s| s.next_index > index)
            .unwrap_or(true);
        if needs_reopen {
            let state = DecodeState::open(&self.path)
                .map_err(|e| FrameDecodeError::new(index, e.to_string()))?;
            self.decode = Some(state);
        }

        let (width, height) = (self.width, self.height);
        let state = self
            .decode
            .as_mut()
            .ok_or_else(|| FrameDecodeError::new(index, "decoder not open"))?;

        loop {
            let current = state.next_index;
            let pixels = state
                .next_gray(width, height)
                .map_err(|e| FrameDecodeError::new(index, e.to_string()))?
                .ok_or_else(|| FrameDecodeError::new(index, "stream ended early"))?;
            if current == index {
                return Frame::from_u8(&pixels, width, height, index)
                    .map_err(|e| FrameDecodeError::new(index, e.to_string()));
            }
        }
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
            total_frames: self.total_frames,
            source_path: Some(self.path.clone()),
        }
    }
}

fn open_error(path: &Path, e: ffmpeg_next::Error) -> SourceError {
    SourceError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Copies a GRAY8 ffmpeg frame into a contiguous buffer, dropping row padding.
fn extract_gray_pixels(
    frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let w = width as usize;

    let mut pixels = Vec::with_capacity(w * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w]);
    }
    pixels
}
