#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_reader;
pub mod image_sequence_reader;
pub mod in_memory_frame_source;
