use std::path::PathBuf;

/// Geometry and length of a frame sequence, as reported by its source.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceMetadata {
    pub width: u32,
    pub height: u32,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl std::fmt::Display for SequenceMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} frames ({}x{})", self.total_frames, self.width, self.height)?;
        if let Some(path) = &self.source_path {
            write!(f, " from {}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_source() {
        let meta = SequenceMetadata {
            width: 512,
            height: 256,
            total_frames: 100,
            source_path: Some(PathBuf::from("/tmp/run_01")),
        };
        assert_eq!(meta.to_string(), "100 frames (512x256) from /tmp/run_01");
    }

    #[test]
    fn test_display_without_source() {
        let meta = SequenceMetadata {
            width: 10,
            height: 11,
            total_frames: 0,
            source_path: None,
        };
        assert_eq!(meta.to_string(), "0 frames (10x11)");
    }
}
