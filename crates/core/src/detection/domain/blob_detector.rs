use imageproc::point::Point;

use crate::detection::domain::detection::Detection;
use crate::preprocessing::domain::frame_preprocessor::PreprocessedFrame;

/// Edge and merge parameters for blob detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorConfig {
    pub canny_lower: u32,
    pub canny_upper: u32,
    /// Padding added to enclosing circles when merging fragments; also
    /// the basis of the size filter.
    pub cell_radius: u32,
}

impl DetectorConfig {
    /// Blobs wider or taller than this are rejected as artifacts.
    pub fn max_object_size(&self) -> i32 {
        self.cell_radius as i32 * crate::shared::constants::SIZE_FILTER_FACTOR
    }
}

/// A detection plus the merged outline it was measured from.
///
/// The outline is only consumed by overlay rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub detection: Detection,
    pub contour: Vec<Point<i32>>,
}

/// Finds candidate objects in one preprocessed frame.
///
/// Detection is stateless across frames: the output for one frame never
/// depends on any other frame.
pub trait BlobDetector: Send {
    fn detect(&self, frame: &PreprocessedFrame) -> Vec<Blob>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_object_size_is_ten_radii() {
        let config = DetectorConfig {
            canny_lower: 85,
            canny_upper: 255,
            cell_radius: 6,
        };
        assert_eq!(config.max_object_size(), 60);
    }
}
