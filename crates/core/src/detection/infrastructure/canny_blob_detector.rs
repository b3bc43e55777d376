use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::open;

use crate::detection::domain::blob_detector::{Blob, BlobDetector, DetectorConfig};
use crate::detection::domain::detection::Detection;
use crate::detection::infrastructure::math::bounding_rect;
use crate::detection::infrastructure::overlap_merger::{external_contours, OverlapMerger};
use crate::preprocessing::domain::frame_preprocessor::PreprocessedFrame;

/// Detects blobs on the foreground mask with an open, Canny, merge chain.
///
/// 1. Opening with a 3x3 cross drops single-pixel noise.
/// 2. Canny with hysteresis thresholds `canny_lower` / `canny_upper`.
/// 3. External contours of the edge image.
/// 4. Overlap merge with `cell_radius` padding.
/// 5. Bounding rectangles, rejecting any side above `cell_radius * 10`.
pub struct CannyBlobDetector {
    config: DetectorConfig,
    merger: OverlapMerger,
}

impl CannyBlobDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            merger: OverlapMerger::new(config.cell_radius),
            config,
        }
    }
}

impl BlobDetector for CannyBlobDetector {
    fn detect(&self, frame: &PreprocessedFrame) -> Vec<Blob> {
        let (width, height) = frame.foreground.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let opened = open(&frame.foreground, Norm::L1, 1);
        let edges = canny(
            &opened,
            self.config.canny_lower as f32,
            self.config.canny_upper as f32,
        );
        let fragments = external_contours(&edges);
        let merged = self.merger.merge(&fragments, width, height);

        let max_size = self.config.max_object_size();
        let blobs: Vec<Blob> = merged
            .into_iter()
            .filter_map(|contour| {
                let bbox = bounding_rect(&contour)?;
                if bbox.width > max_size || bbox.height > max_size {
                    log::trace!(
                        "Frame {}: rejected {}x{} blob at ({}, {})",
                        frame.index,
                        bbox.width,
                        bbox.height,
                        bbox.x,
                        bbox.y
                    );
                    return None;
                }
                Some(Blob {
                    detection: Detection::new(bbox, frame.index),
                    contour,
                })
            })
            .collect();

        log::trace!(
            "Frame {}: {} fragments merged into {} blobs",
            frame.index,
            fragments.len(),
            blobs.len()
        );
        blobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;
    use rstest::rstest;

    fn detector(cell_radius: u32) -> CannyBlobDetector {
        CannyBlobDetector::new(DetectorConfig {
            canny_lower: 85,
            canny_upper: 255,
            cell_radius,
        })
    }

    fn masked(foreground: GrayImage, index: usize) -> PreprocessedFrame {
        PreprocessedFrame {
            index,
            normalized: foreground.clone(),
            foreground,
        }
    }

    fn disks(width: u32, height: u32, centers: &[(i32, i32)], radius: i32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for &c in centers {
            draw_filled_circle_mut(&mut img, c, radius, Luma([255]));
        }
        img
    }

    #[test]
    fn test_empty_mask_yields_nothing() {
        let blobs = detector(6).detect(&masked(GrayImage::new(64, 48), 0));
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_zero_sized_frame_yields_nothing() {
        assert!(detector(6).detect(&masked(GrayImage::new(0, 0), 0)).is_empty());
    }

    #[test]
    fn test_single_disk_is_one_detection() {
        let frame = masked(disks(80, 60, &[(30, 30)], 6), 7);
        let blobs = detector(6).detect(&frame);
        assert_eq!(blobs.len(), 1);

        let d = blobs[0].detection;
        assert_eq!(d.frame, 7);
        let (cx, cy) = d.center();
        assert!((cx - 30).abs() <= 2, "center x {cx}");
        assert!((cy - 30).abs() <= 2, "center y {cy}");
        // Padding by cell_radius makes the box larger than the disk itself.
        assert!(d.bbox.width > 13);
        assert!(!blobs[0].contour.is_empty());
    }

    #[rstest]
    #[case::touching(0)]
    #[case::near(2)]
    #[case::entering(4)]
    fn test_particle_at_left_edge_is_detected(#[case] cx: i32) {
        let frame = masked(disks(80, 60, &[(cx, 30)], 5), 3);
        let blobs = detector(6).detect(&frame);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].detection.bbox.x, 0);
    }

    #[test]
    fn test_distant_disks_are_separate() {
        let frame = masked(disks(120, 60, &[(25, 30), (95, 30)], 5), 0);
        let blobs = detector(6).detect(&frame);
        assert_eq!(blobs.len(), 2);
    }

    #[test]
    fn test_close_fragments_merge() {
        let frame = masked(disks(100, 60, &[(40, 30), (54, 30)], 4), 0);
        let blobs = detector(6).detect(&frame);
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn test_oversized_blob_is_rejected() {
        let mut img = GrayImage::new(200, 100);
        draw_filled_rect_mut(&mut img, Rect::at(60, 40).of_size(70, 20), Luma([255]));
        let blobs = detector(6).detect(&masked(img, 0));
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_isolated_pixel_is_opened_away() {
        let mut img = GrayImage::new(40, 40);
        img.put_pixel(20, 20, Luma([255]));
        assert!(detector(6).detect(&masked(img, 0)).is_empty());
    }

    #[test]
    fn test_only_the_mask_is_searched() {
        let frame = PreprocessedFrame {
            index: 0,
            normalized: disks(80, 60, &[(30, 30)], 6),
            foreground: GrayImage::new(80, 60),
        };
        assert!(detector(6).detect(&frame).is_empty());
    }

    #[test]
    fn test_detection_is_stateless() {
        let det = detector(6);
        let frame = masked(disks(80, 60, &[(30, 30)], 6), 0);
        let first = det.detect(&frame);
        det.detect(&masked(disks(80, 60, &[(50, 20)], 6), 1));
        let again = det.detect(&frame);
        assert_eq!(first, again);
    }
}
