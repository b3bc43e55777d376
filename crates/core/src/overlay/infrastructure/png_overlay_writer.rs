use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detection::domain::blob_detector::Blob;
use crate::overlay::domain::overlay_sink::{OverlayError, OverlaySink};
use crate::preprocessing::domain::frame_preprocessor::PreprocessedFrame;
use crate::tracking::domain::outlet::OutletClassification;
use crate::tracking::domain::tracked_object::TrackedObject;

const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const UPPER_TRACK_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LOWER_TRACK_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

/// Writes `<dir>/<frame:03>.png` for every rendered frame.
///
/// The normalized frame is the backdrop. Merged contours are drawn in red,
/// alive tracks as boxes coloured by the half of the frame they sit in.
pub struct PngOverlayWriter {
    dir: PathBuf,
    dir_ready: bool,
}

impl PngOverlayWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            dir_ready: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, frame_index: usize) -> PathBuf {
        self.dir.join(format!("{frame_index:03}.png"))
    }
}

impl OverlaySink for PngOverlayWriter {
    fn render(
        &mut self,
        frame: &PreprocessedFrame,
        blobs: &[Blob],
        tracks: &[&TrackedObject],
    ) -> Result<(), OverlayError> {
        if !self.dir_ready {
            std::fs::create_dir_all(&self.dir).map_err(|source| OverlayError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;
            self.dir_ready = true;
        }

        let canvas = annotate(frame, blobs, tracks);
        let path = self.path_for(frame.index);
        canvas
            .save(&path)
            .map_err(|source| OverlayError::Write { path, source })
    }
}

fn annotate(frame: &PreprocessedFrame, blobs: &[Blob], tracks: &[&TrackedObject]) -> RgbImage {
    let (width, height) = frame.normalized.dimensions();
    let mut canvas = RgbImage::from_fn(width, height, |x, y| {
        let v = frame.normalized.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });

    for point in blobs.iter().flat_map(|b| b.contour.iter()) {
        if point.x >= 0 && point.y >= 0 && (point.x as u32) < width && (point.y as u32) < height {
            canvas.put_pixel(point.x as u32, point.y as u32, CONTOUR_COLOR);
        }
    }

    for track in tracks {
        let bbox = track.bbox();
        if bbox.width <= 0 || bbox.height <= 0 {
            continue;
        }
        let color = match OutletClassification::classify(bbox.y, height) {
            OutletClassification::Responsive => UPPER_TRACK_COLOR,
            _ => LOWER_TRACK_COLOR,
        };
        let rect = Rect::at(bbox.x, bbox.y).of_size(bbox.width as u32, bbox.height as u32);
        draw_hollow_rect_mut(&mut canvas, rect, color);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::Detection;
    use crate::shared::bounding_box::BoundingBox;
    use image::{GrayImage, Luma};
    use imageproc::point::Point;

    fn frame(index: usize) -> PreprocessedFrame {
        PreprocessedFrame {
            index,
            normalized: GrayImage::from_pixel(40, 40, Luma([60])),
            foreground: GrayImage::new(40, 40),
        }
    }

    fn track(id: u32, x: i32, y: i32) -> TrackedObject {
        TrackedObject::new(id, &Detection::new(BoundingBox::new(x, y, 6, 6), 0))
    }

    #[test]
    fn test_file_name_is_zero_padded() {
        let writer = PngOverlayWriter::new("/tmp/overlay");
        assert_eq!(writer.path_for(7), PathBuf::from("/tmp/overlay/007.png"));
        assert_eq!(writer.path_for(1234), PathBuf::from("/tmp/overlay/1234.png"));
    }

    #[test]
    fn test_render_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("overlay");
        let mut writer = PngOverlayWriter::new(&dir);
        writer.render(&frame(3), &[], &[]).unwrap();
        assert!(dir.join("003.png").exists());
    }

    #[test]
    fn test_contours_and_boxes_are_drawn() {
        let tmp = tempfile::tempdir().unwrap();
        let mut writer = PngOverlayWriter::new(tmp.path());
        let blob = Blob {
            detection: Detection::new(BoundingBox::new(2, 2, 1, 1), 0),
            contour: vec![Point::new(2, 2), Point::new(-1, 5), Point::new(45, 5)],
        };
        let upper = track(1, 10, 4);
        let lower = track(2, 10, 30);
        writer.render(&frame(0), &[blob], &[&upper, &lower]).unwrap();

        let img = image::open(writer.path_for(0)).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(2, 2), &CONTOUR_COLOR);
        assert_eq!(img.get_pixel(10, 4), &UPPER_TRACK_COLOR);
        assert_eq!(img.get_pixel(10, 30), &LOWER_TRACK_COLOR);
        assert_eq!(img.get_pixel(0, 39), &Rgb([60, 60, 60]));
    }

    #[test]
    fn test_unwritable_directory_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("taken");
        std::fs::write(&file, b"x").unwrap();
        let mut writer = PngOverlayWriter::new(&file);
        let err = writer.render(&frame(0), &[], &[]).unwrap_err();
        assert!(matches!(err, OverlayError::CreateDir { .. }));
    }
}
