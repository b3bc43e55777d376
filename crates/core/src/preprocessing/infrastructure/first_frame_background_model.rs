use image::{GrayImage, Luma};

use crate::preprocessing::domain::background_model::{
    check_geometry, BackgroundModel, PreprocessError,
};

pub const DEFAULT_DIFFERENCE_THRESHOLD: u8 = 25;

/// Treats the first frame as a fixed background plate.
///
/// A pixel is foreground when its absolute difference from the plate
/// exceeds the threshold. Suited to short runs with a still background;
/// drift or illumination changes show up as foreground.
pub struct FirstFrameBackgroundModel {
    threshold: u8,
    plate: Option<GrayImage>,
}

impl FirstFrameBackgroundModel {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            plate: None,
        }
    }
}

impl Default for FirstFrameBackgroundModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFERENCE_THRESHOLD)
    }
}

impl BackgroundModel for FirstFrameBackgroundModel {
    fn apply(&mut self, frame: &GrayImage) -> Result<GrayImage, PreprocessError> {
        let Some(plate) = &self.plate else {
            self.plate = Some(frame.clone());
            return Ok(GrayImage::new(frame.width(), frame.height()));
        };
        check_geometry(frame, plate.width(), plate.height())?;

        Ok(GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            let diff = frame.get_pixel(x, y)[0].abs_diff(plate.get_pixel(x, y)[0]);
            Luma([if diff > self.threshold { 255 } else { 0 }])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_first_frame_yields_empty_mask() {
        let mut model = FirstFrameBackgroundModel::default();
        let mask = model.apply(&GrayImage::from_pixel(4, 4, Luma([90]))).unwrap();
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[rstest]
    #[case::at_threshold(125, 0)]
    #[case::above_threshold(126, 255)]
    #[case::darker(60, 255)]
    #[case::unchanged(100, 0)]
    fn test_difference_threshold(#[case] value: u8, #[case] expected: u8) {
        let mut model = FirstFrameBackgroundModel::new(25);
        model.apply(&GrayImage::from_pixel(2, 2, Luma([100]))).unwrap();
        let mask = model.apply(&GrayImage::from_pixel(2, 2, Luma([value]))).unwrap();
        assert_eq!(mask.get_pixel(1, 1)[0], expected);
    }

    #[test]
    fn test_plate_is_not_updated() {
        let mut model = FirstFrameBackgroundModel::default();
        model.apply(&GrayImage::from_pixel(2, 2, Luma([0]))).unwrap();
        model.apply(&GrayImage::from_pixel(2, 2, Luma([200]))).unwrap();
        let mask = model.apply(&GrayImage::from_pixel(2, 2, Luma([200]))).unwrap();
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_geometry_change_is_error() {
        let mut model = FirstFrameBackgroundModel::default();
        model.apply(&GrayImage::new(3, 3)).unwrap();
        assert!(matches!(
            model.apply(&GrayImage::new(3, 4)),
            Err(PreprocessError::GeometryMismatch { height: 4, .. })
        ));
    }
}
