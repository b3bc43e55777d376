use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("frame is {width}x{height}, background model expects {expected_width}x{expected_height}")]
    GeometryMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}

/// Running per-sequence background estimate.
///
/// Stateful and order dependent: every frame of a sequence must be applied
/// exactly once, in presentation order. Geometry is fixed by the first frame.
pub trait BackgroundModel: Send {
    /// Updates the model with `frame` and returns its foreground mask
    /// (255 = foreground, 0 = background).
    fn apply(&mut self, frame: &GrayImage) -> Result<GrayImage, PreprocessError>;
}

/// Which [`BackgroundModel`] a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMethod {
    #[default]
    Mog2,
    FirstFrame,
}

/// Geometry guard shared by the model implementations.
pub(crate) fn check_geometry(
    frame: &GrayImage,
    expected_width: u32,
    expected_height: u32,
) -> Result<(), PreprocessError> {
    if frame.width() != expected_width || frame.height() != expected_height {
        return Err(PreprocessError::GeometryMismatch {
            width: frame.width(),
            height: frame.height(),
            expected_width,
            expected_height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&BackgroundMethod::FirstFrame).unwrap(),
            "\"first_frame\""
        );
        assert_eq!(
            serde_json::from_str::<BackgroundMethod>("\"mog2\"").unwrap(),
            BackgroundMethod::Mog2
        );
    }

    #[test]
    fn test_check_geometry() {
        let frame = GrayImage::new(4, 3);
        assert!(check_geometry(&frame, 4, 3).is_ok());
        assert_eq!(
            check_geometry(&frame, 4, 4),
            Err(PreprocessError::GeometryMismatch {
                width: 4,
                height: 3,
                expected_width: 4,
                expected_height: 4
            })
        );
    }
}
