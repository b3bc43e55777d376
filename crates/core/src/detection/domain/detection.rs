use crate::shared::bounding_box::BoundingBox;

/// One candidate object seen in a single frame. Carries no identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub frame: usize,
}

impl Detection {
    pub fn new(bbox: BoundingBox, frame: usize) -> Self {
        Self { bbox, frame }
    }

    pub fn center(&self) -> (i32, i32) {
        self.bbox.center()
    }
}
