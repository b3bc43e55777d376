/// Axis-aligned pixel rectangle: top-left corner plus size.
///
/// All geometry is integral. Centers truncate toward the top-left, which
/// keeps centroid distances reproducible across platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Euclidean distance between the two centers, truncated to whole pixels.
    pub fn centroid_distance(&self, other: &BoundingBox) -> u32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        let dx = (ax - bx) as f64;
        let dy = (ay - by) as f64;
        (dx * dx + dy * dy).sqrt() as u32
    }
}
