use image::imageops;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::point::Point;

use crate::detection::infrastructure::math::min_enclosing_circle;

/// Fuses contour fragments that belong to one physical object.
///
/// Each contour's minimum enclosing circle, grown by `padding`, is painted
/// as a filled disk on a scratch mask. Disks that touch become one region,
/// and the outer borders of those regions are the merged contours.
pub struct OverlapMerger {
    padding: u32,
}

impl OverlapMerger {
    pub fn new(padding: u32) -> Self {
        Self { padding }
    }

    pub fn merge(
        &self,
        contours: &[Vec<Point<i32>>],
        width: u32,
        height: u32,
    ) -> Vec<Vec<Point<i32>>> {
        if contours.is_empty() {
            return Vec::new();
        }

        let mut scratch = GrayImage::new(width, height);
        for contour in contours {
            let Some(circle) = min_enclosing_circle(contour) else {
                continue;
            };
            let radius = (circle.radius + self.padding as f64) as i32;
            draw_filled_circle_mut(
                &mut scratch,
                (circle.cx as i32, circle.cy as i32),
                radius,
                Luma([255u8]),
            );
        }

        external_contours(&scratch)
    }
}

/// Outer borders that are not nested inside another region.
///
/// The border follower only opens an outer border at a foreground pixel with
/// background to its left, so the image is traced inside a one-pixel zero
/// frame and the points are shifted back afterwards.
pub fn external_contours(image: &GrayImage) -> Vec<Vec<Point<i32>>> {
    let (width, height) = image.dimensions();
    let mut framed = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut framed, image, 1, 1);

    find_contours::<i32>(&framed)
        .into_iter()
        .filter(is_external)
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect()
        })
        .collect()
}

fn is_external(contour: &Contour<i32>) -> bool {
    contour.border_type == BorderType::Outer && contour.parent.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::math::bounding_rect;
    use rstest::rstest;

    /// A fragment whose enclosing circle is exactly centred at `(cx, cy)`.
    fn fragment(cx: i32, cy: i32, r: i32) -> Vec<Point<i32>> {
        vec![Point::new(cx - r, cy), Point::new(cx, cy + 1), Point::new(cx + r, cy)]
    }

    #[test]
    fn test_no_contours_no_output() {
        let merger = OverlapMerger::new(6);
        assert!(merger.merge(&[], 50, 50).is_empty());
    }

    #[test]
    fn test_single_fragment_grows_by_padding() {
        let merger = OverlapMerger::new(3);
        let merged = merger.merge(&[fragment(25, 25, 4)], 50, 50);
        assert_eq!(merged.len(), 1);
        let bbox = bounding_rect(&merged[0]).unwrap();
        // Disk of radius 4 + 3 centred at (25, 25).
        assert_eq!(bbox.x, 18);
        assert_eq!(bbox.y, 18);
        assert_eq!(bbox.width, 15);
        assert_eq!(bbox.height, 15);
    }

    #[test]
    fn test_nearby_fragments_fuse() {
        let merger = OverlapMerger::new(6);
        let fragments = vec![fragment(20, 25, 2), fragment(30, 25, 2)];
        let merged = merger.merge(&fragments, 60, 50);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_distant_fragments_stay_apart() {
        let merger = OverlapMerger::new(2);
        let fragments = vec![fragment(10, 10, 2), fragment(40, 40, 2)];
        let merged = merger.merge(&fragments, 60, 60);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_disk_is_clipped_at_border() {
        let merger = OverlapMerger::new(4);
        let merged = merger.merge(&[vec![Point::new(0, 0)]], 20, 20);
        assert_eq!(merged.len(), 1);
        let bbox = bounding_rect(&merged[0]).unwrap();
        assert_eq!((bbox.x, bbox.y), (0, 0));
        assert_eq!((bbox.width, bbox.height), (5, 5));
    }

    #[test]
    fn test_external_contours_skip_holes() {
        let mut img = GrayImage::new(20, 20);
        for y in 2..18 {
            for x in 2..18 {
                if !(6..14).contains(&x) || !(6..14).contains(&y) {
                    img.put_pixel(x, y, Luma([255]));
                }
            }
        }
        // A filled island inside the hole is nested, not external.
        for y in 9..11 {
            for x in 9..11 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = external_contours(&img);
        assert_eq!(contours.len(), 1);
        let bbox = bounding_rect(&contours[0]).unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (2, 2, 16, 16));
    }

    #[rstest]
    #[case::clipped(-3)]
    #[case::touching(0)]
    #[case::near(2)]
    #[case::inside(6)]
    fn test_region_at_left_edge_is_external(#[case] cx: i32) {
        let mut img = GrayImage::new(30, 30);
        draw_filled_circle_mut(&mut img, (cx, 15), 5, Luma([255u8]));
        let contours = external_contours(&img);
        assert_eq!(contours.len(), 1);
        let bbox = bounding_rect(&contours[0]).unwrap();
        assert_eq!(bbox.x, (cx - 5).max(0));
        assert_eq!(bbox.y, 10);
    }

    #[test]
    fn test_region_filling_the_frame() {
        let mut img = GrayImage::new(8, 6);
        for p in img.pixels_mut() {
            *p = Luma([255]);
        }
        let contours = external_contours(&img);
        assert_eq!(contours.len(), 1);
        let bbox = bounding_rect(&contours[0]).unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (0, 0, 8, 6));
    }
}
