use std::collections::BTreeMap;

use crate::detection::domain::detection::Detection;
use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::tracked_object::TrackedObject;

/// Centroid distance between `track` and `detection` when the pair passes
/// both gates, `None` otherwise.
///
/// Objects only flow rightward: the detection's center x must be strictly
/// greater than the track's. The distance must be strictly below
/// `max_centroid_distance`.
pub fn gated_distance(
    track: &BoundingBox,
    detection: &BoundingBox,
    max_centroid_distance: u32,
) -> Option<u32> {
    let (track_x, _) = track.center();
    let (detection_x, _) = detection.center();
    if detection_x <= track_x {
        return None;
    }
    let distance = track.centroid_distance(detection);
    (distance < max_centroid_distance).then_some(distance)
}

/// The alive track nearest to `detection` among those passing the gates.
///
/// Tracks are visited in ascending id order and only a strictly smaller
/// distance replaces the current best, so the lowest id wins ties.
pub fn nearest_track(
    alive: &BTreeMap<u32, TrackedObject>,
    detection: &Detection,
    max_centroid_distance: u32,
) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for (&id, track) in alive {
        let Some(distance) = gated_distance(&track.bbox(), &detection.bbox, max_centroid_distance)
        else {
            continue;
        };
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id)
}
