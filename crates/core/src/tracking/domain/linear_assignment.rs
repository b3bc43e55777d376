//! Minimum-cost pairing of alive tracks with one frame's detections.
//!
//! Costs are centroid distances for pairs that pass the association gates.
//! Gated-out pairs carry a cost large enough that the solver always prefers
//! one more valid match over a cheaper set of fewer matches, and any such
//! pair the solver still picks is dropped afterwards.

use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

use crate::detection::domain::detection::Detection;
use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::association::gated_distance;

/// One accepted pairing, as indices into the solver's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub track_idx: usize,
    pub detection_idx: usize,
}

/// Solves the assignment, matching each track and each detection at most once.
///
/// Matches come back ordered by detection index.
pub fn min_cost_matching(
    tracks: &[BoundingBox],
    detections: &[Detection],
    max_centroid_distance: u32,
) -> Vec<Match> {
    if tracks.is_empty() || detections.is_empty() {
        return Vec::new();
    }

    // kuhn_munkres needs rows <= columns.
    let transposed = tracks.len() > detections.len();
    let (rows, cols) = if transposed {
        (detections.len(), tracks.len())
    } else {
        (tracks.len(), detections.len())
    };
    let pair = |row: usize, col: usize| if transposed { (col, row) } else { (row, col) };

    let gate_cost = i64::from(max_centroid_distance.max(1)) * (rows as i64 + 1);
    let mut costs = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let (t, d) = pair(row, col);
            let cost = gated_distance(&tracks[t], &detections[d].bbox, max_centroid_distance)
                .map_or(gate_cost, i64::from);
            costs.push(cost);
        }
    }

    let matrix = Matrix::from_vec(rows, cols, costs).expect("cost matrix is rows x cols");
    let (_, assignment) = kuhn_munkres_min(&matrix);

    let mut matches: Vec<Match> = assignment
        .into_iter()
        .enumerate()
        .filter(|&(row, col)| matrix[(row, col)] < gate_cost)
        .map(|(row, col)| {
            let (track_idx, detection_idx) = pair(row, col);
            Match {
                track_idx,
                detection_idx,
            }
        })
        .collect();
    matches.sort_by_key(|m| m.detection_idx);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32) -> BoundingBox {
        BoundingBox::new(x, y, 0, 0)
    }

    fn dets(points: &[(i32, i32)]) -> Vec<Detection> {
        points.iter().map(|&(x, y)| Detection::new(at(x, y), 1)).collect()
    }

    fn m(track_idx: usize, detection_idx: usize) -> Match {
        Match {
            track_idx,
            detection_idx,
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert!(min_cost_matching(&[], &dets(&[(5, 0)]), 70).is_empty());
        assert!(min_cost_matching(&[at(0, 0)], &[], 70).is_empty());
    }

    #[test]
    fn test_minimizes_total_distance() {
        // A-d0 25, A-d1 50, B-d0 5, B-d1 36: the cheapest total is A-d1 + B-d0.
        let tracks = [at(0, 0), at(20, 0)];
        let matches = min_cost_matching(&tracks, &dets(&[(25, 0), (40, 30)]), 60);
        assert_eq!(matches, vec![m(1, 0), m(0, 1)]);
    }

    #[test]
    fn test_prefers_more_matches_over_lower_cost() {
        // B-d0 alone costs 2, but A-d0 + B-d1 pairs both detections.
        let tracks = [at(0, 0), at(10, 0)];
        let matches = min_cost_matching(&tracks, &dets(&[(12, 0), (45, 0)]), 40);
        assert_eq!(matches, vec![m(0, 0), m(1, 1)]);
    }

    #[test]
    fn test_gated_pairs_are_never_returned() {
        let tracks = [at(0, 0), at(50, 0)];
        let matches = min_cost_matching(&tracks, &dets(&[(100, 0), (40, 0)]), 45);
        // Track 1 is ahead of detection 1 and too far from detection 0.
        assert_eq!(matches, vec![m(0, 1)]);
    }

    #[test]
    fn test_more_tracks_than_detections() {
        let tracks = [at(0, 0), at(10, 0), at(20, 0)];
        let matches = min_cost_matching(&tracks, &dets(&[(22, 0)]), 70);
        assert_eq!(matches, vec![m(2, 0)]);
    }

    #[test]
    fn test_more_detections_than_tracks() {
        let tracks = [at(0, 0)];
        let matches = min_cost_matching(&tracks, &dets(&[(5, 0), (3, 0), (-5, 0)]), 70);
        assert_eq!(matches, vec![m(0, 1)]);
    }

    #[test]
    fn test_each_track_used_once() {
        let tracks = [at(0, 0)];
        let matches = min_cost_matching(&tracks, &dets(&[(5, 0), (6, 0)]), 70);
        assert_eq!(matches.len(), 1);
    }
}
