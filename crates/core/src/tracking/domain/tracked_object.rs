use crate::detection::domain::detection::Detection;
use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::outlet::OutletClassification;

/// Where a tracked object was at one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrajectoryPoint {
    pub frame: usize,
    pub bbox: BoundingBox,
}

/// A detection promoted to a persistent identity.
///
/// Only the registry mutates a tracked object; once it leaves the alive set
/// it is frozen and handed to the result set.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedObject {
    id: u32,
    bbox: BoundingBox,
    most_recent_frame: usize,
    frames_tracked: u32,
    outlet: OutletClassification,
    trajectory: Vec<TrajectoryPoint>,
}

impl TrackedObject {
    pub(crate) fn new(id: u32, detection: &Detection) -> Self {
        Self {
            id,
            bbox: detection.bbox,
            most_recent_frame: detection.frame,
            frames_tracked: 0,
            outlet: OutletClassification::Unclassified,
            trajectory: vec![TrajectoryPoint {
                frame: detection.frame,
                bbox: detection.bbox,
            }],
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn center(&self) -> (i32, i32) {
        self.bbox.center()
    }

    pub fn most_recent_frame(&self) -> usize {
        self.most_recent_frame
    }

    /// Successful re-matches since creation, not lifetime in frames.
    pub fn frames_tracked(&self) -> u32 {
        self.frames_tracked
    }

    pub fn outlet(&self) -> OutletClassification {
        self.outlet
    }

    /// Creation point followed by every match, in frame order.
    pub fn trajectory(&self) -> &[TrajectoryPoint] {
        &self.trajectory
    }

    /// Frames elapsed since the last match.
    pub fn staleness(&self, frame: usize) -> usize {
        frame.saturating_sub(self.most_recent_frame)
    }

    /// Takes over a matched detection's geometry and frame.
    pub(crate) fn absorb(&mut self, detection: &Detection) {
        debug_assert!(detection.frame >= self.most_recent_frame);
        self.bbox = detection.bbox;
        self.most_recent_frame = detection.frame;
        self.frames_tracked += 1;
        self.trajectory.push(TrajectoryPoint {
            frame: detection.frame,
            bbox: detection.bbox,
        });
    }

    /// Fixes the outlet from the last position. Later calls are ignored.
    pub(crate) fn classify(&mut self, frame_height: u32) {
        if self.outlet.is_classified() {
            return;
        }
        self.outlet = OutletClassification::classify(self.bbox.y, frame_height);
    }
}
