use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::outlet::OutletClassification;
use crate::tracking::domain::tracked_object::TrackedObject;

/// One detection as it was assigned to a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionRecord {
    pub frame: usize,
    pub object_id: u32,
    pub bbox: BoundingBox,
}

/// Counts by outlet classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResultSummary {
    pub total: usize,
    pub responsive: usize,
    pub non_responsive: usize,
    pub unclassified: usize,
}

/// Everything a finished sequence run produced.
#[derive(Clone, Debug, Default)]
pub struct SequenceResult {
    /// Expired tracks in expiry order, followed by the flushed ones by id.
    pub objects: Vec<TrackedObject>,
    /// Append-only assignment log; empty unless history recording was on.
    pub history: Vec<DetectionRecord>,
    pub frames_processed: usize,
    pub frame_height: u32,
}

impl SequenceResult {
    pub fn summary(&self) -> ResultSummary {
        self.objects
            .iter()
            .fold(ResultSummary::default(), |mut acc, obj| {
                acc.total += 1;
                match obj.outlet() {
                    OutletClassification::Responsive => acc.responsive += 1,
                    OutletClassification::NonResponsive => acc.non_responsive += 1,
                    OutletClassification::Unclassified => acc.unclassified += 1,
                }
                acc
            })
    }

    pub fn object(&self, id: u32) -> Option<&TrackedObject> {
        self.objects.iter().find(|o| o.id() == id)
    }
}
