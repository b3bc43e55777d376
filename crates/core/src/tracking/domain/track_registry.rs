use std::collections::BTreeMap;

use crate::detection::domain::detection::Detection;
use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::association::nearest_track;
use crate::tracking::domain::linear_assignment::min_cost_matching;
use crate::tracking::domain::registry_config::{ExpiryPolicy, MatchingStrategy, RegistryConfig};
use crate::tracking::domain::tracked_object::TrackedObject;

/// Tracks removed by one expiry pass.
#[derive(Debug, Default)]
pub struct ExpiredTracks {
    /// Classified tracks that belong in the result set.
    pub recorded: Vec<TrackedObject>,
    /// Ids dropped by [`ExpiryPolicy::DropUnconfirmed`].
    pub discarded: Vec<u32>,
}

/// Everything one frame did to the registry.
#[derive(Debug, Default)]
pub struct FrameUpdate {
    pub expired: ExpiredTracks,
    /// Track id each detection ended up in, in detection order.
    pub assigned_ids: Vec<u32>,
}

/// Owns the alive set and the id counter of one sequence.
///
/// Per frame: expire stale tracks, then match each detection to an alive
/// track or promote it to a new one. Ids start at 1 and are never reused.
pub struct TrackRegistry {
    config: RegistryConfig,
    frame_height: u32,
    alive: BTreeMap<u32, TrackedObject>,
    next_id: u32,
}

impl TrackRegistry {
    pub fn new(config: RegistryConfig, frame_height: u32) -> Self {
        Self {
            config,
            frame_height,
            alive: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Alive tracks in ascending id order.
    pub fn alive(&self) -> impl Iterator<Item = &TrackedObject> {
        self.alive.values()
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    pub fn get(&self, id: u32) -> Option<&TrackedObject> {
        self.alive.get(&id)
    }

    /// Expires stale tracks, then associates `detections` in order.
    pub fn process_frame(&mut self, frame: usize, detections: &[Detection]) -> FrameUpdate {
        let expired = self.expire_stale(frame);
        let assigned_ids = match self.config.matching {
            MatchingStrategy::Greedy => detections
                .iter()
                .map(|d| self.match_or_create(d))
                .collect(),
            MatchingStrategy::Optimal => self.assign_optimal(detections),
        };
        FrameUpdate {
            expired,
            assigned_ids,
        }
    }

    /// Removes every track unmatched for more than `timeout` frames.
    pub fn expire_stale(&mut self, frame: usize) -> ExpiredTracks {
        let timeout = self.config.timeout as usize;
        let stale: Vec<u32> = self
            .alive
            .iter()
            .filter(|(_, track)| track.staleness(frame) > timeout)
            .map(|(&id, _)| id)
            .collect();

        let mut expired = ExpiredTracks::default();
        for id in stale {
            let Some(mut track) = self.alive.remove(&id) else {
                continue;
            };
            if let ExpiryPolicy::DropUnconfirmed { min_frames_tracked } = self.config.expiry {
                if track.frames_tracked() < min_frames_tracked {
                    log::debug!(
                        "Frame {frame}: discarded track {id} after {} matches",
                        track.frames_tracked()
                    );
                    expired.discarded.push(id);
                    continue;
                }
            }
            track.classify(self.frame_height);
            log::trace!(
                "Frame {frame}: track {id} expired as {:?}",
                track.outlet()
            );
            expired.recorded.push(track);
        }
        expired
    }

    /// Greedy step for one detection: the nearest gated track absorbs it.
    ///
    /// Returns the matched id, or `None` when no track passes the gates.
    pub fn associate(&mut self, detection: &Detection) -> Option<u32> {
        let id = nearest_track(&self.alive, detection, self.config.max_centroid_distance)?;
        let track = self.alive.get_mut(&id)?;
        track.absorb(detection);
        Some(id)
    }

    /// Promotes `detection` to a new track under the next id.
    pub fn create(&mut self, detection: &Detection) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.alive.insert(id, TrackedObject::new(id, detection));
        log::trace!(
            "Frame {}: created track {id} at ({}, {})",
            detection.frame,
            detection.bbox.x,
            detection.bbox.y
        );
        id
    }

    /// Classifies and returns every alive track, ascending by id.
    pub fn flush(&mut self) -> Vec<TrackedObject> {
        let height = self.frame_height;
        std::mem::take(&mut self.alive)
            .into_values()
            .map(|mut track| {
                track.classify(height);
                track
            })
            .collect()
    }

    fn match_or_create(&mut self, detection: &Detection) -> u32 {
        match self.associate(detection) {
            Some(id) => id,
            None => self.create(detection),
        }
    }

    fn assign_optimal(&mut self, detections: &[Detection]) -> Vec<u32> {
        let ids: Vec<u32> = self.alive.keys().copied().collect();
        let boxes: Vec<BoundingBox> = self.alive.values().map(TrackedObject::bbox).collect();
        let matches = min_cost_matching(&boxes, detections, self.config.max_centroid_distance);

        let mut assigned: Vec<Option<u32>> = vec![None; detections.len()];
        for m in matches {
            let id = ids[m.track_idx];
            if let Some(track) = self.alive.get_mut(&id) {
                track.absorb(&detections[m.detection_idx]);
                assigned[m.detection_idx] = Some(id);
            }
        }

        detections
            .iter()
            .zip(assigned)
            .map(|(detection, id)| match id {
                Some(id) => id,
                None => self.create(detection),
            })
            .collect()
    }
}
