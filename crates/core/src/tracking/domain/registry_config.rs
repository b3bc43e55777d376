use serde::{Deserialize, Serialize};

/// How a frame's detections are paired with alive tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingStrategy {
    /// Each detection, in order, takes the nearest gated track.
    #[default]
    Greedy,
    /// Minimum total distance over all gated pairs; each track at most once.
    Optimal,
}

/// What happens to a track whose timeout elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Every expiring track is classified and recorded.
    #[default]
    RecordAll,
    /// Tracks re-matched fewer than `min_frames_tracked` times are discarded
    /// on timeout. The end-of-sequence flush still records them.
    DropUnconfirmed { min_frames_tracked: u32 },
}

/// Association and expiry parameters of a [`TrackRegistry`](super::track_registry::TrackRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Exclusive upper bound on centroid distance for a match.
    pub max_centroid_distance: u32,
    /// Frames a track may go unmatched before it expires.
    pub timeout: u32,
    pub matching: MatchingStrategy,
    pub expiry: ExpiryPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_centroid_distance: crate::shared::constants::DEFAULT_MAX_CENTROID_DISTANCE,
            timeout: crate::shared::constants::DEFAULT_TIMEOUT,
            matching: MatchingStrategy::Greedy,
            expiry: ExpiryPolicy::RecordAll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_json() {
        assert_eq!(serde_json::to_string(&MatchingStrategy::Optimal).unwrap(), "\"optimal\"");
        assert_eq!(
            serde_json::from_str::<MatchingStrategy>("\"greedy\"").unwrap(),
            MatchingStrategy::Greedy
        );
    }

    #[test]
    fn test_expiry_json_is_tagged() {
        assert_eq!(
            serde_json::to_string(&ExpiryPolicy::RecordAll).unwrap(),
            r#"{"policy":"record_all"}"#
        );
        assert_eq!(
            serde_json::to_string(&ExpiryPolicy::DropUnconfirmed {
                min_frames_tracked: 5
            })
            .unwrap(),
            r#"{"policy":"drop_unconfirmed","min_frames_tracked":5}"#
        );
    }

    #[test]
    fn test_default_registry_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_centroid_distance, 70);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.matching, MatchingStrategy::Greedy);
        assert_eq!(config.expiry, ExpiryPolicy::RecordAll);
    }
}
