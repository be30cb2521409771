//! Raw signal intermediate: the sparse per-frame distance series.
//!
//! The tracker emits at most one point per frame; frames without detection
//! support produce no point. Persisted as a JSON list of `[frame, distance]`
//! pairs so a run can be re-post-processed without re-tracking.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// One point of the raw distance series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u64, i32)", into = "(u64, i32)")]
pub struct RawSignalPoint {
    /// Frame index the distance was computed at.
    pub frame: u64,

    /// Aggregated distance value, clamped to `[0, 100]`.
    pub distance: i32,
}

impl From<(u64, i32)> for RawSignalPoint {
    fn from((frame, distance): (u64, i32)) -> Self {
        Self { frame, distance }
    }
}

impl From<RawSignalPoint> for (u64, i32) {
    fn from(p: RawSignalPoint) -> Self {
        (p.frame, p.distance)
    }
}

/// Scene boundaries: frame indices at which the tracker must reset.
///
/// Supplied by an external scene-change detector; may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneBoundaries(BTreeSet<u64>);

impl SceneBoundaries {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: impl IntoIterator<Item = u64>) -> Self {
        Self(frames.into_iter().collect())
    }

    /// Parse from a JSON array of frame indices.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn contains(&self, frame: u64) -> bool {
        self.0.contains(&frame)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }
}

/// Parse a raw signal document, enforcing strictly increasing frame indices.
pub fn parse_raw_signal(json: &str) -> Result<Vec<RawSignalPoint>, ModelError> {
    let points: Vec<RawSignalPoint> = serde_json::from_str(json)?;
    for pair in points.windows(2) {
        if pair[1].frame <= pair[0].frame {
            return Err(ModelError::invalid(format!(
                "raw signal frames not strictly increasing at frame {}",
                pair[1].frame
            )));
        }
    }
    Ok(points)
}

/// Serialize a raw signal series to its interchange document.
pub fn raw_signal_to_json(points: &[RawSignalPoint]) -> Result<String, ModelError> {
    Ok(serde_json::to_string(points)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_round_trip() {
        let json = "[[0,10],[5,80],[10,15]]";
        let points = parse_raw_signal(json).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], RawSignalPoint::from((5, 80)));
        assert_eq!(raw_signal_to_json(&points).unwrap(), json);
    }

    #[test]
    fn test_non_increasing_frames_rejected() {
        assert!(parse_raw_signal("[[5,10],[5,20]]").is_err());
        assert!(parse_raw_signal("[[5,10],[4,20]]").is_err());
    }

    #[test]
    fn test_scene_boundaries_membership() {
        let cuts = SceneBoundaries::from_frames([500, 900]);
        assert!(cuts.contains(500));
        assert!(!cuts.contains(501));
        assert_eq!(cuts.len(), 2);
        assert!(SceneBoundaries::empty().is_empty());
    }

    #[test]
    fn test_scene_boundaries_json() {
        let cuts = SceneBoundaries::from_json("[120, 500]").unwrap();
        assert!(cuts.contains(120));
        let json = serde_json::to_string(&cuts).unwrap();
        assert_eq!(json, "[120,500]");
    }
}
