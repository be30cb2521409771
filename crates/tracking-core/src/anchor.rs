//! Anchor hysteresis: the locked reference box and its state machine.
//!
//! The anchor is the spatial reference every tracked part measures against.
//! Its lifecycle is an explicit state machine driven by a pure transition
//! function, so the hysteresis is testable without any video or image data:
//!
//! `Init → Searching → Locked ⇄ LockedOccluded → Lost`
//!
//! Promotion to `Locked` requires consecutive qualifying detections; a
//! locked anchor survives brief occlusion by holding its last smoothed
//! position, and is declared lost only once misses exceed the occlusion
//! budget — never on the first miss.

use fsgen_script_model::BoundingBox;

/// Lifecycle phase of the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorPhase {
    /// No anchor candidate seen yet.
    #[default]
    Init,
    /// Candidate seen but not yet confirmed.
    Searching,
    /// Anchor confirmed; box updated every redetection.
    Locked,
    /// Anchor missed but within the occlusion budget; box held.
    LockedOccluded,
    /// Occlusion budget exceeded; box cleared, must reacquire.
    Lost,
}

/// What the current frame showed for the anchor class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorObservation {
    /// Detection with confidence at or above the floor.
    Qualifying,
    /// Detection present but below the confidence floor.
    BelowFloor,
    /// No detection of the anchor class this frame.
    Absent,
}

/// Hysteresis parameters for the anchor machine.
#[derive(Debug, Clone, Copy)]
pub struct HysteresisParams {
    /// Consecutive qualifying detections required for promotion to Locked.
    pub promotion_frames: u32,

    /// Consecutive misses tolerated while locked before the anchor is lost.
    pub occlusion_budget: u32,
}

impl Default for HysteresisParams {
    fn default() -> Self {
        Self {
            promotion_frames: 2,
            occlusion_budget: 30,
        }
    }
}

/// Pure transition function of the anchor machine.
///
/// `hits` and `misses` are the consecutive-run counters *after* this frame's
/// observation has been folded in. Sub-floor detections count as misses.
pub fn transition(
    phase: AnchorPhase,
    observation: AnchorObservation,
    hits: u32,
    misses: u32,
    params: &HysteresisParams,
) -> AnchorPhase {
    let seen = observation == AnchorObservation::Qualifying;
    match phase {
        AnchorPhase::Init => {
            if seen {
                AnchorPhase::Searching
            } else {
                AnchorPhase::Init
            }
        }
        AnchorPhase::Searching => {
            if seen && hits >= params.promotion_frames {
                AnchorPhase::Locked
            } else {
                AnchorPhase::Searching
            }
        }
        AnchorPhase::Locked => {
            if seen {
                AnchorPhase::Locked
            } else {
                AnchorPhase::LockedOccluded
            }
        }
        AnchorPhase::LockedOccluded => {
            if seen {
                AnchorPhase::Locked
            } else if misses > params.occlusion_budget {
                AnchorPhase::Lost
            } else {
                AnchorPhase::LockedOccluded
            }
        }
        AnchorPhase::Lost => {
            if seen {
                AnchorPhase::Searching
            } else {
                AnchorPhase::Lost
            }
        }
    }
}

/// EMA-smoothed box coordinates.
#[derive(Debug, Clone, Copy)]
struct SmoothedBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl SmoothedBox {
    fn from_bbox(bbox: &BoundingBox) -> Self {
        Self {
            x1: bbox.x1 as f64,
            y1: bbox.y1 as f64,
            x2: bbox.x2 as f64,
            y2: bbox.y2 as f64,
        }
    }

    /// `smoothed = alpha * new + (1 - alpha) * previous`.
    fn update(&mut self, bbox: &BoundingBox, alpha: f64) {
        self.x1 = alpha * bbox.x1 as f64 + (1.0 - alpha) * self.x1;
        self.y1 = alpha * bbox.y1 as f64 + (1.0 - alpha) * self.y1;
        self.x2 = alpha * bbox.x2 as f64 + (1.0 - alpha) * self.x2;
        self.y2 = alpha * bbox.y2 as f64 + (1.0 - alpha) * self.y2;
    }

    fn centroid(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }
}

/// The tracker's stabilized reference object for one segment.
///
/// Wraps the state machine with the smoothed box it governs: the box is
/// updated on redetection, held at its last smoothed position through
/// occlusion, and cleared only on `Lost`.
#[derive(Debug, Clone)]
pub struct AnchorTracker {
    phase: AnchorPhase,
    consecutive_hits: u32,
    consecutive_misses: u32,
    smoothed: Option<SmoothedBox>,
    frames_since_seen: u32,
    params: HysteresisParams,
    ema_alpha: f64,
}

impl AnchorTracker {
    pub fn new(params: HysteresisParams, ema_alpha: f64) -> Self {
        Self {
            phase: AnchorPhase::Init,
            consecutive_hits: 0,
            consecutive_misses: 0,
            smoothed: None,
            frames_since_seen: 0,
            params,
            ema_alpha,
        }
    }

    /// Fold in this frame's anchor observation and return the new phase.
    pub fn observe(&mut self, detection: Option<(&BoundingBox, f32)>, floor: f32) -> AnchorPhase {
        let observation = match detection {
            Some((_, conf)) if conf >= floor => AnchorObservation::Qualifying,
            Some(_) => AnchorObservation::BelowFloor,
            None => AnchorObservation::Absent,
        };

        if observation == AnchorObservation::Qualifying {
            self.consecutive_hits += 1;
            self.consecutive_misses = 0;
            self.frames_since_seen = 0;
        } else {
            self.consecutive_misses += 1;
            self.consecutive_hits = 0;
            self.frames_since_seen = self.frames_since_seen.saturating_add(1);
        }

        let next = transition(
            self.phase,
            observation,
            self.consecutive_hits,
            self.consecutive_misses,
            &self.params,
        );

        if next != self.phase {
            tracing::debug!(from = ?self.phase, to = ?next, "anchor phase change");
        }

        match next {
            AnchorPhase::Locked => {
                if let Some((bbox, _)) = detection {
                    match &mut self.smoothed {
                        Some(s) => s.update(bbox, self.ema_alpha),
                        None => self.smoothed = Some(SmoothedBox::from_bbox(bbox)),
                    }
                }
            }
            AnchorPhase::LockedOccluded => {
                // Sticky tracking: hold the last smoothed position.
            }
            AnchorPhase::Lost | AnchorPhase::Init => {
                self.smoothed = None;
            }
            AnchorPhase::Searching => {}
        }

        self.phase = next;
        next
    }

    pub fn phase(&self) -> AnchorPhase {
        self.phase
    }

    /// Whether the anchor box is usable as a spatial reference.
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            AnchorPhase::Locked | AnchorPhase::LockedOccluded
        )
    }

    /// Smoothed box center, if active.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.is_active() {
            self.smoothed.map(|s| s.centroid())
        } else {
            None
        }
    }

    /// Smoothed box height, if active.
    pub fn height(&self) -> Option<f64> {
        if self.is_active() {
            self.smoothed.map(|s| s.height())
        } else {
            None
        }
    }

    pub fn frames_since_seen(&self) -> u32 {
        self.frames_since_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(100, 200, 140, 320)
    }

    fn qualifying(tracker: &mut AnchorTracker) -> AnchorPhase {
        let b = bbox();
        tracker.observe(Some((&b, 0.8)), 0.5)
    }

    fn absent(tracker: &mut AnchorTracker) -> AnchorPhase {
        tracker.observe(None, 0.5)
    }

    #[test]
    fn test_promotion_requires_two_consecutive_detections() {
        let mut tracker = AnchorTracker::new(HysteresisParams::default(), 0.3);
        assert_eq!(qualifying(&mut tracker), AnchorPhase::Searching);
        assert_eq!(qualifying(&mut tracker), AnchorPhase::Locked);
        assert!(tracker.is_active());
    }

    #[test]
    fn test_interrupted_run_does_not_promote() {
        let mut tracker = AnchorTracker::new(HysteresisParams::default(), 0.3);
        qualifying(&mut tracker);
        absent(&mut tracker);
        assert_eq!(qualifying(&mut tracker), AnchorPhase::Searching);
        assert_eq!(qualifying(&mut tracker), AnchorPhase::Locked);
    }

    #[test]
    fn test_below_floor_counts_as_miss() {
        let mut tracker = AnchorTracker::new(HysteresisParams::default(), 0.3);
        qualifying(&mut tracker);
        let b = bbox();
        assert_eq!(
            tracker.observe(Some((&b, 0.3)), 0.5),
            AnchorPhase::Searching
        );
        assert_eq!(qualifying(&mut tracker), AnchorPhase::Searching);
    }

    #[test]
    fn test_first_miss_is_occlusion_not_loss() {
        let mut tracker = AnchorTracker::new(HysteresisParams::default(), 0.3);
        qualifying(&mut tracker);
        qualifying(&mut tracker);
        assert_eq!(absent(&mut tracker), AnchorPhase::LockedOccluded);
        // Box is held through occlusion.
        assert!(tracker.is_active());
        assert!(tracker.centroid().is_some());
    }

    #[test]
    fn test_lost_only_after_budget_elapses() {
        let params = HysteresisParams {
            promotion_frames: 2,
            occlusion_budget: 5,
        };
        let mut tracker = AnchorTracker::new(params, 0.3);
        qualifying(&mut tracker);
        qualifying(&mut tracker);

        for _ in 0..5 {
            assert_eq!(absent(&mut tracker), AnchorPhase::LockedOccluded);
        }
        assert_eq!(absent(&mut tracker), AnchorPhase::Lost);
        assert!(!tracker.is_active());
        assert!(tracker.centroid().is_none());
    }

    #[test]
    fn test_reacquisition_goes_through_searching() {
        let params = HysteresisParams {
            promotion_frames: 2,
            occlusion_budget: 1,
        };
        let mut tracker = AnchorTracker::new(params, 0.3);
        qualifying(&mut tracker);
        qualifying(&mut tracker);
        absent(&mut tracker);
        absent(&mut tracker);
        assert_eq!(tracker.phase(), AnchorPhase::Lost);

        assert_eq!(qualifying(&mut tracker), AnchorPhase::Searching);
        assert_eq!(qualifying(&mut tracker), AnchorPhase::Locked);
    }

    #[test]
    fn test_ema_smoothing_dampens_jumps() {
        let mut tracker = AnchorTracker::new(HysteresisParams::default(), 0.3);
        let b = BoundingBox::new(0, 0, 10, 10);
        tracker.observe(Some((&b, 0.8)), 0.5);
        tracker.observe(Some((&b, 0.8)), 0.5);
        let (cx0, _) = tracker.centroid().unwrap();

        // A sudden 100px jump should move the smoothed box only partially.
        let jumped = BoundingBox::new(100, 0, 110, 10);
        tracker.observe(Some((&jumped, 0.8)), 0.5);
        let (cx1, _) = tracker.centroid().unwrap();
        assert!(cx1 > cx0);
        assert!(cx1 < 50.0, "EMA should dampen the jump, got {cx1}");
    }

    #[test]
    fn test_pure_transition_counters_reset_semantics() {
        let params = HysteresisParams::default();
        // Qualifying from Init starts a search regardless of counters.
        assert_eq!(
            transition(AnchorPhase::Init, AnchorObservation::Qualifying, 1, 0, &params),
            AnchorPhase::Searching
        );
        // Absent while lost stays lost.
        assert_eq!(
            transition(AnchorPhase::Lost, AnchorObservation::Absent, 0, 12, &params),
            AnchorPhase::Lost
        );
    }
}
