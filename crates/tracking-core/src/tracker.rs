//! The core tracking state machine.
//!
//! Consumes priority-ordered detections frame by frame and produces the
//! sparse raw distance series plus activity metadata. One `Tracker` covers
//! one segment (the run of frames between scene boundaries); the
//! `SegmentedTracker` wrapper replaces the tracker at each boundary while
//! carrying the previous distance forward as a seed so the exported signal
//! has no artificial discontinuity at the cut.

use std::collections::BTreeMap;

use fsgen_script_model::{ClassTable, DetectionRecord, RawSignalPoint, SceneBoundaries};

use crate::anchor::{AnchorPhase, AnchorTracker, HysteresisParams};

/// Tracking parameters.
///
/// The occlusion budget, part weighting, and activity heuristic are
/// empirical tunables; they are configuration here, not constants buried in
/// the logic.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Minimum confidence for a detection to qualify.
    pub confidence_floor: f32,

    /// Consecutive qualifying anchor detections required before locking.
    pub promotion_frames: u32,

    /// Consecutive anchor misses tolerated before the anchor is lost.
    pub occlusion_budget_frames: u32,

    /// EMA factor for anchor box smoothing; higher follows faster.
    pub ema_alpha: f64,

    /// Consecutive non-detections a part tolerates before its weight decays.
    pub part_tolerance_frames: u32,

    /// Geometric decay applied to a part's weight per frame past tolerance.
    pub weight_decay: f64,

    /// Weights below this contribute nothing to the aggregate.
    pub min_weight: f64,

    /// Detection-run length at which a part's recency factor saturates.
    pub streak_saturation: u32,

    /// Scale from area-normalized distance to the 0–100 signal range.
    pub distance_gain: f64,

    /// Blend factor toward the previous output distance (jitter control
    /// and cut continuity); 0 disables output smoothing.
    pub output_smoothing: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.5,
            promotion_frames: 2,
            occlusion_budget_frames: 30,
            ema_alpha: 0.3,
            part_tolerance_frames: 15,
            weight_decay: 0.75,
            min_weight: 0.05,
            streak_saturation: 5,
            distance_gain: 250.0,
            output_smoothing: 0.5,
        }
    }
}

impl TrackerConfig {
    fn hysteresis(&self) -> HysteresisParams {
        HysteresisParams {
            promotion_frames: self.promotion_frames,
            occlusion_budget: self.occlusion_budget_frames,
        }
    }
}

/// Source frame dimensions, used to normalize distances.
#[derive(Debug, Clone, Copy)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Normalization base: sqrt of the frame area, so distances are
    /// resolution-independent.
    fn distance_base(&self) -> f64 {
        ((self.width as f64) * (self.height as f64)).sqrt().max(1.0)
    }
}

/// Coarse relative position of the dominant part to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelativePosition {
    #[default]
    Unknown,
    Above,
    Level,
    Below,
}

/// Auxiliary activity metadata; not required for the numeric signal.
#[derive(Debug, Clone, Default)]
pub struct ActivityState {
    /// Whether the contact class is currently in a confirmed detection run.
    pub contact: bool,

    /// Position of the dominant part relative to the anchor box.
    pub position: RelativePosition,

    /// Human-readable justification for the label, for debug output.
    pub reason: String,
}

/// Per-part tracking state.
#[derive(Debug, Clone)]
pub struct TrackedPart {
    pub class_id: u32,
    pub name: String,
    pub last_position: Option<(f64, f64)>,
    pub consecutive_detections: u32,
    pub consecutive_non_detections: u32,
    pub distance_history: Vec<f64>,
    pub weight_history: Vec<f64>,
    last_distance: Option<f64>,
    current_weight: f64,
}

impl TrackedPart {
    /// The weight this part would contribute to the next aggregate.
    pub fn current_weight(&self) -> f64 {
        self.current_weight
    }

    fn new(class_id: u32, name: String) -> Self {
        Self {
            class_id,
            name,
            last_position: None,
            consecutive_detections: 0,
            consecutive_non_detections: 0,
            distance_history: Vec::new(),
            weight_history: Vec::new(),
            last_distance: None,
            current_weight: 0.0,
        }
    }
}

/// Result of processing one frame.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Emitted point, if at least one part carried weight this frame.
    pub point: Option<RawSignalPoint>,

    /// Activity metadata after this frame.
    pub activity: ActivityState,
}

/// Tracker for a single segment.
pub struct Tracker {
    config: TrackerConfig,
    classes: ClassTable,
    geometry: FrameGeometry,
    anchor: AnchorTracker,
    contact: AnchorTracker,
    parts: BTreeMap<u32, TrackedPart>,
    previous_distance: Option<i32>,
    activity: ActivityState,
}

impl Tracker {
    pub fn new(classes: ClassTable, config: TrackerConfig, geometry: FrameGeometry) -> Self {
        let hysteresis = config.hysteresis();
        let parts = classes
            .part_ids()
            .into_iter()
            .map(|id| (id, TrackedPart::new(id, classes.name_for(id).to_string())))
            .collect();
        Self {
            anchor: AnchorTracker::new(hysteresis, config.ema_alpha),
            contact: AnchorTracker::new(hysteresis, config.ema_alpha),
            parts,
            previous_distance: None,
            activity: ActivityState::default(),
            config,
            classes,
            geometry,
        }
    }

    /// Seed the output with the last distance of the previous segment.
    pub fn seed_previous_distance(&mut self, distance: Option<i32>) {
        self.previous_distance = distance;
    }

    /// The last emitted distance (the seed carried across scene cuts).
    pub fn previous_distance(&self) -> Option<i32> {
        self.previous_distance
    }

    pub fn activity(&self) -> &ActivityState {
        &self.activity
    }

    pub fn anchor_phase(&self) -> AnchorPhase {
        self.anchor.phase()
    }

    /// Per-part state, for debug logging and tests.
    pub fn part(&self, class_id: u32) -> Option<&TrackedPart> {
        self.parts.get(&class_id)
    }

    /// Process one frame's priority-ordered detections.
    ///
    /// Detections must already be sorted by class priority (the store's
    /// `boxes_for` output); the first record per class wins.
    pub fn process_frame(&mut self, frame: u64, detections: &[&DetectionRecord]) -> FrameOutput {
        let floor = self.config.confidence_floor;

        // First detection per class, in priority order.
        let mut best: BTreeMap<u32, &DetectionRecord> = BTreeMap::new();
        for &det in detections {
            best.entry(det.class_id).or_insert(det);
        }

        let anchor_det = self
            .classes
            .anchor_id()
            .and_then(|id| best.get(&id))
            .map(|d| (&d.bbox, d.confidence));
        self.anchor.observe(anchor_det, floor);

        let contact_det = self
            .classes
            .contact_id()
            .and_then(|id| best.get(&id))
            .map(|d| (&d.bbox, d.confidence));
        self.contact.observe(contact_det, floor);

        let anchor_centroid = self.anchor.centroid();
        let base = self.geometry.distance_base();

        for part in self.parts.values_mut() {
            match best.get(&part.class_id) {
                Some(det) if det.confidence >= floor => {
                    part.consecutive_detections += 1;
                    part.consecutive_non_detections = 0;
                    let centroid = det.bbox.centroid();
                    part.last_position = Some(centroid);

                    if let Some(anchor_at) = anchor_centroid {
                        let distance = normalized_distance(centroid, anchor_at, base)
                            * self.config.distance_gain;
                        let distance = distance.clamp(0.0, 100.0);
                        let streak = part
                            .consecutive_detections
                            .min(self.config.streak_saturation);
                        let recency = streak as f64 / self.config.streak_saturation as f64;
                        part.last_distance = Some(distance);
                        part.current_weight = det.confidence as f64 * recency;
                        part.distance_history.push(distance);
                        part.weight_history.push(part.current_weight);
                    } else {
                        // No spatial reference: fade the stale contribution
                        // instead of freezing the signal on the last value.
                        part.current_weight *= self.config.weight_decay;
                    }
                }
                _ => {
                    part.consecutive_non_detections += 1;
                    part.consecutive_detections = 0;
                    // Within tolerance the part holds its weight; past it the
                    // contribution decays toward zero instead of dropping.
                    if part.consecutive_non_detections > self.config.part_tolerance_frames {
                        part.current_weight *= self.config.weight_decay;
                    }
                }
            }
        }

        let point = self.aggregate(frame);
        self.activity = self.classify_activity();

        FrameOutput {
            point,
            activity: self.activity.clone(),
        }
    }

    /// Weighted mean of active parts' distances; `None` when no part
    /// carries weight this frame.
    fn aggregate(&mut self, frame: u64) -> Option<RawSignalPoint> {
        let mut weight_sum = 0.0;
        let mut weighted = 0.0;
        for part in self.parts.values() {
            if part.current_weight < self.config.min_weight {
                continue;
            }
            let Some(distance) = part.last_distance else {
                continue;
            };
            weight_sum += part.current_weight;
            weighted += part.current_weight * distance;
        }
        if weight_sum <= 0.0 {
            return None;
        }

        let raw = weighted / weight_sum;
        let smoothing = self.config.output_smoothing;
        let value = match self.previous_distance {
            Some(prev) if smoothing > 0.0 => {
                smoothing * prev as f64 + (1.0 - smoothing) * raw
            }
            _ => raw,
        };
        let distance = (value.round() as i32).clamp(0, 100);
        self.previous_distance = Some(distance);
        Some(RawSignalPoint { frame, distance })
    }

    /// Coarse activity label from anchor/part geometry.
    fn classify_activity(&self) -> ActivityState {
        if self.contact.is_active() {
            return ActivityState {
                contact: true,
                position: RelativePosition::Level,
                reason: "contact class in confirmed run".to_string(),
            };
        }

        let Some((_, anchor_y)) = self.anchor.centroid() else {
            return ActivityState {
                contact: false,
                position: RelativePosition::Unknown,
                reason: "no active anchor".to_string(),
            };
        };

        // Dominant part: the one carrying the most weight right now.
        let dominant = self
            .parts
            .values()
            .filter(|p| p.current_weight >= self.config.min_weight)
            .max_by(|a, b| a.current_weight.total_cmp(&b.current_weight));

        let Some(part) = dominant else {
            return ActivityState {
                contact: false,
                position: RelativePosition::Unknown,
                reason: "no part carries weight".to_string(),
            };
        };
        let Some((_, part_y)) = part.last_position else {
            return ActivityState {
                contact: false,
                position: RelativePosition::Unknown,
                reason: format!("{} has no position yet", part.name),
            };
        };

        let band = self.anchor.height().unwrap_or(0.0) / 2.0;
        let dy = part_y - anchor_y;
        let position = if dy < -band {
            RelativePosition::Above
        } else if dy > band {
            RelativePosition::Below
        } else {
            RelativePosition::Level
        };
        ActivityState {
            contact: false,
            position,
            reason: format!("dominant part {} at dy {:.0}px", part.name, dy),
        }
    }
}

fn normalized_distance(a: (f64, f64), b: (f64, f64), base: f64) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt() / base
}

/// Drives one `Tracker` per segment, resetting at scene boundaries while
/// carrying the previous distance seed across the cut.
pub struct SegmentedTracker {
    tracker: Tracker,
    boundaries: SceneBoundaries,
    classes: ClassTable,
    config: TrackerConfig,
    geometry: FrameGeometry,
}

impl SegmentedTracker {
    pub fn new(
        classes: ClassTable,
        config: TrackerConfig,
        geometry: FrameGeometry,
        boundaries: SceneBoundaries,
    ) -> Self {
        Self {
            tracker: Tracker::new(classes.clone(), config.clone(), geometry),
            boundaries,
            classes,
            config,
            geometry,
        }
    }

    /// Process one frame, replacing the tracker first if the frame is a
    /// scene boundary.
    pub fn process_frame(&mut self, frame: u64, detections: &[&DetectionRecord]) -> FrameOutput {
        if self.boundaries.contains(frame) {
            let seed = self.tracker.previous_distance();
            tracing::info!(frame, ?seed, "scene boundary: reinitializing tracker");
            self.tracker =
                Tracker::new(self.classes.clone(), self.config.clone(), self.geometry);
            self.tracker.seed_previous_distance(seed);
        }
        self.tracker.process_frame(frame, detections)
    }

    /// The active segment's tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}
