//! Signal post-processing: boost, threshold remap, simplification, rounding.
//!
//! Pure transforms over the raw distance series, applied in a fixed order.
//! Every step degrades gracefully on degenerate input (empty or single-point
//! series pass through), and the first and last points always survive.

use fsgen_common::clock::FrameClock;
use fsgen_script_model::{FunscriptAction, RawSignalPoint, ScriptTunables};

/// Applies the configured post-processing chain to a raw series.
pub struct SignalPostProcessor {
    tunables: ScriptTunables,
}

impl SignalPostProcessor {
    pub fn new(tunables: ScriptTunables) -> Self {
        Self { tunables }
    }

    /// Run the full chain: boost → threshold remap → simplification →
    /// rounding. Output stays in the frame domain.
    pub fn process(&self, points: &[RawSignalPoint]) -> Vec<RawSignalPoint> {
        let t = &self.tunables;
        let mut series = points.to_vec();
        if t.boost_enabled {
            series = boost(&series, t.boost_up_percent, t.boost_down_percent);
        }
        if t.threshold_enabled {
            series = threshold_remap(&series, t.threshold_low, t.threshold_high);
        }
        if t.simplification_enabled {
            series = simplify(&series, t.simplification_factor);
        }
        round_positions(&mut series, t.rounding_unit);
        series
    }

    /// Convert a processed series to timeline actions at the given fps.
    pub fn to_actions(points: &[RawSignalPoint], clock: &FrameClock) -> Vec<FunscriptAction> {
        let mut actions: Vec<FunscriptAction> = Vec::with_capacity(points.len());
        for point in points {
            let at = clock.frame_to_ms(point.frame);
            // Sub-millisecond frame spacing would collide; keep the first.
            if actions.last().is_some_and(|a| at <= a.at) {
                continue;
            }
            actions.push(FunscriptAction {
                at,
                pos: point.distance.clamp(0, 100),
            });
        }
        actions
    }
}

/// Amplify frame-to-frame deltas: positive deltas scale by
/// `1 + up/100`, negative by `1 + down/100`, re-accumulated from the first
/// value and re-clamped into the working range.
pub fn boost(points: &[RawSignalPoint], up_percent: u32, down_percent: u32) -> Vec<RawSignalPoint> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let up = 1.0 + up_percent as f64 / 100.0;
    let down = 1.0 + down_percent as f64 / 100.0;

    let mut boosted = Vec::with_capacity(points.len());
    boosted.push(points[0]);
    let mut level = points[0].distance as f64;

    for pair in points.windows(2) {
        let delta = (pair[1].distance - pair[0].distance) as f64;
        let scaled = if delta > 0.0 { delta * up } else { delta * down };
        level = (level + scaled).clamp(0.0, 100.0);
        boosted.push(RawSignalPoint {
            frame: pair[1].frame,
            distance: level.round() as i32,
        });
    }
    boosted
}

/// Remap the dynamic range: values at or below `low` map to 0, at or above
/// `high` map to 100, linear in between.
pub fn threshold_remap(points: &[RawSignalPoint], low: i32, high: i32) -> Vec<RawSignalPoint> {
    if high <= low {
        return points.to_vec();
    }
    let span = (high - low) as f64;
    points
        .iter()
        .map(|p| {
            let distance = if p.distance <= low {
                0
            } else if p.distance >= high {
                100
            } else {
                (((p.distance - low) as f64 / span) * 100.0).round() as i32
            };
            RawSignalPoint {
                frame: p.frame,
                distance,
            }
        })
        .collect()
}

/// Visvalingam–Whyatt point reduction.
///
/// Repeatedly removes the interior point with the smallest effective
/// triangle area until every remaining candidate's area reaches the
/// tolerance. Points where the motion changes direction (local peaks and
/// valleys) are never removed, and the endpoints always survive, so the
/// pass is idempotent at a fixed tolerance.
pub fn simplify(points: &[RawSignalPoint], tolerance: f64) -> Vec<RawSignalPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut kept: Vec<RawSignalPoint> = points.to_vec();

    loop {
        let mut min_area = f64::INFINITY;
        let mut min_index = None;

        for i in 1..kept.len() - 1 {
            if is_direction_change(&kept[i - 1], &kept[i], &kept[i + 1]) {
                continue;
            }
            let area = triangle_area(&kept[i - 1], &kept[i], &kept[i + 1]);
            if area < min_area {
                min_area = area;
                min_index = Some(i);
            }
        }

        match min_index {
            Some(i) if min_area < tolerance => {
                kept.remove(i);
            }
            _ => break,
        }
    }

    kept
}

/// Quantize positions to the nearest multiple of `unit` after clamping.
pub fn round_positions(points: &mut [RawSignalPoint], unit: i32) {
    if unit <= 0 {
        return;
    }
    for point in points {
        let clamped = point.distance.clamp(0, 100) as f64;
        point.distance = ((clamped / unit as f64).round() as i32 * unit).clamp(0, 100);
    }
}

/// Effective area of the triangle spanned in (frame, distance) space.
fn triangle_area(a: &RawSignalPoint, b: &RawSignalPoint, c: &RawSignalPoint) -> f64 {
    let (ax, ay) = (a.frame as f64, a.distance as f64);
    let (bx, by) = (b.frame as f64, b.distance as f64);
    let (cx, cy) = (c.frame as f64, c.distance as f64);
    ((ax * (by - cy) + bx * (cy - ay) + cx * (ay - by)) / 2.0).abs()
}

/// Whether dropping `b` would change the direction of motion at that point.
fn is_direction_change(a: &RawSignalPoint, b: &RawSignalPoint, c: &RawSignalPoint) -> bool {
    let before = b.distance - a.distance;
    let after = c.distance - b.distance;
    (before > 0 && after < 0) || (before < 0 && after > 0)
}
