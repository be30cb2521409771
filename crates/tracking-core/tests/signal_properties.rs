use fsgen_script_model::{RawSignalPoint, ScriptTunables};
use fsgen_tracking_core::postprocess::{simplify, SignalPostProcessor};
use proptest::prelude::*;

/// Strategy: a sparse raw series with strictly increasing frames and
/// arbitrary (even out-of-range) distances.
fn raw_series() -> impl Strategy<Value = Vec<RawSignalPoint>> {
    prop::collection::vec((1u64..20, -20i32..130), 0..40).prop_map(|steps| {
        let mut frame = 0u64;
        steps
            .into_iter()
            .map(|(gap, distance)| {
                frame += gap;
                RawSignalPoint { frame, distance }
            })
            .collect()
    })
}

fn tunables() -> impl Strategy<Value = ScriptTunables> {
    (
        any::<bool>(),
        0u32..=20,
        0u32..=20,
        any::<bool>(),
        0i32..=15,
        80i32..=100,
        any::<bool>(),
        2.0f64..=10.0,
        prop_oneof![Just(5i32), Just(10i32)],
    )
        .prop_map(
            |(boost, up, down, threshold, low, high, simp, factor, unit)| ScriptTunables {
                boost_enabled: boost,
                boost_up_percent: up,
                boost_down_percent: down,
                threshold_enabled: threshold,
                threshold_low: low,
                threshold_high: high,
                simplification_enabled: simp,
                simplification_factor: factor,
                rounding_unit: unit,
            },
        )
}

proptest! {
    /// Every exported position is in [0, 100], whatever the input.
    #[test]
    fn positions_always_within_range(points in raw_series(), t in tunables()) {
        let processor = SignalPostProcessor::new(t);
        for point in processor.process(&points) {
            prop_assert!((0..=100).contains(&point.distance));
        }
    }

    /// Simplifying an already-simplified series changes nothing.
    #[test]
    fn simplification_is_idempotent(points in raw_series(), factor in 2.0f64..=10.0) {
        let once = simplify(&points, factor);
        let twice = simplify(&once, factor);
        prop_assert_eq!(once, twice);
    }

    /// The first and last raw points survive the whole chain.
    #[test]
    fn endpoints_survive_processing(points in raw_series(), t in tunables()) {
        let processor = SignalPostProcessor::new(t);
        let output = processor.process(&points);
        prop_assert_eq!(output.len().min(2), points.len().min(2));
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            prop_assert_eq!(output.first().map(|p| p.frame), Some(first.frame));
            prop_assert_eq!(output.last().map(|p| p.frame), Some(last.frame));
        }
    }

    /// Frame indices stay strictly increasing through the chain.
    #[test]
    fn frames_stay_strictly_increasing(points in raw_series(), t in tunables()) {
        let processor = SignalPostProcessor::new(t);
        let output = processor.process(&points);
        for pair in output.windows(2) {
            prop_assert!(pair[0].frame < pair[1].frame);
        }
    }
}
