//! Pointwise comparison against a reference timeline.

use serde::{Deserialize, Serialize};

use fsgen_script_model::FunscriptAction;

use crate::sample_at;

/// Resampling step for the common time base.
const RESAMPLE_STEP_MS: u64 = 100;

/// Pointwise deviation between a generated and a reference timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationStats {
    /// Number of resampled comparison points.
    pub sample_count: usize,

    /// Mean absolute position difference.
    pub mean_abs_dev: f64,

    /// Maximum absolute position difference.
    pub max_abs_dev: f64,

    /// Pearson correlation of the two resampled series; zero when either
    /// side has no variance.
    pub correlation: f64,
}

/// Resample both timelines onto a common time base and compare pointwise.
///
/// Returns `None` when the overlap is too small to compare (fewer than two
/// shared sample points).
pub fn compare_timelines(
    generated: &[FunscriptAction],
    reference: &[FunscriptAction],
) -> Option<DeviationStats> {
    if generated.is_empty() || reference.is_empty() {
        return None;
    }

    let start = generated[0].at.max(reference[0].at);
    let end = generated.last()?.at.min(reference.last()?.at);
    if end <= start {
        return None;
    }

    let mut ours = Vec::new();
    let mut theirs = Vec::new();
    let mut t = start;
    while t <= end {
        if let (Some(a), Some(b)) = (sample_at(generated, t), sample_at(reference, t)) {
            ours.push(a);
            theirs.push(b);
        }
        t += RESAMPLE_STEP_MS;
    }
    if ours.len() < 2 {
        return None;
    }

    let mut abs_sum = 0.0;
    let mut abs_max = 0.0f64;
    for (a, b) in ours.iter().zip(&theirs) {
        let dev = (a - b).abs();
        abs_sum += dev;
        abs_max = abs_max.max(dev);
    }

    Some(DeviationStats {
        sample_count: ours.len(),
        mean_abs_dev: abs_sum / ours.len() as f64,
        max_abs_dev: abs_max,
        correlation: pearson(&ours, &theirs),
    })
}

/// Pearson correlation coefficient; zero if either series is constant.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a <= f64::EPSILON || var_b <= f64::EPSILON {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(pairs: &[(u64, i32)]) -> Vec<FunscriptAction> {
        pairs
            .iter()
            .map(|&(at, pos)| FunscriptAction { at, pos })
            .collect()
    }

    #[test]
    fn test_identical_timelines_have_zero_deviation() {
        let series = actions(&[(0, 0), (1000, 100), (2000, 0)]);
        let stats = compare_timelines(&series, &series).unwrap();
        assert_eq!(stats.mean_abs_dev, 0.0);
        assert_eq!(stats.max_abs_dev, 0.0);
        assert!((stats.correlation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_offset_shows_in_mean() {
        let ours = actions(&[(0, 10), (1000, 10)]);
        let theirs = actions(&[(0, 30), (1000, 30)]);
        let stats = compare_timelines(&ours, &theirs).unwrap();
        assert!((stats.mean_abs_dev - 20.0).abs() < 1e-9);
        assert!((stats.max_abs_dev - 20.0).abs() < 1e-9);
        // Both series constant: correlation undefined, reported as zero.
        assert_eq!(stats.correlation, 0.0);
    }

    #[test]
    fn test_inverted_motion_has_negative_correlation() {
        let ours = actions(&[(0, 0), (1000, 100), (2000, 0)]);
        let theirs = actions(&[(0, 100), (1000, 0), (2000, 100)]);
        let stats = compare_timelines(&ours, &theirs).unwrap();
        assert!(stats.correlation < -0.9);
    }

    #[test]
    fn test_disjoint_ranges_are_not_comparable() {
        let ours = actions(&[(0, 0), (1000, 100)]);
        let theirs = actions(&[(5000, 0), (6000, 100)]);
        assert!(compare_timelines(&ours, &theirs).is_none());
    }

    #[test]
    fn test_empty_reference_is_not_comparable() {
        let ours = actions(&[(0, 0), (1000, 100)]);
        assert!(compare_timelines(&ours, &[]).is_none());
    }
}
