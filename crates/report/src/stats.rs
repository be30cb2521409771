//! Descriptive statistics of a generated timeline.

use serde::{Deserialize, Serialize};

use fsgen_script_model::FunscriptAction;

/// Summary of one timeline's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of actions.
    pub point_count: usize,

    /// Total duration covered, in milliseconds.
    pub duration_ms: u64,

    /// Smallest position value.
    pub min_pos: i32,

    /// Largest position value.
    pub max_pos: i32,

    /// Mean position value.
    pub mean_pos: f64,

    /// Longest gap between consecutive actions, in milliseconds.
    pub longest_gap_ms: u64,

    /// Position distribution: counts per decile bucket (0–9, 10–19, … 90–100).
    pub distribution: [usize; 10],
}

impl SummaryStats {
    fn empty() -> Self {
        Self {
            point_count: 0,
            duration_ms: 0,
            min_pos: 0,
            max_pos: 0,
            mean_pos: 0.0,
            longest_gap_ms: 0,
            distribution: [0; 10],
        }
    }
}

/// Compute descriptive statistics for a timeline.
pub fn summarize(actions: &[FunscriptAction]) -> SummaryStats {
    if actions.is_empty() {
        return SummaryStats::empty();
    }

    let mut min_pos = i32::MAX;
    let mut max_pos = i32::MIN;
    let mut sum = 0i64;
    let mut distribution = [0usize; 10];

    for action in actions {
        min_pos = min_pos.min(action.pos);
        max_pos = max_pos.max(action.pos);
        sum += action.pos as i64;
        let bucket = (action.pos.clamp(0, 100) as usize / 10).min(9);
        distribution[bucket] += 1;
    }

    let longest_gap_ms = actions
        .windows(2)
        .map(|pair| pair[1].at - pair[0].at)
        .max()
        .unwrap_or(0);

    SummaryStats {
        point_count: actions.len(),
        duration_ms: actions.last().map(|a| a.at).unwrap_or(0) - actions[0].at,
        min_pos,
        max_pos,
        mean_pos: sum as f64 / actions.len() as f64,
        longest_gap_ms,
        distribution,
    }
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
    fn test_summary_basics() {
        let stats = summarize(&actions(&[(0, 10), (200, 90), (1500, 50)]));
        assert_eq!(stats.point_count, 3);
        assert_eq!(stats.duration_ms, 1500);
        assert_eq!(stats.min_pos, 10);
        assert_eq!(stats.max_pos, 90);
        assert_eq!(stats.longest_gap_ms, 1300);
        assert!((stats.mean_pos - 50.0).abs() < 1e-9);
        assert_eq!(stats.distribution[1], 1);
        assert_eq!(stats.distribution[9], 1);
        assert_eq!(stats.distribution[5], 1);
    }

    #[test]
    fn test_summary_of_empty_timeline() {
        let stats = summarize(&[]);
        assert_eq!(stats.point_count, 0);
        assert_eq!(stats.longest_gap_ms, 0);
    }

    #[test]
    fn test_pos_100_lands_in_top_bucket() {
        let stats = summarize(&actions(&[(0, 100)]));
        assert_eq!(stats.distribution[9], 1);
    }
}
