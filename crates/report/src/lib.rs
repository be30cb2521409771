//! fsgen Report — timeline statistics and reference comparison.
//!
//! After a script is generated, this crate either compares it against a
//! reference timeline (resampled onto a common time base) or, when no
//! reference is available, emits descriptive statistics only. Reference
//! problems are never fatal: a missing or malformed reference degrades to
//! the statistics-only path with a warning.

use std::path::Path;

use serde::{Deserialize, Serialize};

use fsgen_script_model::{Funscript, FunscriptAction};

pub mod compare;
pub mod stats;

pub use compare::{compare_timelines, DeviationStats};
pub use stats::{summarize, SummaryStats};

/// Report emitted at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptReport {
    /// A reference was available and comparable.
    WithReference {
        summary: SummaryStats,
        deviation: DeviationStats,
    },
    /// No (usable) reference: descriptive statistics only.
    SummaryOnly { summary: SummaryStats },
}

impl ScriptReport {
    pub fn summary(&self) -> &SummaryStats {
        match self {
            Self::WithReference { summary, .. } => summary,
            Self::SummaryOnly { summary } => summary,
        }
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Build a report for a generated script, comparing against the reference
/// at `reference_path` when one is given and readable.
pub fn build_report(generated: &Funscript, reference_path: Option<&Path>) -> ScriptReport {
    let summary = summarize(&generated.actions);

    let Some(path) = reference_path else {
        return ScriptReport::SummaryOnly { summary };
    };

    let reference = match Funscript::load(path) {
        Ok(script) => script,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "reference unavailable, falling back to summary-only report"
            );
            return ScriptReport::SummaryOnly { summary };
        }
    };

    match compare_timelines(&generated.actions, &reference.actions) {
        Some(deviation) => ScriptReport::WithReference { summary, deviation },
        None => {
            tracing::warn!(
                path = %path.display(),
                "reference does not overlap the generated timeline, summary-only report"
            );
            ScriptReport::SummaryOnly { summary }
        }
    }
}

/// Sample a timeline at `t` milliseconds by linear interpolation.
///
/// Outside the covered range the nearest endpoint value is used.
pub(crate) fn sample_at(actions: &[FunscriptAction], t: u64) -> Option<f64> {
    if actions.is_empty() {
        return None;
    }
    if t <= actions[0].at {
        return Some(actions[0].pos as f64);
    }
    let last = actions.last().expect("non-empty");
    if t >= last.at {
        return Some(last.pos as f64);
    }

    let idx = actions
        .binary_search_by_key(&t, |a| a.at)
        .unwrap_or_else(|i| i - 1);
    let a = actions[idx];
    let b = actions[idx + 1];
    let span = (b.at - a.at) as f64;
    if span < 1.0 {
        return Some(a.pos as f64);
    }
    let frac = (t - a.at) as f64 / span;
    Some(a.pos as f64 + (b.pos - a.pos) as f64 * frac)
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
    fn test_sample_interpolates() {
        let series = actions(&[(0, 0), (1000, 100)]);
        assert_eq!(sample_at(&series, 500), Some(50.0));
        assert_eq!(sample_at(&series, 0), Some(0.0));
        assert_eq!(sample_at(&series, 2000), Some(100.0));
        assert_eq!(sample_at(&[], 10), None);
    }

    #[test]
    fn test_missing_reference_degrades_to_summary() {
        let mut script = Funscript::new();
        script.push_action(0, 10);
        script.push_action(500, 90);

        let report = build_report(&script, Some(Path::new("/nonexistent/ref.funscript")));
        assert!(matches!(report, ScriptReport::SummaryOnly { .. }));
        assert_eq!(report.summary().point_count, 2);
    }

    #[test]
    fn test_no_reference_is_summary_only() {
        let script = Funscript::new();
        let report = build_report(&script, None);
        assert!(matches!(report, ScriptReport::SummaryOnly { .. }));
    }
}
