//! Progress events for the control layer.
//!
//! The pipeline runs on a background worker; the interactive surface stays
//! responsive by receiving `(percent, stage)` events instead of blocking.

/// Stages of a single video run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadDetections,
    Tracking,
    PostProcessing,
    Reporting,
    Complete,
    Failed,
}

impl Stage {
    /// Stable identifier for logs and UIs.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::LoadDetections => "load-detections",
            Stage::Tracking => "tracking",
            Stage::PostProcessing => "post-processing",
            Stage::Reporting => "reporting",
            Stage::Complete => "complete",
            Stage::Failed => "failed",
        }
    }
}

/// One progress report.
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    /// Completion of the current stage, `[0.0, 100.0]`.
    pub percent: f64,

    /// The stage the pipeline is in.
    pub stage: Stage,
}

/// Progress callback supplied by the control layer.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send>;
