//! Sequential batch processing.
//!
//! One file fully completes (or is cancelled) before the next begins. A
//! failure on one file is recorded and processing continues with the next;
//! errors never propagate across batch entries.

use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::progress::ProgressCallback;
use crate::run::{run_video, RunContext, RunParams, RunStatus, VideoMeta};

/// Outcome of one batch entry.
#[derive(Debug, Clone)]
pub enum FileStatus {
    Completed { actions: usize },
    Cancelled,
    Failed { error: String },
}

/// One processed (or attempted) video.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub video: PathBuf,
    pub status: FileStatus,
}

/// Results of a whole batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, FileStatus::Completed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, FileStatus::Failed { .. }))
            .count()
    }

    pub fn was_cancelled(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, FileStatus::Cancelled))
    }
}

/// Process a queue of videos strictly sequentially.
///
/// `on_file` is invoked before each file starts, with its index and the
/// queue length; it may hand back a progress callback for that file. The
/// shared token cancels after the current file's frame boundary; remaining
/// files are not attempted.
pub fn run_batch(
    videos: Vec<VideoMeta>,
    params: &RunParams,
    cancel: CancelToken,
    on_file: impl Fn(usize, usize, &Path) -> Option<ProgressCallback>,
) -> BatchReport {
    let total = videos.len();
    let mut report = BatchReport::default();

    for (index, meta) in videos.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!("batch stopped before remaining {} file(s)", total - index);
            break;
        }

        let progress = on_file(index, total, &meta.path);
        let video = meta.path.clone();
        tracing::info!(video = %video.display(), "batch entry {}/{}", index + 1, total);

        let mut ctx = RunContext::new(meta, params.clone()).with_cancel(cancel.clone());
        if let Some(cb) = progress {
            ctx = ctx.with_progress(cb);
        }
        let status = match run_video(&ctx) {
            Ok(outcome) if outcome.status == RunStatus::Cancelled => FileStatus::Cancelled,
            Ok(outcome) => FileStatus::Completed {
                actions: outcome.action_count,
            },
            Err(e) => {
                // Local to this video; the queue continues.
                tracing::error!(video = %video.display(), error = %e, "batch entry failed");
                FileStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        let cancelled = matches!(status, FileStatus::Cancelled);
        report.entries.push(BatchEntry { video, status });
        if cancelled {
            break;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(path: &str) -> VideoMeta {
        VideoMeta {
            path: PathBuf::from(path),
            fps: 30.0,
            width: 1920,
            height: 1080,
        }
    }

    #[test]
    fn test_missing_inputs_do_not_abort_the_queue() {
        // Neither file has a detections sidecar: both fail, both recorded.
        let report = run_batch(
            vec![meta("/nonexistent/a.mp4"), meta("/nonexistent/b.mp4")],
            &RunParams::default(),
            CancelToken::new(),
            |_, _, _| None,
        );
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.completed(), 0);
    }

    #[test]
    fn test_pre_cancelled_batch_processes_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = run_batch(
            vec![meta("/nonexistent/a.mp4")],
            &RunParams::default(),
            cancel,
            |_, _, _| None,
        );
        assert!(report.entries.is_empty());
    }
}
