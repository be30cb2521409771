//! Per-video run orchestration.
//!
//! A `RunContext` is created per video and carries everything the run
//! needs: video metadata, validated tunables, tracker configuration, the
//! cancellation token, and the progress sink. No state survives across
//! runs.

use std::path::{Path, PathBuf};

use fsgen_common::clock::FrameClock;
use fsgen_common::error::{FsgenError, FsgenResult};
use fsgen_report::ScriptReport;
use fsgen_script_model::{
    parse_raw_signal, raw_signal_to_json, ClassTable, Funscript, RawSignalPoint, ScriptTunables,
};
use fsgen_tracking_core::tracker::{FrameGeometry, SegmentedTracker};
use fsgen_tracking_core::{DetectionStore, SignalPostProcessor, TrackerConfig};

use crate::cancel::CancelToken;
use crate::progress::{ProgressCallback, ProgressEvent, Stage};
use crate::source::{
    backup_existing, load_scene_boundaries, sidecar_path, DetectionSource, JsonDetectionSource,
};

/// Metadata of the video being processed.
///
/// The pipeline never decodes the video; frame rate and dimensions come
/// from the caller (probe output or configuration defaults).
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub path: PathBuf,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

/// Parameters of one run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub tunables: ScriptTunables,
    pub tracker: TrackerConfig,
    pub classes: ClassTable,

    /// Optional reference timeline to compare against.
    pub reference: Option<PathBuf>,

    /// Explicit output path; defaults to `<stem>.funscript` next to the video.
    pub output: Option<PathBuf>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            tunables: ScriptTunables::default(),
            tracker: TrackerConfig::default(),
            classes: ClassTable::default(),
            reference: None,
            output: None,
        }
    }
}

/// Everything a single run owns.
pub struct RunContext {
    pub meta: VideoMeta,
    pub params: RunParams,
    pub cancel: CancelToken,
    progress: Option<ProgressCallback>,
}

impl RunContext {
    pub fn new(meta: VideoMeta, params: RunParams) -> Self {
        Self {
            meta,
            params,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    fn emit(&self, percent: f64, stage: Stage) {
        if let Some(cb) = &self.progress {
            cb(ProgressEvent { percent, stage });
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Cooperatively stopped; the output prefix was kept.
    Cancelled,
}

/// What a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub raw_points: Vec<RawSignalPoint>,
    pub action_count: usize,
    pub script_path: PathBuf,
    pub raw_signal_path: PathBuf,
    pub report_path: PathBuf,
    pub report: ScriptReport,
}

/// Run the full pipeline for one video: load detections, track, post-process,
/// export, report.
pub fn run_video(ctx: &RunContext) -> FsgenResult<RunOutcome> {
    ctx.params
        .tunables
        .validate()
        .map_err(|e| FsgenError::config(e.to_string()))?;

    let video = &ctx.meta.path;
    tracing::info!(video = %video.display(), fps = ctx.meta.fps, "starting run");

    ctx.emit(0.0, Stage::LoadDetections);
    let mut source = JsonDetectionSource::for_video(video);
    let records = source.detections(&ctx.params.classes)?;
    tracing::info!(count = records.len(), "loaded detection records");

    let store = DetectionStore::from_records(records, ctx.params.classes.clone());
    let boundaries = load_scene_boundaries(video);

    let clock = FrameClock::new(ctx.meta.fps);
    let geometry = FrameGeometry::new(ctx.meta.width, ctx.meta.height);

    let frames = store.frames_with_data();
    let (start, end) = match (frames.first(), frames.last()) {
        (Some(_), Some(&end)) => (
            find_start_frame(&store, &ctx.params.tracker, &clock),
            end,
        ),
        _ => {
            // An empty detection document is not an error; the run just
            // produces an empty script.
            tracing::warn!(video = %video.display(), "no detections, emitting empty output");
            (0, 0)
        }
    };

    let mut tracker = SegmentedTracker::new(
        ctx.params.classes.clone(),
        ctx.params.tracker.clone(),
        geometry,
        boundaries,
    );

    let mut raw_points: Vec<RawSignalPoint> = Vec::new();
    let mut status = RunStatus::Completed;
    let total = (end - start + 1) as f64;

    for frame in start..=end {
        if ctx.cancel.is_cancelled() {
            tracing::info!(frame, "cancellation requested, stopping at frame boundary");
            status = RunStatus::Cancelled;
            break;
        }

        let boxes = store.boxes_for(frame);
        let output = tracker.process_frame(frame, &boxes);
        if let Some(point) = output.point {
            raw_points.push(point);
        }

        ctx.emit(((frame - start) as f64 / total) * 100.0, Stage::Tracking);
    }

    tracing::info!(points = raw_points.len(), "tracking finished");

    let raw_signal_path = sidecar_path(video, "rawsignal.json");
    backup_existing(&raw_signal_path)?;
    let raw_json = raw_signal_to_json(&raw_points)
        .map_err(|e| FsgenError::post_process(e.to_string()))?;
    std::fs::write(&raw_signal_path, raw_json)?;

    let (script_path, report_path, report, action_count) = finalize(
        ctx,
        video,
        &clock,
        &raw_points,
    )?;

    // Cancellation is not a failure: the prefix was kept, but only a full
    // run announces completion.
    if status == RunStatus::Completed {
        ctx.emit(100.0, Stage::Complete);
    }

    Ok(RunOutcome {
        status,
        raw_points,
        action_count,
        script_path,
        raw_signal_path,
        report_path,
        report,
    })
}

/// Re-run post-processing on a previously written raw signal, without
/// re-tracking. Used to iterate on tunables.
pub fn regenerate_from_raw(ctx: &RunContext) -> FsgenResult<RunOutcome> {
    ctx.params
        .tunables
        .validate()
        .map_err(|e| FsgenError::config(e.to_string()))?;

    let video = &ctx.meta.path;
    let raw_signal_path = sidecar_path(video, "rawsignal.json");
    if !raw_signal_path.exists() {
        return Err(FsgenError::missing_input(&raw_signal_path));
    }

    let content = std::fs::read_to_string(&raw_signal_path)?;
    let raw_points = parse_raw_signal(&content)
        .map_err(|e| FsgenError::malformed(&raw_signal_path, e.to_string()))?;
    tracing::info!(points = raw_points.len(), "regenerating from raw signal");

    let clock = FrameClock::new(ctx.meta.fps);
    let (script_path, report_path, report, action_count) =
        finalize(ctx, video, &clock, &raw_points)?;

    Ok(RunOutcome {
        status: RunStatus::Completed,
        raw_points,
        action_count,
        script_path,
        raw_signal_path,
        report_path,
        report,
    })
}

/// Post-process the raw series, write the script, and build the report.
fn finalize(
    ctx: &RunContext,
    video: &Path,
    clock: &FrameClock,
    raw_points: &[RawSignalPoint],
) -> FsgenResult<(PathBuf, PathBuf, ScriptReport, usize)> {
    ctx.emit(0.0, Stage::PostProcessing);
    let processor = SignalPostProcessor::new(ctx.params.tunables.clone());
    let processed = processor.process(raw_points);
    let actions = SignalPostProcessor::to_actions(&processed, clock);

    let mut script = Funscript::new();
    for action in &actions {
        script.push_action(action.at, action.pos);
    }
    script.set_metadata("generator", serde_json::json!("fsgen"));
    script.set_metadata(
        "generator_version",
        serde_json::json!(env!("CARGO_PKG_VERSION")),
    );
    script.set_metadata(
        "created_at",
        serde_json::json!(chrono::Utc::now().to_rfc3339()),
    );
    script.set_metadata(
        "source",
        serde_json::json!(video.file_name().map(|n| n.to_string_lossy().into_owned())),
    );
    script.set_metadata("fps", serde_json::json!(clock.fps()));
    script.set_metadata("tunables", serde_json::to_value(&ctx.params.tunables)?);

    let script_path = ctx
        .params
        .output
        .clone()
        .unwrap_or_else(|| sidecar_path(video, "funscript"));
    backup_existing(&script_path)?;
    script
        .save(&script_path)
        .map_err(|e| FsgenError::post_process(e.to_string()))?;
    tracing::info!(
        path = %script_path.display(),
        actions = script.actions.len(),
        "script written"
    );

    ctx.emit(0.0, Stage::Reporting);
    let report = fsgen_report::build_report(&script, ctx.params.reference.as_deref());
    let report_path = sidecar_path(video, "report.json");
    backup_existing(&report_path)?;
    report
        .save(&report_path)
        .map_err(|e| FsgenError::report(e.to_string()))?;

    let summary = report.summary();
    tracing::info!(
        points = summary.point_count,
        longest_gap_ms = summary.longest_gap_ms,
        "report written"
    );

    Ok((script_path, report_path, report, actions.len()))
}

/// Scan the detections for the first run of consecutive frames where both
/// the anchor and the contact class qualify, then back off by one second of
/// frames. Absence means the scan starts at frame zero.
fn find_start_frame(store: &DetectionStore, config: &TrackerConfig, clock: &FrameClock) -> u64 {
    let classes = store.classes();
    let (Some(anchor_id), Some(contact_id)) = (classes.anchor_id(), classes.contact_id()) else {
        return 0;
    };
    let floor = config.confidence_floor;

    let mut run_start: Option<u64> = None;
    let mut previous: Option<u64> = None;
    for frame in store.frames_with_data() {
        let boxes = store.boxes_for(frame);
        let qualifies = |id: u32| {
            boxes
                .iter()
                .any(|r| r.class_id == id && r.confidence >= floor)
        };
        if qualifies(anchor_id) && qualifies(contact_id) {
            let consecutive = previous == Some(frame.saturating_sub(1));
            let start = if consecutive {
                run_start.unwrap_or(frame)
            } else {
                frame
            };
            if consecutive && frame - start + 1 >= config.promotion_frames as u64 {
                let backoff = clock.frames_in_secs(1.0);
                let adjusted = start.saturating_sub(backoff);
                tracing::info!(frame = start, adjusted, "anchor first confirmed");
                return adjusted;
            }
            run_start = Some(start);
            previous = Some(frame);
        } else {
            run_start = None;
            previous = None;
        }
    }

    tracing::warn!("no confirmed anchor run found, starting at frame 0");
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsgen_script_model::DetectionRecord;

    fn store_with(rows: &[(u64, u32, f32)]) -> DetectionStore {
        let classes = ClassTable::default();
        let records = rows.iter().map(|&(frame, class_id, conf)| {
            DetectionRecord::from_row((frame, class_id, conf, 0, 0, 10, 10, 1), &classes)
        });
        DetectionStore::from_records(records.collect::<Vec<_>>(), classes)
    }

    #[test]
    fn test_start_frame_backs_off_one_second() {
        let store = store_with(&[
            (100, 0, 0.8),
            (100, 1, 0.7),
            (101, 0, 0.8),
            (101, 1, 0.7),
        ]);
        let start = find_start_frame(&store, &TrackerConfig::default(), &FrameClock::new(30.0));
        assert_eq!(start, 70);
    }

    #[test]
    fn test_start_frame_requires_consecutive_frames() {
        let store = store_with(&[
            (100, 0, 0.8),
            (100, 1, 0.7),
            // gap
            (102, 0, 0.8),
            (102, 1, 0.7),
        ]);
        let start = find_start_frame(&store, &TrackerConfig::default(), &FrameClock::new(30.0));
        assert_eq!(start, 0);
    }

    #[test]
    fn test_start_frame_ignores_low_confidence() {
        let store = store_with(&[
            (10, 0, 0.4),
            (10, 1, 0.7),
            (11, 0, 0.4),
            (11, 1, 0.7),
        ]);
        let start = find_start_frame(&store, &TrackerConfig::default(), &FrameClock::new(30.0));
        assert_eq!(start, 0);
    }

    #[test]
    fn test_start_frame_clamps_at_zero() {
        let store = store_with(&[(3, 0, 0.8), (3, 1, 0.7), (4, 0, 0.8), (4, 1, 0.7)]);
        let start = find_start_frame(&store, &TrackerConfig::default(), &FrameClock::new(30.0));
        assert_eq!(start, 0);
    }
}
