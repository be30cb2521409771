//! Track detection sidecars into scripts.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fsgen_pipeline::{
    run_batch, CancelToken, FileStatus, ProgressEvent, RunParams, Stage, VideoMeta,
};
use fsgen_script_model::ClassTable;
use fsgen_tracking_core::TrackerConfig;

use crate::{TuningArgs, VideoArgs};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    videos: Vec<PathBuf>,
    video_args: VideoArgs,
    tuning: TuningArgs,
    reference: Option<PathBuf>,
    output: Option<PathBuf>,
    classes: Option<PathBuf>,
    occlusion_budget: u32,
) -> anyhow::Result<()> {
    if output.is_some() && videos.len() > 1 {
        anyhow::bail!("--output can only be used with a single video");
    }

    let classes = match classes {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("Failed to read class table {}: {e}", path.display()))?;
            ClassTable::from_json(&json)
                .map_err(|e| anyhow::anyhow!("Invalid class table: {e}"))?
        }
        None => ClassTable::default(),
    };

    let params = RunParams {
        tunables: tuning.to_tunables(),
        tracker: TrackerConfig {
            occlusion_budget_frames: occlusion_budget,
            ..Default::default()
        },
        classes,
        reference,
        output,
    };

    let metas: Vec<VideoMeta> = videos
        .iter()
        .map(|path| VideoMeta {
            path: path.clone(),
            fps: video_args.fps,
            width: video_args.width,
            height: video_args.height,
        })
        .collect();

    // Ctrl-C requests a cooperative stop: the current file finishes its
    // frame, keeps its partial output, and the queue ends.
    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nStopping after the current frame...");
            signal_token.cancel();
        }
    });

    let total = metas.len();
    println!("Processing {total} video(s)");

    let report = tokio::task::spawn_blocking(move || {
        run_batch(metas, &params, cancel, |index, total, path| {
            println!("[{}/{}] {}", index + 1, total, path.display());
            Some(Box::new(stage_printer()) as _)
        })
    })
    .await?;

    for entry in &report.entries {
        match &entry.status {
            FileStatus::Completed { actions } => {
                println!("  {} — {} actions", entry.video.display(), actions);
            }
            FileStatus::Cancelled => {
                println!("  {} — cancelled (partial output kept)", entry.video.display());
            }
            FileStatus::Failed { error } => {
                println!("  {} — FAILED: {error}", entry.video.display());
            }
        }
    }

    println!(
        "\nBatch finished: {} completed, {} failed{}",
        report.completed(),
        report.failed(),
        if report.was_cancelled() {
            ", stopped early"
        } else {
            ""
        }
    );

    if report.completed() == 0 && report.failed() > 0 {
        anyhow::bail!("no file completed successfully");
    }
    Ok(())
}

/// Progress printer: one line per 10% of tracking.
fn stage_printer() -> impl Fn(ProgressEvent) + Send {
    let last_decile = Arc::new(AtomicU64::new(u64::MAX));
    move |event| {
        if event.stage == Stage::Tracking {
            let decile = (event.percent / 10.0) as u64;
            if last_decile.swap(decile, Ordering::Relaxed) != decile {
                println!("  tracking {:>3.0}%", event.percent);
            }
        }
    }
}
