//! Re-run post-processing on an existing raw signal.

use std::path::PathBuf;

use fsgen_pipeline::{regenerate_from_raw, RunContext, RunParams, VideoMeta};

use crate::{TuningArgs, VideoArgs};

pub async fn run(
    video: PathBuf,
    video_args: VideoArgs,
    tuning: TuningArgs,
    reference: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("Regenerating script for: {}", video.display());

    let params = RunParams {
        tunables: tuning.to_tunables(),
        reference,
        output,
        ..Default::default()
    };
    let meta = VideoMeta {
        path: video,
        fps: video_args.fps,
        width: video_args.width,
        height: video_args.height,
    };

    let outcome = tokio::task::spawn_blocking(move || {
        let ctx = RunContext::new(meta, params);
        regenerate_from_raw(&ctx)
    })
    .await?
    .map_err(|e| anyhow::anyhow!("Regeneration failed: {e}"))?;

    println!(
        "  {} raw points → {} actions",
        outcome.raw_points.len(),
        outcome.action_count
    );
    println!("  Script written to: {}", outcome.script_path.display());
    println!("  Report written to: {}", outcome.report_path.display());

    Ok(())
}
