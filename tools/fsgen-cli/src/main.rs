//! fsgen CLI — Command-line interface for script generation.
//!
//! Usage:
//!   fsgen track <VIDEO>...     Track detections into a script
//!   fsgen regen <VIDEO>        Re-post-process an existing raw signal
//!   fsgen compare <SCRIPT>     Compare a script against a reference
//!   fsgen info <SCRIPT>        Show script statistics

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fsgen",
    about = "Generate smoothed motion timelines from per-frame detection boxes",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Post-processing flags shared by `track` and `regen`.
#[derive(Debug, clap::Args)]
struct TuningArgs {
    /// Disable delta boosting
    #[arg(long)]
    no_boost: bool,

    /// Boost added to upward deltas, percent [0, 20]
    #[arg(long, default_value = "10")]
    boost_up: u32,

    /// Boost added to downward deltas, percent [0, 20]
    #[arg(long, default_value = "15")]
    boost_down: u32,

    /// Disable threshold remapping
    #[arg(long)]
    no_threshold: bool,

    /// Values at or below this map to 0 [0, 15]
    #[arg(long, default_value = "10")]
    threshold_low: i32,

    /// Values at or above this map to 100 [80, 100]
    #[arg(long, default_value = "90")]
    threshold_high: i32,

    /// Disable point simplification
    #[arg(long)]
    no_simplify: bool,

    /// Simplification tolerance factor [2.0, 10.0]
    #[arg(long, default_value = "8.0")]
    simplify_factor: f64,

    /// Rounding unit for positions: 5 or 10
    #[arg(long, default_value = "5")]
    rounding: i32,
}

/// Video metadata flags (the pipeline never decodes the video itself).
#[derive(Debug, clap::Args)]
struct VideoArgs {
    /// Video frame rate
    #[arg(long, default_value = "30.0")]
    fps: f64,

    /// Video frame width in pixels
    #[arg(long, default_value = "1920")]
    width: u32,

    /// Video frame height in pixels
    #[arg(long, default_value = "1080")]
    height: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Track detection sidecars into scripts, one video at a time
    Track {
        /// Video files (expects `<stem>.detections.json` next to each)
        #[arg(required = true)]
        videos: Vec<PathBuf>,

        #[command(flatten)]
        video_args: VideoArgs,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Reference script to compare the result against
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output script path (single video only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Custom class table (JSON)
        #[arg(long)]
        classes: Option<PathBuf>,

        /// Anchor occlusion budget in frames
        #[arg(long, default_value = "30")]
        occlusion_budget: u32,
    },

    /// Re-run post-processing on an existing raw signal
    Regen {
        /// Video file whose `<stem>.rawsignal.json` should be reprocessed
        video: PathBuf,

        #[command(flatten)]
        video_args: VideoArgs,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Reference script to compare the result against
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output script path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare a generated script against a reference
    Compare {
        /// Generated script
        script: PathBuf,

        /// Reference script
        reference: PathBuf,
    },

    /// Show statistics for a script
    Info {
        /// Script path
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    fsgen_common::logging::init_logging(&fsgen_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Track {
            videos,
            video_args,
            tuning,
            reference,
            output,
            classes,
            occlusion_budget,
        } => {
            commands::track::run(
                videos,
                video_args,
                tuning,
                reference,
                output,
                classes,
                occlusion_budget,
            )
            .await
        }
        Commands::Regen {
            video,
            video_args,
            tuning,
            reference,
            output,
        } => commands::regen::run(video, video_args, tuning, reference, output).await,
        Commands::Compare { script, reference } => commands::compare::run(script, reference),
        Commands::Info { script } => commands::info::run(script),
    }
}

impl TuningArgs {
    fn to_tunables(&self) -> fsgen_script_model::ScriptTunables {
        fsgen_script_model::ScriptTunables {
            boost_enabled: !self.no_boost,
            boost_up_percent: self.boost_up,
            boost_down_percent: self.boost_down,
            threshold_enabled: !self.no_threshold,
            threshold_low: self.threshold_low,
            threshold_high: self.threshold_high,
            simplification_enabled: !self.no_simplify,
            simplification_factor: self.simplify_factor,
            rounding_unit: self.rounding,
        }
    }
}
