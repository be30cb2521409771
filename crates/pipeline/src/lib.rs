//! fsgen Pipeline — run orchestration.
//!
//! Owns everything around the tracking engine that touches the outside
//! world: sidecar file discovery and parsing, the per-video run context,
//! progress events, cooperative cancellation, and the sequential batch
//! queue. The engine itself (`fsgen-tracking-core`) stays pure; this crate
//! is the single place where its inputs are read and its outputs land on
//! disk.

pub mod batch;
pub mod cancel;
pub mod progress;
pub mod run;
pub mod source;

pub use batch::{run_batch, BatchEntry, BatchReport, FileStatus};
pub use cancel::CancelToken;
pub use progress::{ProgressCallback, ProgressEvent, Stage};
pub use run::{regenerate_from_raw, run_video, RunContext, RunOutcome, RunParams, RunStatus, VideoMeta};
