//! fsgen Tracking Core — the frame-to-signal engine
//!
//! Turns sparse, noisy, per-frame detection boxes into a continuous motion
//! channel and reshapes it into the exported timeline:
//! - **Store:** priority-ordered access to per-frame detections
//! - **Anchor:** hysteresis state machine for the locked reference box
//! - **Tracker:** per-frame distance aggregation across tracked parts
//! - **Post-processing:** boost, threshold remap, simplification, rounding
//!
//! This crate is pure computation — no I/O, no video dependencies.
//! All inputs are data; all outputs are data.

pub mod anchor;
pub mod postprocess;
pub mod store;
pub mod tracker;

pub use anchor::{AnchorObservation, AnchorPhase, AnchorTracker};
pub use postprocess::SignalPostProcessor;
pub use store::DetectionStore;
pub use tracker::{SegmentedTracker, Tracker, TrackerConfig};
