//! fsgen Script Model
//!
//! Defines the core data contracts for fsgen:
//! - **Detections:** per-frame detection records and their persisted
//!   list-of-lists interchange form
//! - **Classes:** the typed class-priority table with roles and default rank
//! - **Signal:** the sparse raw distance series produced by the tracker
//! - **Funscript:** the exported timeline document (0–100 positions,
//!   strictly increasing millisecond timestamps)
//! - **Tunables:** post-processing parameters with range validation
//!
//! Box coordinates are pixel integers in the source frame; distances are
//! normalized by frame area before entering the signal so values survive
//! resolution changes.

pub mod classes;
pub mod detection;
pub mod funscript;
pub mod signal;
pub mod tunables;

pub use classes::*;
pub use detection::*;
pub use funscript::*;
pub use signal::*;
pub use tunables::*;

/// Errors raised by model parsing and validation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid model data: {message}")]
    Invalid { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid {
            message: msg.into(),
        }
    }
}
