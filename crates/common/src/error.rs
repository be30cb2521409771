//! Error types shared across fsgen crates.

use std::path::PathBuf;

/// Top-level error type for fsgen operations.
#[derive(Debug, thiserror::Error)]
pub enum FsgenError {
    #[error("Missing input: {path}")]
    MissingInput { path: PathBuf },

    #[error("Malformed intermediate {path}: {message}")]
    MalformedIntermediate { path: PathBuf, message: String },

    #[error("Tracking error: {message}")]
    Tracking { message: String },

    #[error("Post-processing error: {message}")]
    PostProcess { message: String },

    #[error("Report error: {message}")]
    Report { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FsgenError.
pub type FsgenResult<T> = Result<T, FsgenError>;

impl FsgenError {
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    pub fn malformed(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::MalformedIntermediate {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking {
            message: msg.into(),
        }
    }

    pub fn post_process(msg: impl Into<String>) -> Self {
        Self::PostProcess {
            message: msg.into(),
        }
    }

    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error represents a cooperative cancellation rather
    /// than a failure. Cancelled runs keep their partial output.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
