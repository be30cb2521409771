//! Input discovery and parsing: sidecar files next to the video.
//!
//! The detector and scene-change stages are external collaborators; their
//! outputs reach the pipeline as sidecar documents named after the video:
//! `<stem>.detections.json`, `<stem>.cuts.json`. Generated outputs follow
//! the same convention.

use std::path::{Path, PathBuf};

use fsgen_common::error::{FsgenError, FsgenResult};
use fsgen_script_model::{parse_detection_document, ClassTable, DetectionRecord, SceneBoundaries};

/// Sidecar path with the given suffix, e.g. `clip.mp4` → `clip.detections.json`.
pub fn sidecar_path(video: &Path, suffix: &str) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    video.with_file_name(format!("{stem}.{suffix}"))
}

/// Back up an existing file to `<name>.bak` before it gets overwritten.
pub fn backup_existing(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        std::fs::rename(path, PathBuf::from(backup))?;
    }
    Ok(())
}

/// Source of detection records for a frame range.
///
/// The only contract with the upstream detector: zero or more typed records
/// per frame. Model architecture and confidence calibration are out of
/// scope.
pub trait DetectionSource {
    fn detections(&mut self, classes: &ClassTable) -> FsgenResult<Vec<DetectionRecord>>;
}

/// File-backed detection source reading the interchange document.
pub struct JsonDetectionSource {
    path: PathBuf,
}

impl JsonDetectionSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The conventional source for a video's detections.
    pub fn for_video(video: &Path) -> Self {
        Self::new(sidecar_path(video, "detections.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DetectionSource for JsonDetectionSource {
    fn detections(&mut self, classes: &ClassTable) -> FsgenResult<Vec<DetectionRecord>> {
        if !self.path.exists() {
            return Err(FsgenError::missing_input(&self.path));
        }
        let content = std::fs::read_to_string(&self.path)?;
        parse_detection_document(&content, classes)
            .map_err(|e| FsgenError::malformed(&self.path, e.to_string()))
    }
}

/// Load scene boundaries for a video.
///
/// A missing cuts file means no resets; a malformed one degrades to empty
/// with a warning — the boundary provider is advisory, not load-bearing.
pub fn load_scene_boundaries(video: &Path) -> SceneBoundaries {
    let path = sidecar_path(video, "cuts.json");
    if !path.exists() {
        return SceneBoundaries::empty();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => match SceneBoundaries::from_json(&content) {
            Ok(cuts) => {
                tracing::info!(path = %path.display(), count = cuts.len(), "loaded scene cuts");
                cuts
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed cuts file");
                SceneBoundaries::empty()
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cuts file");
            SceneBoundaries::empty()
        }
    }
}
