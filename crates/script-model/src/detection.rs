//! Detection records and their persisted interchange form.
//!
//! The upstream detector emits one row per box per frame. Rows are persisted
//! as a JSON list of `[frame, class_id, confidence, x1, y1, x2, y2, track_id]`
//! tuples so the document stays readable and compact; reloading a document
//! reconstructs equivalent records (class names come from the class table).

use serde::{Deserialize, Serialize};

use crate::{ClassTable, ModelError};

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Center point of the box.
    pub fn centroid(&self) -> (f64, f64) {
        (
            (self.x1 + self.x2) as f64 / 2.0,
            (self.y1 + self.y2) as f64 / 2.0,
        )
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).abs()
    }

    /// Box area in square pixels.
    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }
}

/// A single detection produced by the upstream detector for one frame.
///
/// Immutable once constructed; owned by the detection store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Zero-based frame index the detection belongs to.
    pub frame_index: u64,

    /// Numeric class id as emitted by the detector.
    pub class_id: u32,

    /// Class name resolved through the class table ("unknown" if absent).
    pub class_name: String,

    /// Detection confidence, kept at one decimal of precision.
    pub confidence: f32,

    /// Bounding box in pixel coordinates.
    pub bbox: BoundingBox,

    /// Persistent track identifier assigned by the detector's tracker.
    pub track_id: i64,
}

/// Wire form of a detection record: one row of the interchange document.
pub type DetectionRow = (u64, u32, f32, i32, i32, i32, i32, i64);

impl DetectionRecord {
    /// Build a record from a wire row, resolving the class name.
    pub fn from_row(row: DetectionRow, classes: &ClassTable) -> Self {
        let (frame_index, class_id, confidence, x1, y1, x2, y2, track_id) = row;
        Self {
            frame_index,
            class_id,
            class_name: classes.name_for(class_id).to_string(),
            confidence: quantize_confidence(confidence),
            bbox: BoundingBox::new(x1, y1, x2, y2),
            track_id,
        }
    }

    /// Convert back to the wire row.
    pub fn to_row(&self) -> DetectionRow {
        (
            self.frame_index,
            self.class_id,
            self.confidence,
            self.bbox.x1,
            self.bbox.y1,
            self.bbox.x2,
            self.bbox.y2,
            self.track_id,
        )
    }
}

/// Confidence is persisted at one decimal; quantize on entry so round-trips
/// through the document are exact.
fn quantize_confidence(conf: f32) -> f32 {
    (conf * 10.0).round() / 10.0
}

/// Parse a detection interchange document (JSON list of rows).
pub fn parse_detection_document(
    json: &str,
    classes: &ClassTable,
) -> Result<Vec<DetectionRecord>, ModelError> {
    let rows: Vec<DetectionRow> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .map(|row| DetectionRecord::from_row(row, classes))
        .collect())
}

/// Serialize records back to the interchange document.
pub fn detection_document_to_json(records: &[DetectionRecord]) -> Result<String, ModelError> {
    let rows: Vec<DetectionRow> = records.iter().map(DetectionRecord::to_row).collect();
    Ok(serde_json::to_string(&rows)?)
}
