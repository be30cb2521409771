//! Detection store: per-frame records with priority-ordered retrieval.

use std::collections::BTreeMap;

use fsgen_script_model::{ClassTable, DetectionRecord};

/// Holds all detection records for a video, indexed by frame.
///
/// Insertion order is irrelevant; retrieval sorts by the class-priority
/// table (stable, so ties keep insertion order). This guarantees the anchor
/// class is always evaluated before secondary part classes within a frame.
#[derive(Debug, Clone)]
pub struct DetectionStore {
    frames: BTreeMap<u64, Vec<DetectionRecord>>,
    classes: ClassTable,
}

impl DetectionStore {
    pub fn new(classes: ClassTable) -> Self {
        Self {
            frames: BTreeMap::new(),
            classes,
        }
    }

    /// Build a store from an iterator of records.
    pub fn from_records(
        records: impl IntoIterator<Item = DetectionRecord>,
        classes: ClassTable,
    ) -> Self {
        let mut store = Self::new(classes);
        for record in records {
            store.add(record);
        }
        store
    }

    /// Append a record to its frame's list. No dedup, no ordering guarantee.
    pub fn add(&mut self, record: DetectionRecord) {
        self.frames
            .entry(record.frame_index)
            .or_default()
            .push(record);
    }

    /// Records for a frame, sorted by class priority (lower rank first),
    /// ties broken by insertion order.
    pub fn boxes_for(&self, frame: u64) -> Vec<&DetectionRecord> {
        let Some(records) = self.frames.get(&frame) else {
            return Vec::new();
        };
        let mut sorted: Vec<&DetectionRecord> = records.iter().collect();
        sorted.sort_by_key(|r| self.classes.priority_for(r.class_id));
        sorted
    }

    /// Ordered frame indices that have at least one record.
    pub fn frames_with_data(&self) -> Vec<u64> {
        self.frames.keys().copied().collect()
    }

    /// Whether the given frame has any records.
    pub fn has_frame(&self, frame: u64) -> bool {
        self.frames.contains_key(&frame)
    }

    /// Total record count across all frames.
    pub fn len(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The class table this store sorts with.
    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// All records in frame order, for re-serialization.
    pub fn records(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.frames.values().flatten()
    }
}
