//! The exported timeline document.
//!
//! A funscript is a JSON object declaring the value range (0–100), an
//! ordered list of `{at, pos}` actions with strictly increasing millisecond
//! timestamps, and free-form metadata describing how the script was made.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Current document schema version.
pub const FUNSCRIPT_VERSION: &str = "1.0";

/// Position range declared by every document this crate writes.
pub const POSITION_RANGE: u8 = 100;

/// One timed position of the exported timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunscriptAction {
    /// Timestamp in milliseconds from video start.
    pub at: u64,

    /// Position in `[0, 100]`.
    pub pos: i32,
}

/// Top-level funscript document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Funscript {
    pub version: String,

    #[serde(default)]
    pub inverted: bool,

    /// Upper bound of the position range (always 100 on write).
    pub range: u8,

    pub actions: Vec<FunscriptAction>,

    /// Free-form generator metadata (tunables used, source file, timestamps).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Default for Funscript {
    fn default() -> Self {
        Self::new()
    }
}

impl Funscript {
    pub fn new() -> Self {
        Self {
            version: FUNSCRIPT_VERSION.to_string(),
            inverted: false,
            range: POSITION_RANGE,
            actions: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Append an action, keeping timestamps strictly increasing.
    ///
    /// An action at or before the last timestamp is dropped rather than
    /// breaking the ordering invariant; returns whether it was kept.
    pub fn push_action(&mut self, at: u64, pos: i32) -> bool {
        if let Some(last) = self.actions.last() {
            if at <= last.at {
                return false;
            }
        }
        self.actions.push(FunscriptAction {
            at,
            pos: pos.clamp(0, 100),
        });
        true
    }

    /// Record a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Total duration covered by the actions, in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.actions.last().map(|a| a.at).unwrap_or(0)
    }

    /// Validate the document invariants: range declaration, position bounds,
    /// strictly increasing timestamps.
    pub fn validate(&self) -> Result<(), ModelError> {
        for action in &self.actions {
            if action.pos < 0 || action.pos > POSITION_RANGE as i32 {
                return Err(ModelError::invalid(format!(
                    "action at {}ms has out-of-range position {}",
                    action.at, action.pos
                )));
            }
        }
        for pair in self.actions.windows(2) {
            if pair[1].at <= pair[0].at {
                return Err(ModelError::invalid(format!(
                    "timestamps not strictly increasing at {}ms",
                    pair[1].at
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a document from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        let script: Funscript = serde_json::from_str(&content)?;
        script.validate()?;
        Ok(script)
    }

    /// Write the document to disk as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
