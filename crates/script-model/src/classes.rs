//! Class table: names, evaluation priority, and tracker roles.
//!
//! Detections arrive tagged with numeric class ids. The table maps each id
//! to a stable name, a priority rank used to order detections within a frame
//! (lower rank is evaluated first), and the role the class plays in tracking.
//! Unrecognized ids fall back to an explicit default rank so they sort last
//! without being dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Priority rank assigned to classes missing from the table.
pub const DEFAULT_PRIORITY: u32 = 7;

/// Role a class plays in the tracking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassRole {
    /// The primary reference object; drives the anchor state machine.
    Anchor,
    /// Contact indicator at the anchor extremity; drives the contact flag.
    Contact,
    /// Secondary body part; contributes a distance to the signal.
    Part,
    /// Known but not used by the tracker.
    Other,
}

/// One entry of the class table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Stable class name used in logs and debug output.
    pub name: String,

    /// Evaluation priority within a frame; lower sorts first.
    pub priority: u32,

    /// Tracking role.
    pub role: ClassRole,
}

/// Typed class-priority table, validated at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTable {
    entries: BTreeMap<u32, ClassEntry>,

    /// Rank assigned to class ids not present in `entries`.
    #[serde(default = "default_priority")]
    default_priority: u32,
}

fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

impl Default for ClassTable {
    /// The built-in table used when no custom table is supplied.
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(0, entry("anchor", 0, ClassRole::Anchor));
        entries.insert(1, entry("tip", 1, ClassRole::Contact));
        entries.insert(2, entry("hand", 2, ClassRole::Part));
        entries.insert(3, entry("face", 3, ClassRole::Part));
        entries.insert(4, entry("hips", 4, ClassRole::Part));
        entries.insert(5, entry("torso", 5, ClassRole::Part));
        entries.insert(6, entry("foot", 6, ClassRole::Part));
        // Synthetic center marker emitted by the upstream pose stage.
        entries.insert(10, entry("hips-center", 4, ClassRole::Part));
        Self {
            entries,
            default_priority: DEFAULT_PRIORITY,
        }
    }
}

fn entry(name: &str, priority: u32, role: ClassRole) -> ClassEntry {
    ClassEntry {
        name: name.to_string(),
        priority,
        role,
    }
}

impl ClassTable {
    /// Load a table from a JSON document, validating it before use.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let table: ClassTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Validate table consistency: non-empty names, unique names, exactly
    /// one anchor class, and at most one contact class.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = std::collections::BTreeSet::new();
        for (id, entry) in &self.entries {
            if entry.name.is_empty() {
                return Err(ModelError::invalid(format!("class {id} has empty name")));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ModelError::invalid(format!(
                    "duplicate class name '{}'",
                    entry.name
                )));
            }
        }
        let anchors = self.ids_with_role(ClassRole::Anchor).count();
        if anchors != 1 {
            return Err(ModelError::invalid(format!(
                "expected exactly one anchor class, found {anchors}"
            )));
        }
        if self.ids_with_role(ClassRole::Contact).count() > 1 {
            return Err(ModelError::invalid("more than one contact class"));
        }
        Ok(())
    }

    /// Name for a class id; unknown ids map to `"unknown"`.
    pub fn name_for(&self, class_id: u32) -> &str {
        self.entries
            .get(&class_id)
            .map(|e| e.name.as_str())
            .unwrap_or("unknown")
    }

    /// Priority rank for a class id; unknown ids get the default rank.
    pub fn priority_for(&self, class_id: u32) -> u32 {
        self.entries
            .get(&class_id)
            .map(|e| e.priority)
            .unwrap_or(self.default_priority)
    }

    /// Role for a class id; unknown ids are `Other`.
    pub fn role_for(&self, class_id: u32) -> ClassRole {
        self.entries
            .get(&class_id)
            .map(|e| e.role)
            .unwrap_or(ClassRole::Other)
    }

    /// The single anchor class id.
    pub fn anchor_id(&self) -> Option<u32> {
        self.ids_with_role(ClassRole::Anchor).next()
    }

    /// The contact class id, if the table declares one.
    pub fn contact_id(&self) -> Option<u32> {
        self.ids_with_role(ClassRole::Contact).next()
    }

    /// Ids of all part classes, in id order.
    pub fn part_ids(&self) -> Vec<u32> {
        self.ids_with_role(ClassRole::Part).collect()
    }

    fn ids_with_role(&self, role: ClassRole) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .filter(move |(_, e)| e.role == role)
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = ClassTable::default();
        table.validate().expect("default table should validate");
        assert_eq!(table.anchor_id(), Some(0));
        assert_eq!(table.contact_id(), Some(1));
        assert!(table.part_ids().contains(&2));
    }

    #[test]
    fn test_unknown_class_gets_default_rank() {
        let table = ClassTable::default();
        assert_eq!(table.priority_for(99), DEFAULT_PRIORITY);
        assert_eq!(table.name_for(99), "unknown");
        assert_eq!(table.role_for(99), ClassRole::Other);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut table = ClassTable::default();
        table.entries.insert(20, entry("hand", 5, ClassRole::Part));
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_missing_anchor_rejected() {
        let mut table = ClassTable::default();
        table.entries.remove(&0);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let table = ClassTable::default();
        let json = serde_json::to_string(&table).unwrap();
        let reloaded = ClassTable::from_json(&json).unwrap();
        assert_eq!(reloaded.priority_for(10), table.priority_for(10));
        assert_eq!(reloaded.name_for(6), "foot");
    }
}
