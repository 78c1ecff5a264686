use serde::{Deserialize, Serialize};

use super::set::SetEntry;

/// Catalog exercise referenced by exercise entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub muscle_groups: Vec<String>,
  /// Load is athlete bodyweight plus any added load
  #[serde(default)]
  pub is_bodyweight: bool,
  /// Exercise-specific rep cap for e1RM formulas (clamped to 12)
  pub rep_cap: Option<u32>,
}

impl Exercise {
  pub fn new(id: &str, name: &str, muscle_groups: &[&str]) -> Self {
    Self {
      id: id.to_string(),
      name: name.to_string(),
      muscle_groups: muscle_groups.iter().map(|m| m.to_string()).collect(),
      is_bodyweight: false,
      rep_cap: None,
    }
  }
}

/// An exercise performed within one session. Owned by its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExerciseEntry {
  pub id: String,
  pub exercise_id: String,
  pub block_id: Option<String>,
  #[serde(default)]
  pub strength_focus: bool,
  #[serde(default)]
  pub sets: Vec<SetEntry>,
}

impl ExerciseEntry {
  pub fn completed_sets(&self) -> impl Iterator<Item = &SetEntry> {
    self.sets.iter().filter(|s| s.is_completed)
  }
}
