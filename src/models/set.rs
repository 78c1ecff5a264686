use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a set inside an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SetType {
  Warmup,
  #[default]
  Working,
  Dropset,
  Backoff,
  Amrap,
  Failure,
}

/// One performed or planned repetition group.
///
/// A planned set has no actual values and `is_completed == false`; an executed
/// set has `is_completed == true` with actual reps/weight filled in when it was
/// completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SetEntry {
  pub set_number: u32,
  #[serde(default)]
  pub set_type: SetType,
  pub target_reps: Option<u32>,
  pub target_weight: Option<f64>,
  /// Prescribed effort for planned sets
  pub target_rpe: Option<f64>,
  pub actual_reps: Option<u32>,
  pub actual_weight: Option<f64>,
  pub rpe: Option<f64>,
  pub rir: Option<f64>,
  /// Explicit intensity override (1-10)
  pub intensity: Option<f64>,
  #[serde(default)]
  pub is_completed: bool,
  pub completed_at: Option<DateTime<Utc>>,
  pub block_id: Option<String>,
}

impl SetEntry {
  /// A planned set with targets only
  pub fn planned(set_number: u32, target_reps: u32, target_weight: f64) -> Self {
    Self {
      set_number,
      target_reps: Some(target_reps),
      target_weight: Some(target_weight),
      ..Default::default()
    }
  }

  pub fn is_warmup(&self) -> bool {
    self.set_type == SetType::Warmup
  }
}
