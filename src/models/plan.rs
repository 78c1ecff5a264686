use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// One day of the weekly template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDay {
  pub weekday: Weekday,
  /// e.g. "strength", "hypertrophy", "conditioning", "rest"
  pub session_type: String,
  /// Target effort for the day (1-10)
  pub intensity: Option<f64>,
}

/// Per-athlete weekly template used as the adherence baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
  pub athlete_id: String,
  pub weekly_volume_target: f64,
  pub sessions_per_week: u32,
  #[serde(default)]
  pub schedule: Vec<PlannedDay>,
}

impl TrainingPlan {
  pub fn new(athlete_id: &str, sessions_per_week: u32, weekly_volume_target: f64) -> Self {
    Self {
      athlete_id: athlete_id.to_string(),
      weekly_volume_target,
      sessions_per_week,
      schedule: Vec::new(),
    }
  }

  pub fn to_schedule_json(&self) -> String {
    serde_json::to_string(&self.schedule).unwrap_or_else(|_| "[]".to_string())
  }
}
