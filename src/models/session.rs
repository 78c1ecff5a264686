use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::exercise::ExerciseEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  #[default]
  Planned,
  InProgress,
  Completed,
  Cancelled,
  /// Slot booked on the calendar, not yet turned into a planned workout
  Reserved,
}

impl SessionStatus {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Completed | Self::Cancelled)
  }
}

impl std::fmt::Display for SessionStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Planned => write!(f, "planned"),
      Self::InProgress => write!(f, "in_progress"),
      Self::Completed => write!(f, "completed"),
      Self::Cancelled => write!(f, "cancelled"),
      Self::Reserved => write!(f, "reserved"),
    }
  }
}

impl std::str::FromStr for SessionStatus {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "planned" => Ok(Self::Planned),
      "in_progress" => Ok(Self::InProgress),
      "completed" => Ok(Self::Completed),
      "cancelled" => Ok(Self::Cancelled),
      "reserved" => Ok(Self::Reserved),
      _ => Err(format!("Unknown session status: {}", s)),
    }
  }
}

/// Cached rollup stored alongside a session.
///
/// Refreshed on completion. Read paths that need guaranteed freshness must
/// recompute from sets instead of trusting these numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionTotals {
  pub total_volume: f64,
  pub total_sets: u32,
  pub total_reps: u32,
  pub avg_intensity: f64,
}

/// Aggregate root for one training occasion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
  pub id: String,
  pub athlete_id: String,
  #[serde(default)]
  pub status: SessionStatus,
  pub scheduled_at: DateTime<Utc>,
  pub started_at: Option<DateTime<Utc>>,
  pub completed_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub exercises: Vec<ExerciseEntry>,
  /// Pre-session fatigue rating (1-10)
  pub pre_fatigue: Option<u8>,
  #[serde(default)]
  pub totals: SessionTotals,
}

impl WorkoutSession {
  pub fn new(id: &str, athlete_id: &str, scheduled_at: DateTime<Utc>) -> Self {
    Self {
      id: id.to_string(),
      athlete_id: athlete_id.to_string(),
      status: SessionStatus::Planned,
      scheduled_at,
      started_at: None,
      completed_at: None,
      exercises: Vec::new(),
      pre_fatigue: None,
      totals: SessionTotals::default(),
    }
  }

  pub fn is_completed(&self) -> bool {
    self.status == SessionStatus::Completed
  }

  /// Date the session counts toward: completion date, falling back to the scheduled date
  pub fn effective_date(&self) -> NaiveDate {
    self.completed_at.unwrap_or(self.scheduled_at).date_naive()
  }

  pub fn scheduled_date(&self) -> NaiveDate {
    self.scheduled_at.date_naive()
  }
}
