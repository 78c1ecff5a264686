//! Session state machine
//!
//! `planned -> in_progress -> completed`, plus `planned -> cancelled`.
//! `completed -> in_progress` exists only as an explicit user reversal.
//! Every rejected transition leaves the session untouched and returns an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::recompute_totals;
use crate::config::MetricsConfig;
use crate::error::TransitionError;
use crate::models::{SessionStatus, WorkoutSession};

/// What the athlete actually did on a set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SetResult {
  pub reps: u32,
  pub weight: f64,
  pub rpe: Option<f64>,
  pub rir: Option<f64>,
}

impl WorkoutSession {
  fn reject(&self, action: &'static str) -> TransitionError {
    warn!(
      session_id = %self.id,
      from = %self.status,
      action,
      "Rejected session transition"
    );
    TransitionError::InvalidTransition {
      action,
      from: self.status,
    }
  }

  fn ensure_editable(&self) -> Result<(), TransitionError> {
    match self.status {
      SessionStatus::Planned | SessionStatus::InProgress => Ok(()),
      status => {
        warn!(session_id = %self.id, %status, "Rejected set edit on locked session");
        Err(TransitionError::SessionLocked { status })
      }
    }
  }

  /// `planned -> in_progress`
  pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
    if self.status != SessionStatus::Planned {
      return Err(self.reject("start"));
    }
    self.status = SessionStatus::InProgress;
    self.started_at = Some(at);
    debug!(session_id = %self.id, "Session started");
    Ok(())
  }

  /// `in_progress -> completed`, refreshing cached totals from the sets
  pub fn complete(&mut self, at: DateTime<Utc>, config: &MetricsConfig) -> Result<(), TransitionError> {
    if self.status != SessionStatus::InProgress {
      return Err(self.reject("complete"));
    }
    self.status = SessionStatus::Completed;
    self.completed_at = Some(at);
    self.totals = recompute_totals(self, config);
    debug!(
      session_id = %self.id,
      total_volume = self.totals.total_volume,
      total_sets = self.totals.total_sets,
      "Session completed"
    );
    Ok(())
  }

  /// `planned -> cancelled`
  pub fn cancel(&mut self) -> Result<(), TransitionError> {
    if self.status != SessionStatus::Planned {
      return Err(self.reject("cancel"));
    }
    self.status = SessionStatus::Cancelled;
    Ok(())
  }

  /// `completed -> in_progress`; user-initiated reversal only
  pub fn uncomplete(&mut self) -> Result<(), TransitionError> {
    if self.status != SessionStatus::Completed {
      return Err(self.reject("uncomplete"));
    }
    self.status = SessionStatus::InProgress;
    self.completed_at = None;
    Ok(())
  }

  /// Record actual values on a set and mark it completed
  pub fn complete_set(
    &mut self,
    exercise_index: usize,
    set_index: usize,
    result: SetResult,
    at: DateTime<Utc>,
  ) -> Result<(), TransitionError> {
    self.ensure_editable()?;
    let set = self
      .exercises
      .get_mut(exercise_index)
      .and_then(|e| e.sets.get_mut(set_index))
      .ok_or(TransitionError::SetNotFound {
        exercise_index,
        set_index,
      })?;

    set.actual_reps = Some(result.reps);
    set.actual_weight = Some(result.weight);
    set.rpe = result.rpe;
    set.rir = result.rir;
    set.is_completed = true;
    set.completed_at = Some(at);
    Ok(())
  }

  /// Back to planned: actual values are cleared
  pub fn uncomplete_set(&mut self, exercise_index: usize, set_index: usize) -> Result<(), TransitionError> {
    self.ensure_editable()?;
    let set = self
      .exercises
      .get_mut(exercise_index)
      .and_then(|e| e.sets.get_mut(set_index))
      .ok_or(TransitionError::SetNotFound {
        exercise_index,
        set_index,
      })?;

    set.actual_reps = None;
    set.actual_weight = None;
    set.rpe = None;
    set.rir = None;
    set.is_completed = false;
    set.completed_at = None;
    Ok(())
  }
}
