//! Exercise and session rollups
//!
//! Everything here is recomputed from sets. The cached `SessionTotals` on a
//! session are only refreshed from these functions, never the other way round.

use serde::{Deserialize, Serialize};

use crate::config::MetricsConfig;
use crate::models::{ExerciseEntry, SessionStatus, SessionTotals, SetEntry, WorkoutSession};
use crate::one_rep_max::{best_e1rm, DEFAULT_REP_CAP};
use crate::round_half_up;
use crate::set_metrics::{
  counts_toward_totals, set_fatigue, set_intensity, set_reps, set_volume, target_intensity,
};

/// ---------------------------------------------------------------------------
/// Set Accumulator
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct SetAccumulator {
  count: u32,
  volume: f64,
  reps: u32,
  intensity_sum: f64,
  peak_intensity: f64,
  fatigue_sum: f64,
  peak_fatigue: f64,
}

impl SetAccumulator {
  fn push(&mut self, set: &SetEntry) {
    let intensity = set_intensity(set);
    let fatigue = set_fatigue(set);

    self.count += 1;
    self.volume += set_volume(set);
    self.reps += set_reps(set);
    self.intensity_sum += intensity;
    self.peak_intensity = self.peak_intensity.max(intensity);
    self.fatigue_sum += fatigue;
    self.peak_fatigue = self.peak_fatigue.max(fatigue);
  }

  fn avg_intensity(&self) -> f64 {
    mean(self.intensity_sum, self.count)
  }

  fn avg_fatigue(&self) -> f64 {
    mean(self.fatigue_sum, self.count)
  }
}

fn mean(sum: f64, count: u32) -> f64 {
  if count == 0 {
    0.0
  } else {
    sum / count as f64
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Stats
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStats {
  pub entry_id: String,
  pub exercise_id: String,
  pub total_volume: f64,
  pub total_reps: u32,
  pub completed_sets: u32,
  pub planned_sets: u32,
  pub avg_intensity: f64,
  pub peak_intensity: f64,
  pub avg_fatigue: f64,
  pub peak_fatigue: f64,
  pub total_fatigue: f64,
  /// Rounded e1RM of the best completed set, configured formula
  pub best_e1rm: f64,
  /// No set completed yet; intensity figures come from the prescription
  pub target_only: bool,
}

impl ExerciseStats {
  fn empty(entry: &ExerciseEntry) -> Self {
    Self {
      entry_id: entry.id.clone(),
      exercise_id: entry.exercise_id.clone(),
      total_volume: 0.0,
      total_reps: 0,
      completed_sets: 0,
      planned_sets: 0,
      avg_intensity: 0.0,
      peak_intensity: 0.0,
      avg_fatigue: 0.0,
      peak_fatigue: 0.0,
      total_fatigue: 0.0,
      best_e1rm: 0.0,
      target_only: false,
    }
  }
}

pub fn compute_exercise_stats(entry: &ExerciseEntry, config: &MetricsConfig) -> ExerciseStats {
  let counted: Vec<&SetEntry> = entry
    .sets
    .iter()
    .filter(|s| counts_toward_totals(s, config.include_warmups))
    .collect();

  let mut stats = ExerciseStats::empty(entry);
  stats.planned_sets = counted.len() as u32;

  let completed: Vec<&SetEntry> = counted.iter().copied().filter(|s| s.is_completed).collect();

  if completed.is_empty() {
    if counted.is_empty() {
      return stats;
    }
    // Pre-workout view: show what was prescribed
    let targets: Vec<f64> = counted.iter().map(|s| target_intensity(s)).collect();
    stats.avg_intensity = targets.iter().sum::<f64>() / targets.len() as f64;
    stats.peak_intensity = targets.iter().copied().fold(0.0, f64::max);
    stats.target_only = true;
    return stats;
  }

  let acc = completed.iter().fold(SetAccumulator::default(), |mut acc, set| {
    acc.push(set);
    acc
  });

  stats.total_volume = acc.volume;
  stats.total_reps = acc.reps;
  stats.completed_sets = acc.count;
  stats.avg_intensity = acc.avg_intensity();
  stats.peak_intensity = acc.peak_intensity;
  stats.avg_fatigue = acc.avg_fatigue();
  stats.peak_fatigue = acc.peak_fatigue;
  stats.total_fatigue = acc.fatigue_sum;
  stats.best_e1rm = round_half_up(best_e1rm(
    completed.iter().copied(),
    config.one_rm_formula,
    DEFAULT_REP_CAP,
  ));
  stats
}

/// ---------------------------------------------------------------------------
/// Session Stats
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
  pub session_id: String,
  pub total_volume: f64,
  pub total_sets: u32,
  pub total_reps: u32,
  pub avg_intensity: f64,
  pub peak_intensity: f64,
  pub avg_fatigue: f64,
  pub peak_fatigue: f64,
  pub total_fatigue: f64,
  /// Exercises with at least one completed set
  pub completed_exercises: u32,
  pub exercise_count: u32,
  pub exercises: Vec<ExerciseStats>,
}

/// Session rollup; every completed set contributes equally to the averages
pub fn compute_session_stats(session: &WorkoutSession, config: &MetricsConfig) -> SessionStats {
  let exercises: Vec<ExerciseStats> = session
    .exercises
    .iter()
    .map(|entry| compute_exercise_stats(entry, config))
    .collect();

  let acc = session
    .exercises
    .iter()
    .flat_map(|entry| entry.sets.iter())
    .filter(|s| s.is_completed && counts_toward_totals(s, config.include_warmups))
    .fold(SetAccumulator::default(), |mut acc, set| {
      acc.push(set);
      acc
    });

  SessionStats {
    session_id: session.id.clone(),
    total_volume: acc.volume,
    total_sets: acc.count,
    total_reps: acc.reps,
    avg_intensity: acc.avg_intensity(),
    peak_intensity: acc.peak_intensity,
    avg_fatigue: acc.avg_fatigue(),
    peak_fatigue: acc.peak_fatigue,
    total_fatigue: acc.fatigue_sum,
    completed_exercises: exercises.iter().filter(|e| e.completed_sets > 0).count() as u32,
    exercise_count: exercises.len() as u32,
    exercises,
  }
}

/// Fresh cached totals for a session
pub fn recompute_totals(session: &WorkoutSession, config: &MetricsConfig) -> SessionTotals {
  let stats = compute_session_stats(session, config);
  SessionTotals {
    total_volume: stats.total_volume,
    total_sets: stats.total_sets,
    total_reps: stats.total_reps,
    avg_intensity: stats.avg_intensity,
  }
}

/// Cached totals no longer match the sets
pub fn has_stale_totals(session: &WorkoutSession, config: &MetricsConfig) -> bool {
  session.totals != recompute_totals(session, config)
}

/// ---------------------------------------------------------------------------
/// Multi-Session Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionsSummary {
  pub session_count: u32,
  pub completed_sessions: u32,
  /// Planned or in progress
  pub open_sessions: u32,
  pub cancelled_sessions: u32,
  pub total_volume: f64,
  pub total_sets: u32,
  pub total_reps: u32,
  /// Set-weighted across completed sessions
  pub avg_intensity: f64,
}

pub fn summarize_sessions(sessions: &[WorkoutSession], config: &MetricsConfig) -> SessionsSummary {
  let mut summary = SessionsSummary {
    session_count: sessions.len() as u32,
    ..Default::default()
  };
  let mut intensity_sum = 0.0;

  for session in sessions {
    match session.status {
      SessionStatus::Completed => {
        summary.completed_sessions += 1;
        let stats = compute_session_stats(session, config);
        summary.total_volume += stats.total_volume;
        summary.total_sets += stats.total_sets;
        summary.total_reps += stats.total_reps;
        intensity_sum += stats.avg_intensity * stats.total_sets as f64;
      }
      SessionStatus::Planned | SessionStatus::InProgress => summary.open_sessions += 1,
      SessionStatus::Cancelled => summary.cancelled_sessions += 1,
      SessionStatus::Reserved => {}
    }
  }

  summary.avg_intensity = mean(intensity_sum, summary.total_sets);
  summary
}
