//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Helper assertions

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use crate::config::MetricsConfig;
use crate::db::{self, AppState};
use crate::models::{Athlete, ExerciseEntry, SessionStatus, SetEntry, SetType, TrainingPlan, WorkoutSession};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// In-memory database wrapped in an `AppState` with default config
pub async fn setup_test_state() -> AppState {
  AppState::new(setup_test_db().await, MetricsConfig::default())
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Insert an athlete row so plans can reference it
pub async fn seed_test_athlete(pool: &SqlitePool, athlete_id: &str, bodyweight: Option<f64>) {
  let athlete = Athlete {
    id: athlete_id.to_string(),
    name: format!("Test {}", athlete_id),
    bodyweight,
  };
  db::save_athlete(pool, &athlete)
    .await
    .expect("Failed to insert test athlete");
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// A completed working set
pub fn mock_set(weight: f64, reps: u32, rpe: Option<f64>) -> SetEntry {
  SetEntry {
    set_number: 1,
    set_type: SetType::Working,
    target_reps: Some(reps),
    target_weight: Some(weight),
    actual_reps: Some(reps),
    actual_weight: Some(weight),
    rpe,
    is_completed: true,
    completed_at: Some(Utc::now()),
    ..Default::default()
  }
}

pub fn mock_exercise_entry(exercise_id: &str, sets: Vec<SetEntry>) -> ExerciseEntry {
  ExerciseEntry {
    id: format!("entry-{}", exercise_id),
    exercise_id: exercise_id.to_string(),
    sets,
    ..Default::default()
  }
}

/// Session for "athlete-1" scheduled `days_ago` days before now.
///
/// Completed sessions complete at their scheduled time; started ones carry
/// a start time. Cached totals are left at zero.
pub fn mock_session(
  id: &str,
  status: SessionStatus,
  days_ago: i64,
  exercises: Vec<ExerciseEntry>,
) -> WorkoutSession {
  let scheduled_at = datetime_days_ago(days_ago);
  let mut session = WorkoutSession::new(id, "athlete-1", scheduled_at);

  session.status = status;
  session.exercises = exercises;
  if matches!(status, SessionStatus::InProgress | SessionStatus::Completed) {
    session.started_at = Some(scheduled_at);
  }
  if status == SessionStatus::Completed {
    session.completed_at = Some(scheduled_at);
  }

  session
}

pub fn mock_plan(athlete_id: &str, sessions_per_week: u32, weekly_volume_target: f64) -> TrainingPlan {
  TrainingPlan::new(athlete_id, sessions_per_week, weekly_volume_target)
}

/// ---------------------------------------------------------------------------
/// Date/Time Helpers
/// ---------------------------------------------------------------------------

/// Create a DateTime for N days ago
pub fn datetime_days_ago(days: i64) -> DateTime<Utc> {
  Utc::now() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance (default 1e-9)
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr) => {
    $crate::assert_approx_eq!($left, $right, 1e-9)
  };
  ($left:expr, $right:expr, $tolerance:expr) => {{
    let left: f64 = $left;
    let right: f64 = $right;
    let diff = (left - right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      left,
      right,
      diff,
      $tolerance
    );
  }};
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('athletes', 'exercises', 'training_plans', 'workout_sessions')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_athlete() {
    let pool = setup_test_db().await;
    seed_test_athlete(&pool, "athlete-1", Some(80.0)).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM athletes")
      .fetch_one(&pool)
      .await
      .expect("Failed to count athletes");
    assert_eq!(count, 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_session_timestamps() {
    let done = mock_session("s1", SessionStatus::Completed, 3, vec![]);
    assert_eq!(done.completed_at, Some(done.scheduled_at));
    assert!(done.started_at.is_some());

    let planned = mock_session("s2", SessionStatus::Planned, 0, vec![]);
    assert!(planned.started_at.is_none());
    assert!(planned.completed_at.is_none());
  }

  #[test]
  fn test_mock_set_is_completed() {
    let set = mock_set(100.0, 5, Some(8.0));
    assert!(set.is_completed);
    assert_eq!(set.actual_reps, Some(5));
    assert_eq!(set.set_type, SetType::Working);
  }

  #[test]
  fn test_assert_approx_eq_macro() {
    assert_approx_eq!(1.0, 1.0 + 1e-12);
    assert_approx_eq!(1.0, 1.05, 0.1);
  }
}
