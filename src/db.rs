//! SQLite store for athletes, plans, the exercise catalog and sessions
//!
//! Sessions own their exercise entries and sets, which are stored as a JSON
//! column and replaced wholesale on save.

use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};
use std::collections::HashMap;
use tracing::info;

use crate::config::MetricsConfig;
use crate::error::CoachError;
use crate::models::{Athlete, Exercise, SessionTotals, TrainingPlan, WorkoutSession};
use crate::recorder::FlightRecorder;
use crate::sync::SyncGuard;

pub type DbPool = SqlitePool;

/// Application state: store, configuration, recorder and abort guard
pub struct AppState {
  pub db: DbPool,
  pub config: MetricsConfig,
  pub recorder: FlightRecorder,
  pub sync: SyncGuard,
}

impl AppState {
  pub fn new(db: DbPool, config: MetricsConfig) -> Self {
    Self {
      db,
      config,
      recorder: FlightRecorder::default(),
      sync: SyncGuard::new(),
    }
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(db_url: &str) -> Result<DbPool, CoachError> {
  info!(db_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");
  Ok(pool)
}

/// ---------------------------------------------------------------------------
/// Sessions
/// ---------------------------------------------------------------------------

const SESSION_COLUMNS: &str = r#"
  id, athlete_id, status, scheduled_at, started_at, completed_at, pre_fatigue,
  total_volume, total_sets, total_reps, avg_intensity, exercises_json
"#;

fn row_to_session(row: &SqliteRow) -> Result<WorkoutSession, CoachError> {
  let exercises_json: String = row.try_get("exercises_json")?;
  let status: String = row.try_get("status")?;
  let pre_fatigue: Option<i64> = row.try_get("pre_fatigue")?;
  let total_sets: i64 = row.try_get("total_sets")?;
  let total_reps: i64 = row.try_get("total_reps")?;

  Ok(WorkoutSession {
    id: row.try_get("id")?,
    athlete_id: row.try_get("athlete_id")?,
    status: status.parse().unwrap_or_default(),
    scheduled_at: row.try_get("scheduled_at")?,
    started_at: row.try_get("started_at")?,
    completed_at: row.try_get("completed_at")?,
    exercises: serde_json::from_str(&exercises_json)?,
    pre_fatigue: pre_fatigue.and_then(|v| u8::try_from(v).ok()),
    totals: SessionTotals {
      total_volume: row.try_get("total_volume")?,
      total_sets: u32::try_from(total_sets).unwrap_or(0),
      total_reps: u32::try_from(total_reps).unwrap_or(0),
      avg_intensity: row.try_get("avg_intensity")?,
    },
  })
}

pub async fn load_session(pool: &DbPool, session_id: &str) -> Result<WorkoutSession, CoachError> {
  let row = sqlx::query(&format!(
    "SELECT {} FROM workout_sessions WHERE id = ?1",
    SESSION_COLUMNS
  ))
  .bind(session_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| CoachError::NotFound(format!("session {}", session_id)))?;

  row_to_session(&row)
}

/// All sessions of an athlete, oldest scheduled first
pub async fn load_sessions_for_athlete(
  pool: &DbPool,
  athlete_id: &str,
) -> Result<Vec<WorkoutSession>, CoachError> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM workout_sessions WHERE athlete_id = ?1 ORDER BY scheduled_at",
    SESSION_COLUMNS
  ))
  .bind(athlete_id)
  .fetch_all(pool)
  .await?;

  rows.iter().map(row_to_session).collect()
}

/// Insert or replace a session together with its exercise entries
pub async fn save_session<'e, E>(executor: E, session: &WorkoutSession) -> Result<(), CoachError>
where
  E: sqlx::Executor<'e, Database = Sqlite>,
{
  let exercises_json = serde_json::to_string(&session.exercises)?;

  sqlx::query(
    r#"
    INSERT INTO workout_sessions (
      id, athlete_id, status, scheduled_at, started_at, completed_at, pre_fatigue,
      total_volume, total_sets, total_reps, avg_intensity, exercises_json, updated_at
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    ON CONFLICT(id) DO UPDATE SET
      athlete_id = excluded.athlete_id,
      status = excluded.status,
      scheduled_at = excluded.scheduled_at,
      started_at = excluded.started_at,
      completed_at = excluded.completed_at,
      pre_fatigue = excluded.pre_fatigue,
      total_volume = excluded.total_volume,
      total_sets = excluded.total_sets,
      total_reps = excluded.total_reps,
      avg_intensity = excluded.avg_intensity,
      exercises_json = excluded.exercises_json,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(&session.id)
  .bind(&session.athlete_id)
  .bind(session.status.to_string())
  .bind(session.scheduled_at)
  .bind(session.started_at)
  .bind(session.completed_at)
  .bind(session.pre_fatigue.map(i64::from))
  .bind(session.totals.total_volume)
  .bind(i64::from(session.totals.total_sets))
  .bind(i64::from(session.totals.total_reps))
  .bind(session.totals.avg_intensity)
  .bind(&exercises_json)
  .bind(Utc::now())
  .execute(executor)
  .await?;

  Ok(())
}

/// Delete a session and everything it owns. Returns false if it did not exist.
pub async fn delete_session(pool: &DbPool, session_id: &str) -> Result<bool, CoachError> {
  let result = sqlx::query("DELETE FROM workout_sessions WHERE id = ?1")
    .bind(session_id)
    .execute(pool)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// ---------------------------------------------------------------------------
/// Training Plans
/// ---------------------------------------------------------------------------

pub async fn load_plan(pool: &DbPool, athlete_id: &str) -> Result<TrainingPlan, CoachError> {
  let row = sqlx::query(
    r#"
    SELECT athlete_id, weekly_volume_target, sessions_per_week, schedule_json
    FROM training_plans
    WHERE athlete_id = ?1
    "#,
  )
  .bind(athlete_id)
  .fetch_optional(pool)
  .await?
  .ok_or_else(|| CoachError::NotFound(format!("training plan for {}", athlete_id)))?;

  let schedule_json: String = row.try_get("schedule_json")?;
  let sessions_per_week: i64 = row.try_get("sessions_per_week")?;

  Ok(TrainingPlan {
    athlete_id: row.try_get("athlete_id")?,
    weekly_volume_target: row.try_get("weekly_volume_target")?,
    sessions_per_week: u32::try_from(sessions_per_week).unwrap_or(0),
    schedule: serde_json::from_str(&schedule_json)?,
  })
}

pub async fn save_plan(pool: &DbPool, plan: &TrainingPlan) -> Result<(), CoachError> {
  sqlx::query(
    r#"
    INSERT INTO training_plans (athlete_id, weekly_volume_target, sessions_per_week, schedule_json, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(athlete_id) DO UPDATE SET
      weekly_volume_target = excluded.weekly_volume_target,
      sessions_per_week = excluded.sessions_per_week,
      schedule_json = excluded.schedule_json,
      updated_at = excluded.updated_at
    "#,
  )
  .bind(&plan.athlete_id)
  .bind(plan.weekly_volume_target)
  .bind(i64::from(plan.sessions_per_week))
  .bind(plan.to_schedule_json())
  .bind(Utc::now())
  .execute(pool)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Exercise Catalog
/// ---------------------------------------------------------------------------

pub async fn load_exercise_catalog(pool: &DbPool) -> Result<HashMap<String, Exercise>, CoachError> {
  let rows = sqlx::query(
    "SELECT id, name, muscle_groups_json, is_bodyweight, rep_cap FROM exercises ORDER BY id",
  )
  .fetch_all(pool)
  .await?;

  let mut catalog = HashMap::with_capacity(rows.len());
  for row in rows {
    let muscle_groups_json: String = row.try_get("muscle_groups_json")?;
    let rep_cap: Option<i64> = row.try_get("rep_cap")?;
    let exercise = Exercise {
      id: row.try_get("id")?,
      name: row.try_get("name")?,
      muscle_groups: serde_json::from_str(&muscle_groups_json)?,
      is_bodyweight: row.try_get("is_bodyweight")?,
      rep_cap: rep_cap.and_then(|v| u32::try_from(v).ok()),
    };
    catalog.insert(exercise.id.clone(), exercise);
  }

  Ok(catalog)
}

pub async fn save_exercise(pool: &DbPool, exercise: &Exercise) -> Result<(), CoachError> {
  sqlx::query(
    r#"
    INSERT INTO exercises (id, name, muscle_groups_json, is_bodyweight, rep_cap)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(id) DO UPDATE SET
      name = excluded.name,
      muscle_groups_json = excluded.muscle_groups_json,
      is_bodyweight = excluded.is_bodyweight,
      rep_cap = excluded.rep_cap
    "#,
  )
  .bind(&exercise.id)
  .bind(&exercise.name)
  .bind(serde_json::to_string(&exercise.muscle_groups)?)
  .bind(exercise.is_bodyweight)
  .bind(exercise.rep_cap.map(i64::from))
  .execute(pool)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Athletes
/// ---------------------------------------------------------------------------

pub async fn load_athlete(pool: &DbPool, athlete_id: &str) -> Result<Athlete, CoachError> {
  sqlx::query_as::<_, Athlete>("SELECT id, name, bodyweight FROM athletes WHERE id = ?1")
    .bind(athlete_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| CoachError::NotFound(format!("athlete {}", athlete_id)))
}

pub async fn save_athlete(pool: &DbPool, athlete: &Athlete) -> Result<(), CoachError> {
  sqlx::query(
    r#"
    INSERT INTO athletes (id, name, bodyweight)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(id) DO UPDATE SET
      name = excluded.name,
      bodyweight = excluded.bodyweight
    "#,
  )
  .bind(&athlete.id)
  .bind(&athlete.name)
  .bind(athlete.bodyweight)
  .execute(pool)
  .await?;

  Ok(())
}
