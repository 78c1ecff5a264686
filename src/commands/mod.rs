pub mod analytics;
pub mod sessions;

pub use analytics::{
  get_exercise_one_rm, get_monthly_volume_series, get_weekly_adherence,
  get_weekly_adherence_series, get_weekly_insights, get_weekly_volume_series, ExerciseOneRm,
};
pub use sessions::{
  cancel_session, complete_session, complete_set, get_session_stats, import_sessions, import_with_ticket,
  start_session, uncomplete_session, uncomplete_set,
};

use crate::db::{self, AppState};
use crate::error::CoachError;
use crate::models::WorkoutSession;

/// Most recent sessions of an athlete, newest first
pub async fn get_sessions(
  state: &AppState,
  athlete_id: &str,
  limit: usize,
) -> Result<Vec<WorkoutSession>, CoachError> {
  let mut sessions = db::load_sessions_for_athlete(&state.db, athlete_id).await?;
  sessions.reverse();
  sessions.truncate(limit);
  Ok(sessions)
}
