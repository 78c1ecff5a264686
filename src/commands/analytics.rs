//! Read-only analytics commands over stored sessions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::adherence::WeeklyAdherence;
use crate::db::{self, AppState};
use crate::error::CoachError;
use crate::one_rep_max::{
  average_estimate, conservative_estimate, effective_load, estimate_one_rm_capped, rep_cap_for,
  working_weight_for_reps, OneRmBreakdown, OneRmFormula,
};
use crate::time_series::{
  monthly_volume_series, weekly_adherence_series, weekly_volume_series, AdherencePoint,
  MonthlyPoint, WeeklyPoint,
};
use crate::trends::WeeklyInsights;

/// Rep targets offered alongside an e1RM
const SUGGESTED_REP_TARGETS: [u32; 4] = [1, 3, 5, 8];

fn lookback(requested: Option<u32>, default: u32, max: u32, unit: &str) -> Result<u32, CoachError> {
  let value = requested.unwrap_or(default);
  if value == 0 || value > max {
    return Err(CoachError::Config(format!(
      "lookback of {} {} outside 1..={}",
      value, unit, max
    )));
  }
  Ok(value)
}

pub async fn get_weekly_adherence(
  state: &AppState,
  athlete_id: &str,
  week_of: NaiveDate,
) -> Result<WeeklyAdherence, CoachError> {
  let plan = db::load_plan(&state.db, athlete_id).await?;
  let sessions = db::load_sessions_for_athlete(&state.db, athlete_id).await?;
  Ok(WeeklyAdherence::compute(&sessions, &plan, week_of, &state.config))
}

pub async fn get_weekly_volume_series(
  state: &AppState,
  athlete_id: &str,
  now: DateTime<Utc>,
  weeks: Option<u32>,
) -> Result<Vec<WeeklyPoint>, CoachError> {
  let weeks = lookback(weeks, state.config.lookback_weeks, 52, "weeks")?;
  let sessions = db::load_sessions_for_athlete(&state.db, athlete_id).await?;
  Ok(weekly_volume_series(&sessions, weeks, now, &state.config))
}

pub async fn get_weekly_adherence_series(
  state: &AppState,
  athlete_id: &str,
  now: DateTime<Utc>,
  weeks: Option<u32>,
) -> Result<Vec<AdherencePoint>, CoachError> {
  let weeks = lookback(weeks, state.config.lookback_weeks, 52, "weeks")?;
  let sessions = db::load_sessions_for_athlete(&state.db, athlete_id).await?;
  Ok(weekly_adherence_series(&sessions, weeks, now))
}

pub async fn get_monthly_volume_series(
  state: &AppState,
  athlete_id: &str,
  now: DateTime<Utc>,
  months: Option<u32>,
) -> Result<Vec<MonthlyPoint>, CoachError> {
  let months = lookback(months, state.config.lookback_months, 24, "months")?;
  let sessions = db::load_sessions_for_athlete(&state.db, athlete_id).await?;
  Ok(monthly_volume_series(&sessions, months, now, &state.config))
}

/// Trends, pattern balance and recommendations for the week containing `week_of`
pub async fn get_weekly_insights(
  state: &AppState,
  athlete_id: &str,
  week_of: NaiveDate,
) -> Result<WeeklyInsights, CoachError> {
  let plan = db::load_plan(&state.db, athlete_id).await?;
  let sessions = db::load_sessions_for_athlete(&state.db, athlete_id).await?;
  let catalog = db::load_exercise_catalog(&state.db).await?;

  let insights = WeeklyInsights::build(&sessions, &plan, &catalog, week_of, &state.config);
  if !insights.recommendations.is_empty() {
    state.recorder.info(
      "insights",
      format!("{} recommendations for {}", insights.recommendations.len(), athlete_id),
    );
  }
  Ok(insights)
}

/// Best set behind an athlete's e1RM for one exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseOneRm {
  pub exercise_id: String,
  pub formula: OneRmFormula,
  pub rep_cap: u32,
  pub best_load: f64,
  pub best_reps: u32,
  pub estimated_one_rm: f64,
  pub conservative: f64,
  pub breakdown: OneRmBreakdown,
  /// (reps, working weight) pairs derived from the estimate
  pub suggested_weights: Vec<(u32, f64)>,
}

/// e1RM from the athlete's completed sets of `exercise_id`.
///
/// Bodyweight exercises use athlete bodyweight plus added load. Returns
/// `Ok(None)` when the athlete has no completed set of the exercise.
pub async fn get_exercise_one_rm(
  state: &AppState,
  athlete_id: &str,
  exercise_id: &str,
) -> Result<Option<ExerciseOneRm>, CoachError> {
  let catalog = db::load_exercise_catalog(&state.db).await?;
  let exercise = catalog
    .get(exercise_id)
    .ok_or_else(|| CoachError::NotFound(format!("exercise {}", exercise_id)))?;

  let bodyweight = match db::load_athlete(&state.db, athlete_id).await {
    Ok(athlete) => athlete.bodyweight,
    Err(CoachError::NotFound(_)) => None,
    Err(e) => return Err(e),
  };

  let formula = state.config.one_rm_formula;
  let rep_cap = rep_cap_for(Some(exercise));
  let sessions = db::load_sessions_for_athlete(&state.db, athlete_id).await?;

  let mut best: Option<(f64, u32, f64)> = None;
  let completed_sets = sessions
    .iter()
    .filter(|s| s.is_completed())
    .flat_map(|s| s.exercises.iter())
    .filter(|e| e.exercise_id == exercise_id)
    .flat_map(|e| e.completed_sets());

  for set in completed_sets {
    let reps = set.actual_reps.unwrap_or(0);
    let load = effective_load(
      exercise,
      set.actual_weight.unwrap_or(0.0),
      bodyweight,
      state.config.default_bodyweight,
    );
    let estimate = estimate_one_rm_capped(load, reps, formula, rep_cap);
    if estimate > best.map_or(0.0, |(_, _, e)| e) {
      best = Some((load, reps, estimate));
    }
  }

  let Some((best_load, best_reps, estimated_one_rm)) = best else {
    return Ok(None);
  };

  let suggested_weights = SUGGESTED_REP_TARGETS
    .iter()
    .map(|&reps| {
      (
        reps,
        working_weight_for_reps(estimated_one_rm, reps, formula, state.config.weight_increment),
      )
    })
    .collect();

  Ok(Some(ExerciseOneRm {
    exercise_id: exercise_id.to_string(),
    formula,
    rep_cap,
    best_load,
    best_reps,
    estimated_one_rm,
    conservative: conservative_estimate(best_load, best_reps),
    breakdown: average_estimate(best_load, best_reps),
    suggested_weights,
  }))
}
