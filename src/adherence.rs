//! Weekly adherence and scoring
//!
//! Plan vs. reality for one Monday-start week: session adherence, volume
//! deviation and a 0-100 weekly score blending the two (60/40).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::compute_session_stats;
use crate::config::MetricsConfig;
use crate::models::{TrainingPlan, WorkoutSession};
use crate::round_half_up;
use crate::time_series::week_start;

const SESSION_WEIGHT: f64 = 0.6;
const VOLUME_WEIGHT: f64 = 0.4;

/// Score at or above which a week counts as on track
pub const ON_TRACK_SCORE: f64 = 70.0;

// ---------------------------------------------------------------------------
/// Score Tier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Excellent,
    Good,
    Warning,
    Poor,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => ScoreTier::Excellent,
            s if s >= 70.0 => ScoreTier::Good,
            s if s >= 50.0 => ScoreTier::Warning,
            _ => ScoreTier::Poor,
        }
    }
}

// ---------------------------------------------------------------------------
/// Scoring primitives
// ---------------------------------------------------------------------------

/// `round(completed / planned × 100)`; may exceed 100.
///
/// Nothing planned: 100 if anything was done, else 0.
pub fn adherence_percentage(completed: u32, planned: u32) -> f64 {
    if planned == 0 {
        return if completed > 0 { 100.0 } else { 0.0 };
    }
    round_half_up(completed as f64 / planned as f64 * 100.0)
}

/// `round((actual - target) / target × 100)`, 0 when there is no target
pub fn volume_deviation(actual: f64, target: f64) -> f64 {
    if !(target > 0.0) || !actual.is_finite() {
        return 0.0;
    }
    round_half_up((actual - target) / target * 100.0)
}

/// `round(min(pct, 100) × 0.6 + max(0, 100 - |deviation|) × 0.4)`
pub fn weekly_score(percentage: f64, deviation: f64) -> f64 {
    let session_part = percentage.clamp(0.0, 100.0) * SESSION_WEIGHT;
    let volume_part = (100.0 - deviation.abs()).max(0.0) * VOLUME_WEIGHT;
    round_half_up(session_part + volume_part)
}

pub fn is_on_track(score: f64) -> bool {
    score >= ON_TRACK_SCORE
}

// ---------------------------------------------------------------------------
/// Weekly Adherence
// ---------------------------------------------------------------------------

/// Derived per request from sessions and plan; never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAdherence {
    pub week_start: NaiveDate,
    pub planned: u32,
    pub completed: u32,
    pub percentage: f64,
    pub volume_target: f64,
    pub volume_actual: f64,
    pub volume_deviation: f64,
    pub weekly_score: f64,
    pub tier: ScoreTier,
    pub on_track: bool,
}

impl WeeklyAdherence {
    pub fn from_counts(
        week_start: NaiveDate,
        planned: u32,
        completed: u32,
        volume_target: f64,
        volume_actual: f64,
    ) -> Self {
        let percentage = adherence_percentage(completed, planned);
        let deviation = volume_deviation(volume_actual, volume_target);
        let score = weekly_score(percentage, deviation);

        Self {
            week_start,
            planned,
            completed,
            percentage,
            volume_target,
            volume_actual,
            volume_deviation: deviation,
            weekly_score: score,
            tier: ScoreTier::from_score(score),
            on_track: is_on_track(score),
        }
    }

    /// Adherence of the plan's athlete for the week containing `week_of`.
    ///
    /// Completed sessions count by completion date; volume is recomputed from
    /// sets rather than read from cached totals.
    pub fn compute(
        sessions: &[WorkoutSession],
        plan: &TrainingPlan,
        week_of: NaiveDate,
        config: &MetricsConfig,
    ) -> Self {
        let start = week_start(week_of);

        let done: Vec<&WorkoutSession> = sessions
            .iter()
            .filter(|s| s.athlete_id == plan.athlete_id && s.is_completed())
            .filter(|s| week_start(s.effective_date()) == start)
            .collect();

        let volume_actual: f64 = done
            .iter()
            .map(|s| compute_session_stats(s, config).total_volume)
            .sum();

        Self::from_counts(
            start,
            plan.sessions_per_week,
            done.len() as u32,
            plan.weekly_volume_target,
            volume_actual,
        )
    }
}
