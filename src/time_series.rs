//! Weekly and monthly chart series
//!
//! Buckets are contiguous: weeks or months without sessions still get an
//! entry so charts show gaps instead of skipping them. Weeks start on Monday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::compute_session_stats;
use crate::config::MetricsConfig;
use crate::models::{SessionStatus, WorkoutSession};
use crate::round_half_up;

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
  date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

/// Monday-start week windows ending with the week containing `now`, ascending
pub fn week_windows(weeks: u32, now: DateTime<Utc>) -> Vec<NaiveDate> {
  let current = week_start(now.date_naive());
  (0..weeks as i64)
    .rev()
    .map(|i| current - Duration::weeks(i))
    .collect()
}

fn month_windows(months: u32, now: DateTime<Utc>) -> Vec<NaiveDate> {
  let today = now.date_naive();
  let current = today.year() * 12 + today.month0() as i32;
  (0..months as i32)
    .rev()
    .filter_map(|i| {
      let index = current - i;
      NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Volume / Intensity Buckets
/// ---------------------------------------------------------------------------

/// Running totals for one time bucket.
///
/// Intensity and fatigue use an incremental mean so raw samples are never kept.
#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
  volume: f64,
  sets: u32,
  sessions: u32,
  avg_intensity: f64,
  avg_fatigue: f64,
}

impl Bucket {
  fn add(&mut self, session: &WorkoutSession, config: &MetricsConfig) {
    let stats = compute_session_stats(session, config);

    self.volume += stats.total_volume;
    self.sets += stats.total_sets;
    self.sessions += 1;

    let n = self.sessions as f64;
    self.avg_intensity = (self.avg_intensity * (n - 1.0) + stats.avg_intensity) / n;
    self.avg_fatigue = (self.avg_fatigue * (n - 1.0) + stats.avg_fatigue) / n;
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPoint {
  pub week_start: NaiveDate,
  pub label: String,
  pub volume: f64,
  /// Volume in the configured display unit
  pub display_volume: f64,
  pub sets: u32,
  pub sessions: u32,
  pub avg_intensity: f64,
  pub avg_fatigue: f64,
}

/// One entry per week for the last `weeks` weeks, ascending, empty weeks included.
///
/// Completed sessions land in the week of their completion date.
pub fn weekly_volume_series(
  sessions: &[WorkoutSession],
  weeks: u32,
  now: DateTime<Utc>,
  config: &MetricsConfig,
) -> Vec<WeeklyPoint> {
  let windows = week_windows(weeks, now);
  let mut buckets = vec![Bucket::default(); windows.len()];

  let Some(first) = windows.first().copied() else {
    return Vec::new();
  };

  for session in sessions.iter().filter(|s| s.is_completed()) {
    if let Some(idx) = week_index(first, windows.len(), session.effective_date()) {
      buckets[idx].add(session, config);
    }
  }

  windows
    .into_iter()
    .zip(buckets)
    .map(|(start, bucket)| WeeklyPoint {
      week_start: start,
      label: start.format("%b %d").to_string(),
      volume: bucket.volume,
      display_volume: config.volume_mode.display(bucket.volume),
      sets: bucket.sets,
      sessions: bucket.sessions,
      avg_intensity: bucket.avg_intensity,
      avg_fatigue: bucket.avg_fatigue,
    })
    .collect()
}

fn week_index(first: NaiveDate, len: usize, date: NaiveDate) -> Option<usize> {
  let days = (week_start(date) - first).num_days();
  if days < 0 {
    return None;
  }
  let idx = (days / 7) as usize;
  (idx < len).then_some(idx)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
  pub month_start: NaiveDate,
  pub label: String,
  pub volume: f64,
  pub display_volume: f64,
  pub sets: u32,
  pub sessions: u32,
  pub avg_intensity: f64,
  pub avg_fatigue: f64,
}

/// Calendar-month variant of [`weekly_volume_series`]
pub fn monthly_volume_series(
  sessions: &[WorkoutSession],
  months: u32,
  now: DateTime<Utc>,
  config: &MetricsConfig,
) -> Vec<MonthlyPoint> {
  let windows = month_windows(months, now);
  let mut buckets = vec![Bucket::default(); windows.len()];

  for session in sessions.iter().filter(|s| s.is_completed()) {
    let start = month_start(session.effective_date());
    if let Some(idx) = windows.iter().position(|w| *w == start) {
      buckets[idx].add(session, config);
    }
  }

  windows
    .into_iter()
    .zip(buckets)
    .map(|(start, bucket)| MonthlyPoint {
      month_start: start,
      label: start.format("%b %Y").to_string(),
      volume: bucket.volume,
      display_volume: config.volume_mode.display(bucket.volume),
      sets: bucket.sets,
      sessions: bucket.sessions,
      avg_intensity: bucket.avg_intensity,
      avg_fatigue: bucket.avg_fatigue,
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Adherence Series
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherencePoint {
  pub week_start: NaiveDate,
  pub label: String,
  pub planned: u32,
  pub completed: u32,
  /// completed / planned × 100, rounded. Bonus sessions in an unplanned week count as 100.
  pub adherence_rate: f64,
}

/// Planned sessions bucket by scheduled date, completed ones by completion
/// date (falling back to the scheduled date). Reserved slots are not plans.
pub fn weekly_adherence_series(
  sessions: &[WorkoutSession],
  weeks: u32,
  now: DateTime<Utc>,
) -> Vec<AdherencePoint> {
  let windows = week_windows(weeks, now);
  let Some(first) = windows.first().copied() else {
    return Vec::new();
  };

  let mut planned = vec![0u32; windows.len()];
  let mut completed = vec![0u32; windows.len()];

  for session in sessions {
    if session.status != SessionStatus::Reserved {
      if let Some(idx) = week_index(first, windows.len(), session.scheduled_date()) {
        planned[idx] += 1;
      }
    }
    if session.is_completed() {
      if let Some(idx) = week_index(first, windows.len(), session.effective_date()) {
        completed[idx] += 1;
      }
    }
  }

  windows
    .into_iter()
    .enumerate()
    .map(|(idx, start)| AdherencePoint {
      week_start: start,
      label: start.format("%b %d").to_string(),
      planned: planned[idx],
      completed: completed[idx],
      adherence_rate: adherence_rate(completed[idx], planned[idx]),
    })
    .collect()
}

pub fn adherence_rate(completed: u32, planned: u32) -> f64 {
  match (planned, completed) {
    (0, 0) => 0.0,
    (0, _) => 100.0,
    (p, c) => round_half_up(c as f64 / p as f64 * 100.0),
  }
}
