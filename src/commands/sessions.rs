//! Session lifecycle commands
//!
//! Load, transition, persist. Rejections are recorded in the flight recorder
//! and returned to the caller; the stored session is left untouched.

use chrono::Utc;

use crate::aggregate::{compute_session_stats, has_stale_totals, recompute_totals, SessionStats};
use crate::db::{self, AppState};
use crate::error::{CoachError, TransitionError};
use crate::lifecycle::SetResult;
use crate::models::WorkoutSession;
use crate::sync::SyncTicket;

async fn apply_transition<F>(
  state: &AppState,
  session_id: &str,
  action: &str,
  transition: F,
) -> Result<WorkoutSession, CoachError>
where
  F: FnOnce(&mut WorkoutSession) -> Result<(), TransitionError>,
{
  let mut session = db::load_session(&state.db, session_id).await?;

  if let Err(e) = transition(&mut session) {
    state
      .recorder
      .warn("session", format!("{} rejected for {}: {}", action, session_id, e));
    return Err(e.into());
  }

  db::save_session(&state.db, &session).await?;
  state
    .recorder
    .info("session", format!("{} applied to {} ({})", action, session_id, session.status));
  Ok(session)
}

pub async fn start_session(state: &AppState, session_id: &str) -> Result<WorkoutSession, CoachError> {
  apply_transition(state, session_id, "start", |s| s.start(Utc::now())).await
}

/// Complete the session and refresh its cached totals
pub async fn complete_session(state: &AppState, session_id: &str) -> Result<WorkoutSession, CoachError> {
  let config = &state.config;
  apply_transition(state, session_id, "complete", |s| s.complete(Utc::now(), config)).await
}

pub async fn cancel_session(state: &AppState, session_id: &str) -> Result<WorkoutSession, CoachError> {
  apply_transition(state, session_id, "cancel", |s| s.cancel()).await
}

pub async fn uncomplete_session(state: &AppState, session_id: &str) -> Result<WorkoutSession, CoachError> {
  apply_transition(state, session_id, "uncomplete", |s| s.uncomplete()).await
}

pub async fn complete_set(
  state: &AppState,
  session_id: &str,
  exercise_index: usize,
  set_index: usize,
  result: SetResult,
) -> Result<WorkoutSession, CoachError> {
  apply_transition(state, session_id, "complete_set", |s| {
    s.complete_set(exercise_index, set_index, result, Utc::now())
  })
  .await
}

pub async fn uncomplete_set(
  state: &AppState,
  session_id: &str,
  exercise_index: usize,
  set_index: usize,
) -> Result<WorkoutSession, CoachError> {
  apply_transition(state, session_id, "uncomplete_set", |s| {
    s.uncomplete_set(exercise_index, set_index)
  })
  .await
}

/// Stats recomputed from sets. Drifted cached totals are recorded, not trusted.
pub async fn get_session_stats(state: &AppState, session_id: &str) -> Result<SessionStats, CoachError> {
  let session = db::load_session(&state.db, session_id).await?;

  if session.is_completed() && has_stale_totals(&session, &state.config) {
    state.recorder.warn(
      "totals",
      format!("cached totals for {} drifted from set data", session_id),
    );
  }

  Ok(compute_session_stats(&session, &state.config))
}

/// Upsert an external batch of sessions in one transaction.
///
/// Sessions already stored but absent from the batch are left as they are.
/// Superseded by a newer import (or `state.sync.cancel()`), the batch is
/// rolled back and `CoachError::Cancelled` is returned.
pub async fn import_sessions(
  state: &AppState,
  sessions: Vec<WorkoutSession>,
) -> Result<usize, CoachError> {
  let ticket = state.sync.begin();
  import_with_ticket(state, &ticket, sessions).await
}

/// [`import_sessions`] under a ticket the caller already holds
pub async fn import_with_ticket(
  state: &AppState,
  ticket: &SyncTicket,
  sessions: Vec<WorkoutSession>,
) -> Result<usize, CoachError> {
  let normalized: Vec<WorkoutSession> = sessions
    .into_iter()
    .map(|mut s| {
      if s.is_completed() {
        s.totals = recompute_totals(&s, &state.config);
      }
      s
    })
    .collect();
  let count = normalized.len();

  let mut tx = state.db.begin().await?;
  for session in &normalized {
    db::save_session(&mut *tx, session).await?;
  }

  // Dropping `tx` on the error path rolls the batch back
  let permit = match ticket.acquire().await {
    Ok(permit) => permit,
    Err(e) => {
      state
        .recorder
        .warn("import", format!("discarded stale import of {} sessions", count));
      return Err(e);
    }
  };
  tx.commit().await?;
  drop(permit);

  state.recorder.info("import", format!("imported {} sessions", count));
  Ok(count)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{SessionStatus, SetEntry};
  use crate::recorder::EventLevel;
  use crate::test_utils::*;

  #[tokio::test]
  async fn test_full_session_flow() {
    let state = setup_test_state().await;
    let session = mock_session("s1", SessionStatus::Planned, 0, vec![
      mock_exercise_entry("squat", vec![SetEntry::planned(1, 5, 100.0), SetEntry::planned(2, 5, 100.0)]),
    ]);
    db::save_session(&state.db, &session).await.unwrap();

    start_session(&state, "s1").await.unwrap();
    let result = SetResult { reps: 5, weight: 100.0, rpe: Some(8.0), rir: None };
    complete_set(&state, "s1", 0, 0, result).await.unwrap();
    complete_set(&state, "s1", 0, 1, result).await.unwrap();
    uncomplete_set(&state, "s1", 0, 1).await.unwrap();
    complete_set(&state, "s1", 0, 1, result).await.unwrap();
    assert!(matches!(
      complete_set(&state, "s1", 3, 0, result).await,
      Err(CoachError::Transition(TransitionError::SetNotFound { .. }))
    ));
    let completed = complete_session(&state, "s1").await.unwrap();

    assert_eq!(completed.status, SessionStatus::Completed);
    assert_eq!(completed.totals.total_volume, 1000.0);

    let stored = db::load_session(&state.db, "s1").await.unwrap();
    assert_eq!(stored.totals, completed.totals);

    let stats = get_session_stats(&state, "s1").await.unwrap();
    assert_eq!(stats.total_volume, 1000.0);
    assert!(state.recorder.events_in("totals").is_empty());

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_rejected_transition_is_recorded_and_not_saved() {
    let state = setup_test_state().await;
    db::save_session(&state.db, &mock_session("s1", SessionStatus::Planned, 0, vec![]))
      .await
      .unwrap();

    let err = complete_session(&state, "s1").await.unwrap_err();
    assert!(matches!(err, CoachError::Transition(_)));

    let stored = db::load_session(&state.db, "s1").await.unwrap();
    assert_eq!(stored.status, SessionStatus::Planned);

    let events = state.recorder.events_in("session");
    assert_eq!(events.len(), 1);
    assert!(events[0].message.contains("complete rejected"));

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_cancel_and_uncomplete() {
    let state = setup_test_state().await;
    db::save_session(&state.db, &mock_session("p", SessionStatus::Planned, 0, vec![])).await.unwrap();
    db::save_session(&state.db, &mock_session("c", SessionStatus::Completed, 1, vec![])).await.unwrap();

    assert_eq!(cancel_session(&state, "p").await.unwrap().status, SessionStatus::Cancelled);
    assert_eq!(uncomplete_session(&state, "c").await.unwrap().status, SessionStatus::InProgress);
    assert!(matches!(start_session(&state, "missing").await, Err(CoachError::NotFound(_))));

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_stale_totals_are_recorded() {
    let state = setup_test_state().await;
    let session = mock_session("s1", SessionStatus::Completed, 0, vec![
      mock_exercise_entry("squat", vec![mock_set(100.0, 5, Some(8.0))]),
    ]);
    // Saved without refreshing totals
    db::save_session(&state.db, &session).await.unwrap();

    let stats = get_session_stats(&state, "s1").await.unwrap();
    assert_eq!(stats.total_volume, 500.0);
    assert_eq!(state.recorder.events_in("totals").len(), 1);

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_import_refreshes_totals() {
    let state = setup_test_state().await;
    let sessions = vec![
      mock_session("a", SessionStatus::Completed, 2, vec![
        mock_exercise_entry("squat", vec![mock_set(100.0, 5, Some(8.0))]),
      ]),
      mock_session("b", SessionStatus::Planned, -2, vec![]),
    ];

    assert_eq!(import_sessions(&state, sessions).await.unwrap(), 2);
    let stored = db::load_session(&state.db, "a").await.unwrap();
    assert_eq!(stored.totals.total_volume, 500.0);

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_superseded_import_rolls_back() {
    let state = setup_test_state().await;
    let stale = state.sync.begin();
    let _newer = state.sync.begin();

    let sessions = vec![
      mock_session("a", SessionStatus::Completed, 2, vec![]),
      mock_session("b", SessionStatus::Planned, -2, vec![]),
    ];
    let result = import_with_ticket(&state, &stale, sessions).await;
    assert!(matches!(result, Err(CoachError::Cancelled)));

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_sessions")
      .fetch_one(&state.db)
      .await
      .unwrap();
    assert_eq!(stored, 0);

    let events = state.recorder.events_in("import");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, EventLevel::Warn);

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_cancelled_import_keeps_existing_sessions() {
    let state = setup_test_state().await;
    db::save_session(&state.db, &mock_session("kept", SessionStatus::Planned, 0, vec![]))
      .await
      .unwrap();

    let ticket = state.sync.begin();
    state.sync.cancel();
    let sessions = vec![mock_session("kept", SessionStatus::Cancelled, 0, vec![])];
    assert!(import_with_ticket(&state, &ticket, sessions).await.is_err());

    let stored = db::load_session(&state.db, "kept").await.unwrap();
    assert_eq!(stored.status, SessionStatus::Planned);

    teardown_test_db(state.db).await;
  }
}
