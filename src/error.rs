use serde::Serialize;

use crate::models::SessionStatus;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CoachError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration failed: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Invalid configuration: {0}")]
  Config(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Transition(#[from] TransitionError),

  #[error("Operation superseded by a newer request")]
  Cancelled,
}

impl Serialize for CoachError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Rejected session or set mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionError {
  #[error("Cannot {action} a session that is {from}")]
  InvalidTransition {
    action: &'static str,
    from: SessionStatus,
  },

  #[error("Sets of a {status} session are read-only")]
  SessionLocked { status: SessionStatus },

  #[error("No set {set_index} in exercise {exercise_index}")]
  SetNotFound {
    exercise_index: usize,
    set_index: usize,
  },
}
