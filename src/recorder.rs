//! Flight recorder
//!
//! Bounded in-memory log of notable engine events (rejected transitions,
//! superseded imports, recomputed totals). Owned by `AppState` and passed
//! explicitly; every record is also forwarded to `tracing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
  Debug,
  Info,
  Warn,
  Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
  pub at: DateTime<Utc>,
  pub level: EventLevel,
  pub category: String,
  pub message: String,
}

#[derive(Debug)]
pub struct FlightRecorder {
  capacity: usize,
  events: Mutex<VecDeque<RecordedEvent>>,
}

impl Default for FlightRecorder {
  fn default() -> Self {
    Self::new(DEFAULT_CAPACITY)
  }
}

impl FlightRecorder {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      capacity,
      events: Mutex::new(VecDeque::with_capacity(capacity)),
    }
  }

  pub fn record(&self, level: EventLevel, category: &str, message: impl Into<String>) {
    let message = message.into();
    match level {
      EventLevel::Debug => tracing::debug!(category, "{}", message),
      EventLevel::Info => tracing::info!(category, "{}", message),
      EventLevel::Warn => tracing::warn!(category, "{}", message),
      EventLevel::Error => tracing::error!(category, "{}", message),
    }

    let mut events = self.lock();
    if events.len() == self.capacity {
      events.pop_front();
    }
    events.push_back(RecordedEvent {
      at: Utc::now(),
      level,
      category: category.to_string(),
      message,
    });
  }

  pub fn info(&self, category: &str, message: impl Into<String>) {
    self.record(EventLevel::Info, category, message);
  }

  pub fn warn(&self, category: &str, message: impl Into<String>) {
    self.record(EventLevel::Warn, category, message);
  }

  /// Snapshot, oldest first
  pub fn entries(&self) -> Vec<RecordedEvent> {
    self.lock().iter().cloned().collect()
  }

  pub fn events_in(&self, category: &str) -> Vec<RecordedEvent> {
    self.lock()
      .iter()
      .filter(|e| e.category == category)
      .cloned()
      .collect()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  /// Remove and return everything recorded so far
  pub fn drain(&self) -> Vec<RecordedEvent> {
    self.lock().drain(..).collect()
  }

  pub fn clear(&self) {
    self.lock().clear();
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<RecordedEvent>> {
    // A panic while holding the lock cannot leave the deque half-written
    self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
