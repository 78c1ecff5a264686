//! Abort guard for superseded operations
//!
//! Each operation takes a ticket before doing slow work. A newer ticket (or
//! an explicit cancel) supersedes it, and `commit` refuses to run the
//! mutation for a superseded ticket. The check and the mutation run back to
//! back with no await point between them.
//!
//! Async commits go through `acquire`: commits are serialized behind one
//! lock and the generation is checked after the lock is taken, so a ticket
//! superseded before its commit starts never commits, and a newer ticket
//! always commits after any older one still in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::CoachError;

#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
  generation: Arc<AtomicU64>,
  commit_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Clone)]
pub struct SyncTicket {
  generation: Arc<AtomicU64>,
  commit_lock: Arc<Mutex<()>>,
  issued: u64,
}

/// Held while an async commit runs; dropping it lets the next commit in
#[derive(Debug)]
pub struct CommitPermit {
  _lock: OwnedMutexGuard<()>,
}

impl SyncGuard {
  pub fn new() -> Self {
    Self::default()
  }

  /// New ticket; all earlier tickets become stale
  pub fn begin(&self) -> SyncTicket {
    let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    SyncTicket {
      generation: Arc::clone(&self.generation),
      commit_lock: Arc::clone(&self.commit_lock),
      issued,
    }
  }

  /// Invalidate every outstanding ticket
  pub fn cancel(&self) {
    self.generation.fetch_add(1, Ordering::SeqCst);
  }
}

impl SyncTicket {
  pub fn is_current(&self) -> bool {
    self.generation.load(Ordering::SeqCst) == self.issued
  }

  /// Run `mutation` only if this ticket was not superseded
  pub fn commit<T>(&self, mutation: impl FnOnce() -> T) -> Result<T, CoachError> {
    if !self.is_current() {
      return Err(CoachError::Cancelled);
    }
    Ok(mutation())
  }

  /// Wait for the commit lock, then check the ticket. Hold the permit
  /// across the commit's await.
  pub async fn acquire(&self) -> Result<CommitPermit, CoachError> {
    let lock = Arc::clone(&self.commit_lock).lock_owned().await;
    if !self.is_current() {
      return Err(CoachError::Cancelled);
    }
    Ok(CommitPermit { _lock: lock })
  }
}
