//! Timers
//!
//! Debouncing needs exactly one host facility: "run this later, unless I
//! change my mind". This module abstracts that behind the [`Scheduler`]
//! trait so the debounce logic never touches wall-clock time directly.
//!
//! # Implementations
//!
//! - [`VirtualScheduler`]: a manually advanced clock. Time only moves when
//!   the caller says so, which makes timing behaviour fully deterministic
//!   in tests.
//! - [`TokioScheduler`]: spawns a task on a tokio runtime that sleeps for
//!   the requested delay.
//!
//! # Ownership
//!
//! Scheduling returns a [`TimerHandle`]. The handle owns the timer: dropping
//! or cancelling it guarantees the task will not run afterwards (modulo a
//! task that is already running on another thread).

mod virtual_clock;
mod tokio_timer;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub use virtual_clock::VirtualScheduler;
pub use tokio_timer::TokioScheduler;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run a task after a delay.
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed.
    ///
    /// The returned handle cancels the task when dropped.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Unique identifier for a scheduled timer.
///
/// Ids are handed out in creation order, so they double as a tie-breaker
/// for timers sharing a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Generate a new unique timer ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Owning handle to one outstanding timer.
pub struct TimerHandle {
    id: TimerId,
    abort: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    /// Create a handle that runs `abort` when the timer is cancelled.
    pub fn new<F>(id: TimerId, abort: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            abort: Some(Box::new(abort)),
        }
    }

    /// Get the timer's ID.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancel the timer. Its task will not run.
    pub fn cancel(self) {
        drop(self);
    }

    /// Release the handle without cancelling.
    ///
    /// Used once the timer has fired and there is nothing left to abort.
    pub fn disarm(mut self) {
        self.abort = None;
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("armed", &self.abort.is_some())
            .finish()
    }
}
