//! Tokio-backed timers.
//!
//! Each scheduled task becomes a spawned tokio task that sleeps for the
//! delay and then runs. Cancelling aborts the spawned task. A task whose
//! sleep has already completed may still be running when the abort lands;
//! callers that care (the debouncer does) must tolerate a late firing.

use std::time::Duration;

use tokio::runtime::Handle;
use tracing::trace;

use super::{Scheduler, Task, TimerHandle, TimerId};
use crate::error::Result;

/// Scheduler that runs tasks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Schedule onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Schedule onto the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. Use
    /// [`TokioScheduler::try_current`] to handle that case.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Schedule onto the current runtime, if there is one.
    pub fn try_current() -> Result<Self> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let id = TimerId::new();
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        TimerHandle::new(id, move || {
            trace!(timer = id.raw(), "aborting tokio timer");
            join.abort();
        })
    }
}
