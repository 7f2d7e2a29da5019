//! Virtual Clock
//!
//! A scheduler whose time only moves when told to. Timers are kept in a
//! deadline-ordered map; advancing the clock pops due timers one at a
//! time and runs them.
//!
//! # Firing Order
//!
//! 1. Timers fire in deadline order. Equal deadlines fire in the order
//!    they were scheduled.
//!
//! 2. Before a task runs, the clock is moved to that task's deadline, so
//!    the task observes the time it was meant to fire at.
//!
//! 3. A task may schedule new timers. If those fall inside the span being
//!    advanced, they fire during the same `advance` call.
//!
//! Tasks run with the clock unlocked, so they are free to call back into
//! the scheduler.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use super::{Scheduler, Task, TimerHandle, TimerId};

/// Shared clock state.
#[derive(Default)]
struct Clock {
    /// Current virtual time, measured from the scheduler's creation.
    now: Duration,

    /// Outstanding timers keyed by (deadline, creation order).
    timers: BTreeMap<(Duration, TimerId), Task>,
}

/// A manually advanced scheduler for deterministic tests.
///
/// Clones share the same clock.
///
/// # Example
///
/// ```rust,ignore
/// let clock = VirtualScheduler::new();
/// let _timer = clock.schedule(Duration::from_millis(100), Box::new(|| println!("tick")));
///
/// clock.advance(Duration::from_millis(99));  // nothing yet
/// clock.advance(Duration::from_millis(1));   // prints "tick"
/// ```
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    clock: Arc<Mutex<Clock>>,
}

impl VirtualScheduler {
    /// Create a clock starting at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    /// Number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        self.clock.lock().timers.len()
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        self.advance_to(target);
    }

    /// Move the clock to `target`, firing every timer that falls due.
    ///
    /// Targets in the past leave the clock where it is.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let task = {
                let mut clock = self.clock.lock();
                let due = clock
                    .timers
                    .keys()
                    .next()
                    .copied()
                    .filter(|(deadline, _)| *deadline <= target);

                match due {
                    Some(key) => {
                        clock.now = clock.now.max(key.0);
                        clock.timers.remove(&key)
                    }
                    None => {
                        clock.now = clock.now.max(target);
                        None
                    }
                }
            };

            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Fire timers until none remain, moving the clock as needed.
    pub fn run_until_idle(&self) {
        loop {
            let next = self.clock.lock().timers.keys().next().map(|(deadline, _)| *deadline);
            match next {
                Some(deadline) => self.advance_to(deadline),
                None => break,
            }
        }
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let id = TimerId::new();
        let key = {
            let mut clock = self.clock.lock();
            let key = (clock.now + delay, id);
            clock.timers.insert(key, task);
            key
        };

        let clock: Weak<Mutex<Clock>> = Arc::downgrade(&self.clock);
        TimerHandle::new(id, move || {
            if let Some(clock) = clock.upgrade() {
                // Pull the task out first so it is dropped after the lock is released.
                let task = clock.lock().timers.remove(&key);
                drop(task);
            }
        })
    }
}

impl std::fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.clock.lock();
        f.debug_struct("VirtualScheduler")
            .field("now", &clock.now)
            .field("pending_timers", &clock.timers.len())
            .finish()
    }
}
