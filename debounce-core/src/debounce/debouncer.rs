//! Debouncer Implementation
//!
//! A `Debouncer` wraps a function and coalesces bursts of calls to it.
//!
//! # How Debouncing Works
//!
//! 1. The first call of a burst opens a window and arms a timer for the
//!    configured wait.
//!
//! 2. Each further call inside the window re-arms the timer, pushing the
//!    expiry back. The previous timer is cancelled, never queued.
//!
//! 3. Trailing edge: when the timer finally expires, the function runs
//!    once with the arguments of the last call.
//!
//! 4. Leading edge: the function runs synchronously on the first call;
//!    expiry only closes the window so the next call can fire again.
//!
//! # Outcomes
//!
//! Every call returns an [`Outcome`]. All outcomes from one window resolve
//! with that window's single result: the leading call's return value, or
//! the return value of the trailing invocation. Cancelling the window
//! rejects them with [`DebounceError::Cancelled`](crate::DebounceError::Cancelled).
//!
//! # Locking
//!
//! Window state sits behind one mutex. The wrapped function is never run
//! while that mutex is held, so it may freely call other debouncers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::config::{DebounceConfig, Edge};
use super::outcome::Outcome;
use super::state::{Core, DebounceState, State, Window};
use crate::timer::{Scheduler, TimerHandle};

/// Counter for generating unique debouncer IDs.
static DEBOUNCER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique debouncer ID.
fn next_debouncer_id() -> u64 {
    DEBOUNCER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// State shared between the handle and its armed timers.
///
/// Timers only hold a `Weak` to this, so dropping the [`Debouncer`]
/// releases it even while a timer is outstanding.
struct Shared<A, R> {
    id: u64,
    func: Box<dyn Fn(A) -> R + Send + Sync>,
    config: DebounceConfig,
    scheduler: Arc<dyn Scheduler>,
    core: Mutex<Core<A, R>>,
    invocations: AtomicUsize,
}

impl<A, R> Shared<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    fn invoke(&self, args: A) -> R {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        (self.func)(args)
    }

    /// Arm a timer that expires `ticket` after the configured wait.
    fn arm(self: &Arc<Self>, ticket: u64) -> TimerHandle {
        let shared: Weak<Self> = Arc::downgrade(self);
        self.scheduler.schedule(
            self.config.wait(),
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.expire(ticket);
                }
            }),
        )
    }

    /// Timer callback: close the window if `ticket` is still the armed one.
    fn expire(&self, ticket: u64) {
        let window = {
            let mut core = self.core.lock();
            match &core.state {
                State::Pending(window) if window.armed == ticket => {}
                _ => {
                    trace!(debouncer = self.id, ticket, "ignoring stale expiry");
                    return;
                }
            }
            core.state.close()
        };
        let Some(window) = window else { return };

        let Window {
            timer,
            args,
            waiters,
            ..
        } = window;
        timer.disarm();

        match (self.config.edge(), args) {
            (Edge::Trailing, Some(args)) => {
                debug!(debouncer = self.id, ticket, "window expired, firing trailing call");
                let result = self.invoke(args);
                Window::<A, R>::resolve(waiters, &result);
            }
            _ => {
                debug!(debouncer = self.id, ticket, "window expired");
                // Leading waiters were resolved as soon as the leading call returned.
                drop(waiters);
            }
        }
    }

    /// Record the leading call's result and release anyone who queued
    /// behind it while it ran.
    fn settle_leading(&self, window_id: u64, result: &R) {
        let waiters = {
            let mut core = self.core.lock();
            match &mut core.state {
                State::Pending(window) if window.id == window_id => {
                    window.leading = Some(result.clone());
                    std::mem::take(&mut window.waiters)
                }
                _ => return,
            }
        };
        Window::<A, R>::resolve(waiters, result);
    }

    fn cancel(&self) {
        let window = self.core.lock().state.close();
        if let Some(window) = window {
            debug!(debouncer = self.id, window = window.id, "cancelling pending window");
            window.timer.cancel();
            Window::<A, R>::reject(window.waiters);
        }
    }
}

/// Debounced wrapper around a function.
///
/// # Type Parameters
///
/// - `A`: The argument type. Use a tuple for several arguments.
/// - `R`: The return type. Must be `Clone` so one result can resolve
///   every caller in a window.
///
/// # Example
///
/// ```rust,ignore
/// let clock = VirtualScheduler::new();
/// let search = Debouncer::new(|q: &'static str| println!("search {q}"), clock.clone());
///
/// search.call("r");
/// search.call("ru");
/// search.call("rust");
///
/// clock.advance(Duration::from_millis(500));  // Prints: "search rust"
/// ```
///
/// Dropping a `Debouncer` cancels its pending window.
pub struct Debouncer<A, R = ()>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    shared: Arc<Shared<A, R>>,
}

impl<A, R> Debouncer<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Debounce `func` with the default config (trailing, 500ms).
    pub fn new<F, S>(func: F, scheduler: S) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        S: Scheduler + 'static,
    {
        Self::with_config(func, DebounceConfig::default(), scheduler)
    }

    /// Debounce `func` with an explicit config.
    ///
    /// Nothing is scheduled and `func` is not called until the first
    /// [`call`](Self::call).
    pub fn with_config<F, S>(func: F, config: DebounceConfig, scheduler: S) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        S: Scheduler + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                id: next_debouncer_id(),
                func: Box::new(func),
                config,
                scheduler: Arc::new(scheduler),
                core: Mutex::new(Core::new()),
                invocations: AtomicUsize::new(0),
            }),
        }
    }

    /// Get the debouncer's unique ID.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// The config this debouncer was built with.
    pub fn config(&self) -> &DebounceConfig {
        &self.shared.config
    }

    /// Current state of the window.
    pub fn state(&self) -> DebounceState {
        self.shared.core.lock().state.public()
    }

    /// Whether a window is open.
    pub fn is_pending(&self) -> bool {
        self.state() == DebounceState::Pending
    }

    /// Number of times the wrapped function has run.
    pub fn invocations(&self) -> usize {
        self.shared.invocations.load(Ordering::SeqCst)
    }

    /// Call the debounced function.
    ///
    /// On the leading edge of an idle debouncer this runs the function
    /// right away and the returned outcome is already resolved. Otherwise
    /// the call (re)arms the timer and the outcome resolves when the
    /// window settles.
    pub fn call(&self, args: A) -> Outcome<R> {
        let shared = &self.shared;
        let leading = shared.config.edge() == Edge::Leading;

        let mut guard = shared.core.lock();
        let core = &mut *guard;
        let ticket = core.ticket();

        match &mut core.state {
            State::Idle => {
                let mut window = Window::new(ticket, shared.arm(ticket));
                debug!(
                    debouncer = shared.id,
                    ticket,
                    wait_ms = shared.config.wait_ms,
                    leading,
                    "opening window"
                );

                if leading {
                    core.state = State::Pending(window);
                    drop(guard);

                    let result = shared.invoke(args);
                    shared.settle_leading(ticket, &result);
                    Outcome::ready(result)
                } else {
                    let (tx, rx) = oneshot::channel();
                    window.args = Some(args);
                    window.waiters.push(tx);
                    core.state = State::Pending(window);
                    Outcome::waiting(rx)
                }
            }
            State::Pending(window) => {
                trace!(debouncer = shared.id, ticket, window = window.id, "resetting timer");
                window.rearm(ticket, shared.arm(ticket));

                if leading {
                    if let Some(result) = &window.leading {
                        return Outcome::ready(result.clone());
                    }
                    // The leading call is still running on another thread.
                    let (tx, rx) = oneshot::channel();
                    window.waiters.push(tx);
                    Outcome::waiting(rx)
                } else {
                    let (tx, rx) = oneshot::channel();
                    window.args = Some(args);
                    window.waiters.push(tx);
                    Outcome::waiting(rx)
                }
            }
        }
    }

    /// Cancel the pending window, if any.
    ///
    /// The wrapped function will not run for this window and every caller
    /// still waiting on it is rejected. Safe to call at any time.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// A detached handle that can cancel this debouncer.
    ///
    /// The handle does not keep the debouncer alive; once the debouncer is
    /// dropped, cancelling through it does nothing.
    pub fn canceller(&self) -> Canceller {
        let shared: Weak<Shared<A, R>> = Arc::downgrade(&self.shared);
        Canceller {
            cancel: Arc::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.cancel();
                }
            }),
        }
    }
}

impl<A, R> Drop for Debouncer<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if self.is_pending() {
            debug!(debouncer = self.shared.id, "debouncer dropped with a pending window");
        }
        self.shared.cancel();
    }
}

impl<A, R> std::fmt::Debug for Debouncer<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .field("invocations", &self.invocations())
            .finish()
    }
}

/// Cloneable handle that cancels a [`Debouncer`]'s pending window.
#[derive(Clone)]
pub struct Canceller {
    cancel: Arc<dyn Fn() + Send + Sync>,
}

impl Canceller {
    /// Cancel the pending window, if the debouncer still exists.
    pub fn cancel(&self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for Canceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canceller").finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::VirtualScheduler;
    use crate::DebounceError;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// A debouncer that records `(virtual time, argument)` for every run.
    fn recording(
        config: DebounceConfig,
    ) -> (
        Debouncer<&'static str, &'static str>,
        VirtualScheduler,
        Arc<Mutex<Vec<(Duration, &'static str)>>>,
    ) {
        let clock = VirtualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let clock_clone = clock.clone();

        let debouncer = Debouncer::with_config(
            move |arg: &'static str| {
                log_clone.lock().push((clock_clone.now(), arg));
                arg
            },
            config,
            clock.clone(),
        );

        (debouncer, clock, log)
    }

    #[test]
    fn construction_has_no_side_effects() {
        let (debouncer, clock, log) = recording(DebounceConfig::default());

        assert_eq!(debouncer.state(), DebounceState::Idle);
        assert_eq!(clock.pending_timers(), 0);
        assert_eq!(debouncer.invocations(), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn trailing_fires_last_arguments_once() {
        let (debouncer, clock, log) = recording(DebounceConfig::trailing(ms(1000)));

        debouncer.call("a");
        clock.advance(ms(300));
        debouncer.call("b");

        clock.advance_to(ms(1299));
        assert!(log.lock().is_empty());
        assert!(debouncer.is_pending());

        clock.advance_to(ms(1300));
        assert_eq!(*log.lock(), vec![(ms(1300), "b")]);
        assert!(!debouncer.is_pending());

        clock.advance(ms(5000));
        assert_eq!(debouncer.invocations(), 1);
    }

    #[test]
    fn trailing_resolves_every_waiter_with_window_result() {
        let (debouncer, clock, _log) = recording(DebounceConfig::trailing(ms(100)));

        let mut first = debouncer.call("a");
        let mut second = debouncer.call("b");
        let mut third = debouncer.call("c");
        assert!(first.try_take().is_none());

        clock.advance(ms(100));

        assert_eq!(first.try_take().unwrap().unwrap(), "c");
        assert_eq!(second.try_take().unwrap().unwrap(), "c");
        assert_eq!(third.try_take().unwrap().unwrap(), "c");
    }

    #[test]
    fn leading_fires_immediately_and_suppresses_burst() {
        let (debouncer, clock, log) = recording(DebounceConfig::leading(ms(1000)));

        let mut first = debouncer.call("a");
        assert!(first.is_ready());
        assert_eq!(*log.lock(), vec![(ms(0), "a")]);

        clock.advance(ms(200));
        let mut second = debouncer.call("b");

        // Suppressed calls share the leading result.
        assert_eq!(second.try_take().unwrap().unwrap(), "a");
        assert_eq!(first.try_take().unwrap().unwrap(), "a");

        // The reset expiry does not fire either.
        clock.advance(ms(5000));
        assert_eq!(debouncer.invocations(), 1);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn leading_timer_resets_on_each_call() {
        let (debouncer, clock, log) = recording(DebounceConfig::leading(ms(1000)));

        debouncer.call("a");
        clock.advance_to(ms(200));
        debouncer.call("b");

        // Quiet period restarted at t=200, so t=1100 is still inside it.
        clock.advance_to(ms(1100));
        debouncer.call("c");
        assert_eq!(log.lock().len(), 1);

        // Quiet since t=1100; next window opens at t=2100.
        clock.advance_to(ms(2100));
        debouncer.call("d");
        assert_eq!(*log.lock(), vec![(ms(0), "a"), (ms(2100), "d")]);
    }

    #[test]
    fn leading_fires_again_after_quiet_period() {
        let (debouncer, clock, log) = recording(DebounceConfig::leading(ms(1000)));

        debouncer.call("a");
        clock.advance_to(ms(1100));
        debouncer.call("b");

        assert_eq!(*log.lock(), vec![(ms(0), "a"), (ms(1100), "b")]);
    }

    #[test]
    fn cancel_prevents_invocation_and_rejects_waiters() {
        let (debouncer, clock, log) = recording(DebounceConfig::trailing(ms(1000)));

        let mut outcome = debouncer.call("a");
        clock.advance(ms(500));
        debouncer.cancel();

        assert_eq!(debouncer.state(), DebounceState::Idle);
        assert_eq!(clock.pending_timers(), 0);

        clock.advance(ms(5000));
        assert!(log.lock().is_empty());
        assert!(matches!(
            outcome.try_take(),
            Some(Err(DebounceError::Cancelled))
        ));
    }

    #[test]
    fn cancel_is_idempotent() {
        let (debouncer, clock, log) = recording(DebounceConfig::trailing(ms(100)));

        debouncer.cancel();
        debouncer.call("a");
        debouncer.cancel();
        debouncer.cancel();
        clock.advance(ms(1000));
        assert!(log.lock().is_empty());

        // Still usable afterwards.
        debouncer.call("b");
        clock.advance(ms(100));
        assert_eq!(*log.lock(), vec![(ms(1100), "b")]);
    }

    #[test]
    fn spaced_calls_fire_independently() {
        let (debouncer, clock, log) = recording(DebounceConfig::trailing(ms(100)));

        debouncer.call("a");
        clock.advance(ms(150));
        debouncer.call("b");
        clock.advance(ms(150));

        assert_eq!(*log.lock(), vec![(ms(100), "a"), (ms(250), "b")]);
    }

    #[test]
    fn drop_cancels_pending_window() {
        let (debouncer, clock, log) = recording(DebounceConfig::trailing(ms(100)));

        let mut outcome = debouncer.call("a");
        drop(debouncer);

        assert_eq!(clock.pending_timers(), 0);
        clock.advance(ms(1000));
        assert!(log.lock().is_empty());
        assert!(outcome.try_take().unwrap().unwrap_err().is_cancelled());
    }

    #[test]
    fn canceller_is_detached() {
        let (debouncer, clock, log) = recording(DebounceConfig::trailing(ms(100)));
        let canceller = debouncer.canceller();

        debouncer.call("a");
        canceller.clone().cancel();
        clock.advance(ms(200));
        assert!(log.lock().is_empty());

        drop(debouncer);
        // No debouncer left; must not panic.
        canceller.cancel();
    }

    #[test]
    fn wrapped_errors_reach_the_caller() {
        let clock = VirtualScheduler::new();
        let debouncer = Debouncer::with_config(
            |n: u32| if n % 2 == 0 { Ok(n) } else { Err(format!("{n} is odd")) },
            DebounceConfig::trailing(ms(10)),
            clock.clone(),
        );

        let mut outcome = debouncer.call(3);
        clock.advance(ms(10));

        let result = outcome.try_take().unwrap().unwrap();
        assert_eq!(result, Err("3 is odd".to_string()));
    }

    /// Scheduler whose handles never abort; every task stays queued.
    #[derive(Clone, Default)]
    struct LeakyScheduler {
        tasks: Arc<Mutex<Vec<crate::timer::Task>>>,
    }

    impl Scheduler for LeakyScheduler {
        fn schedule(&self, _delay: Duration, task: crate::timer::Task) -> TimerHandle {
            self.tasks.lock().push(task);
            TimerHandle::new(crate::timer::TimerId::new(), || {})
        }
    }

    #[test]
    fn stale_expiry_is_ignored() {
        let timers = LeakyScheduler::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let debouncer = Debouncer::with_config(
            move |arg: &'static str| log_clone.lock().push(arg),
            DebounceConfig::trailing(ms(100)),
            timers.clone(),
        );

        debouncer.call("a");
        debouncer.call("b");

        let mut tasks = std::mem::take(&mut *timers.tasks.lock());
        assert_eq!(tasks.len(), 2);
        let live = tasks.pop().unwrap();
        let superseded = tasks.pop().unwrap();

        superseded();
        assert!(log.lock().is_empty());
        assert_eq!(debouncer.state(), DebounceState::Pending);

        live();
        assert_eq!(*log.lock(), vec!["b"]);
        assert_eq!(debouncer.invocations(), 1);
        assert_eq!(debouncer.state(), DebounceState::Idle);
    }

    #[test]
    fn cancelled_expiry_is_ignored() {
        let timers = LeakyScheduler::default();
        let debouncer = Debouncer::with_config(
            |_: ()| (),
            DebounceConfig::trailing(ms(100)),
            timers.clone(),
        );

        let mut outcome = debouncer.call(());
        debouncer.cancel();
        for task in std::mem::take(&mut *timers.tasks.lock()) {
            task();
        }

        assert_eq!(debouncer.invocations(), 0);
        assert!(outcome.try_take().unwrap().unwrap_err().is_cancelled());
    }

    fn panicking(config: DebounceConfig) -> (Debouncer<u32, u32>, VirtualScheduler) {
        let clock = VirtualScheduler::new();
        let debouncer = Debouncer::with_config(
            |n: u32| {
                if n == 0 {
                    panic!("zero");
                }
                n
            },
            config,
            clock.clone(),
        );
        (debouncer, clock)
    }

    #[test]
    fn trailing_panic_abandons_waiters() {
        let (debouncer, clock) = panicking(DebounceConfig::trailing(ms(100)));

        let mut first = debouncer.call(1);
        let mut second = debouncer.call(0);

        let fired = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            clock.advance(ms(100));
        }));
        assert!(fired.is_err());

        assert!(matches!(first.try_take(), Some(Err(DebounceError::Abandoned))));
        assert!(matches!(second.try_take(), Some(Err(DebounceError::Abandoned))));
        assert_eq!(debouncer.state(), DebounceState::Idle);

        // Usable again after the panic.
        let mut next = debouncer.call(7);
        clock.advance(ms(100));
        assert_eq!(next.try_take().unwrap().unwrap(), 7);
    }

    #[test]
    fn leading_panic_abandons_suppressed_calls() {
        let (debouncer, clock) = panicking(DebounceConfig::leading(ms(100)));

        let fired = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            debouncer.call(0);
        }));
        assert!(fired.is_err());
        assert_eq!(debouncer.state(), DebounceState::Pending);

        let mut suppressed = debouncer.call(5);
        assert!(suppressed.try_take().is_none());

        clock.advance(ms(100));
        assert!(matches!(
            suppressed.try_take(),
            Some(Err(DebounceError::Abandoned))
        ));
        assert_eq!(debouncer.state(), DebounceState::Idle);

        let mut next = debouncer.call(3);
        assert_eq!(next.try_take().unwrap().unwrap(), 3);
        assert_eq!(debouncer.invocations(), 2);
    }

    #[test]
    fn tuple_arguments() {
        let clock = VirtualScheduler::new();
        let debouncer = Debouncer::new(|(a, b): (i32, i32)| a + b, clock.clone());

        let mut outcome = debouncer.call((2, 3));
        clock.advance(crate::DEFAULT_WAIT);

        assert_eq!(outcome.try_take().unwrap().unwrap(), 5);
    }
}
