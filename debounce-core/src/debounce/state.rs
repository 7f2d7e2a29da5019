//! Debounce State Machine
//!
//! A debouncer is always in one of two states:
//!
//! - `Idle`: no timer is armed.
//! - `Pending`: a timer is armed and a window is open.
//!
//! # Transitions
//!
//! | From      | Event      | To        | Effect                                  |
//! |-----------|------------|-----------|-----------------------------------------|
//! | `Idle`    | call       | `Pending` | open window (leading: fire now)         |
//! | `Pending` | call       | `Pending` | re-arm timer, replace arguments         |
//! | `Pending` | expiry     | `Idle`    | trailing: fire with last arguments      |
//! | `Pending` | cancel     | `Idle`    | reject waiters, nothing fires           |
//!
//! # Tickets
//!
//! Every window and every armed timer gets a ticket from one monotonic
//! counter. An expiry only acts if its ticket matches the window's current
//! `armed` ticket; a leading result is only stored if the window id still
//! matches. That keeps late firings from a racing runtime harmless.

use smallvec::SmallVec;
use tokio::sync::oneshot;

use crate::error::{DebounceError, Result};
use crate::timer::TimerHandle;

/// Externally visible state of a debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No timer is armed.
    Idle,
    /// A timer is armed and the window is open.
    Pending,
}

/// A caller waiting for the current window's result.
pub(crate) type Waiter<R> = oneshot::Sender<Result<R>>;

/// Bookkeeping for one open window.
pub(crate) struct Window<A, R> {
    /// Ticket identifying this window.
    pub(crate) id: u64,

    /// Ticket of the timer currently armed for this window.
    pub(crate) armed: u64,

    /// The armed timer. Replacing it cancels the previous one.
    pub(crate) timer: TimerHandle,

    /// Arguments of the most recent call (trailing edge only).
    pub(crate) args: Option<A>,

    /// Result of the leading call, once it has returned (leading edge only).
    pub(crate) leading: Option<R>,

    /// Callers waiting for this window to resolve.
    pub(crate) waiters: SmallVec<[Waiter<R>; 1]>,
}

impl<A, R> Window<A, R> {
    pub(crate) fn new(id: u64, timer: TimerHandle) -> Self {
        Self {
            id,
            armed: id,
            timer,
            args: None,
            leading: None,
            waiters: SmallVec::new(),
        }
    }

    /// Swap in a freshly armed timer. The old one is cancelled on drop.
    pub(crate) fn rearm(&mut self, ticket: u64, timer: TimerHandle) {
        self.armed = ticket;
        self.timer = timer;
    }
}

impl<A, R: Clone> Window<A, R> {
    /// Resolve every waiter with a clone of `result`.
    pub(crate) fn resolve(waiters: SmallVec<[Waiter<R>; 1]>, result: &R) {
        for waiter in waiters {
            // A dropped outcome just means nobody is listening.
            let _ = waiter.send(Ok(result.clone()));
        }
    }

    /// Reject every waiter with `Cancelled`.
    pub(crate) fn reject(waiters: SmallVec<[Waiter<R>; 1]>) {
        for waiter in waiters {
            let _ = waiter.send(Err(DebounceError::Cancelled));
        }
    }
}

/// The state machine proper.
pub(crate) enum State<A, R> {
    Idle,
    Pending(Window<A, R>),
}

impl<A, R> State<A, R> {
    pub(crate) fn public(&self) -> DebounceState {
        match self {
            State::Idle => DebounceState::Idle,
            State::Pending(_) => DebounceState::Pending,
        }
    }

    /// Close the current window, if any, returning it.
    pub(crate) fn close(&mut self) -> Option<Window<A, R>> {
        match std::mem::replace(self, State::Idle) {
            State::Idle => None,
            State::Pending(window) => Some(window),
        }
    }
}

/// Lock-protected core of a debouncer.
pub(crate) struct Core<A, R> {
    pub(crate) state: State<A, R>,
    next_ticket: u64,
}

impl<A, R> Core<A, R> {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Idle,
            next_ticket: 0,
        }
    }

    /// Hand out the next ticket.
    pub(crate) fn ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}
