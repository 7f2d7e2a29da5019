//! The result of one debounced call.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::error::{DebounceError, Result};

enum Inner<R> {
    /// Resolved synchronously (leading edge).
    Ready(R),
    /// Waiting for the window to fire or be cancelled.
    Waiting(oneshot::Receiver<Result<R>>),
    /// Result already handed out.
    Taken,
}

/// Future returned by [`Debouncer::call`](super::Debouncer::call).
///
/// Resolves with the wrapped function's result for the window the call
/// belonged to, or with [`DebounceError::Cancelled`] if that window was
/// cancelled. Dropping an `Outcome` is fine: the call still counts, the
/// result is simply discarded.
pub struct Outcome<R> {
    inner: Inner<R>,
}

impl<R> Outcome<R> {
    pub(crate) fn ready(value: R) -> Self {
        Self {
            inner: Inner::Ready(value),
        }
    }

    pub(crate) fn waiting(rx: oneshot::Receiver<Result<R>>) -> Self {
        Self {
            inner: Inner::Waiting(rx),
        }
    }

    /// Whether the result is already available without waiting.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready(_))
    }

    /// Take the result if the window has already settled.
    ///
    /// Returns `None` while the window is still open, or once the result
    /// has been taken.
    pub fn try_take(&mut self) -> Option<Result<R>> {
        if let Inner::Waiting(rx) = &mut self.inner {
            let result = match rx.try_recv() {
                Ok(result) => result,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => Err(DebounceError::Abandoned),
            };
            self.inner = Inner::Taken;
            return Some(result);
        }

        match std::mem::replace(&mut self.inner, Inner::Taken) {
            Inner::Ready(value) => Some(Ok(value)),
            _ => None,
        }
    }
}

// No structural pinning: `R` is only ever moved out by value.
impl<R> Unpin for Outcome<R> {}

impl<R> Future for Outcome<R> {
    type Output = Result<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Inner::Waiting(rx) = &mut this.inner {
            let result = match Pin::new(rx).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(result)) => result,
                Poll::Ready(Err(_)) => Err(DebounceError::Abandoned),
            };
            this.inner = Inner::Taken;
            return Poll::Ready(result);
        }

        match std::mem::replace(&mut this.inner, Inner::Taken) {
            Inner::Ready(value) => Poll::Ready(Ok(value)),
            _ => panic!("Outcome polled after completion"),
        }
    }
}

impl<R> std::fmt::Debug for Outcome<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.inner {
            Inner::Ready(_) => "ready",
            Inner::Waiting(_) => "waiting",
            Inner::Taken => "taken",
        };
        f.debug_struct("Outcome").field("state", &state).finish()
    }
}
