//! Debounced Signal
//!
//! Pairs two signals with a debouncer:
//!
//! - `input` follows every `set` immediately (what a text box shows).
//! - `settled` only receives a value once input has been quiet for the
//!   configured wait (what a search request should use).
//!
//! Subscribing to `settled` gives the "react to the debounced value"
//! pattern without wiring a debouncer by hand.

use tracing::trace;

use super::signal::Signal;
use crate::debounce::{DebounceConfig, Debouncer};
use crate::timer::Scheduler;

/// A value whose settled copy lags behind bursts of writes.
///
/// Dropping it cancels any settle still pending.
pub struct DebouncedSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    input: Signal<T>,
    settled: Signal<T>,
    debouncer: Debouncer<T>,
}

impl<T> DebouncedSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a debounced signal. Both sides start at `initial`.
    pub fn new<S>(initial: T, config: DebounceConfig, scheduler: S) -> Self
    where
        S: Scheduler + 'static,
    {
        let input = Signal::new(initial.clone());
        let settled = Signal::new(initial);

        let target = settled.clone();
        let debouncer = Debouncer::with_config(
            move |value: T| {
                trace!("settling debounced signal");
                target.set(value);
            },
            config,
            scheduler,
        );

        Self {
            input,
            settled,
            debouncer,
        }
    }

    /// Write a value. `input` updates now, `settled` after the wait.
    ///
    /// With a leading-edge config the first write of a burst settles
    /// immediately and the rest of the burst is dropped.
    pub fn set(&self, value: T) {
        self.input.set(value.clone());
        // Fire and forget: the settled signal is the result.
        let _ = self.debouncer.call(value);
    }

    /// The signal that follows every write.
    pub fn input(&self) -> &Signal<T> {
        &self.input
    }

    /// The signal that only follows settled writes.
    pub fn settled(&self) -> &Signal<T> {
        &self.settled
    }

    /// Drop the pending settle, leaving `settled` at its last value.
    pub fn cancel(&self) {
        self.debouncer.cancel();
    }

    /// Whether a settle is pending.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// The debounce config in use.
    pub fn config(&self) -> &DebounceConfig {
        self.debouncer.config()
    }
}

impl<T> std::fmt::Debug for DebouncedSignal<T>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedSignal")
            .field("input", &self.input)
            .field("settled", &self.settled)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}
