//! Reactive Glue
//!
//! UI code rarely wants to call a debouncer directly; it wants a piece of
//! state that settles once the user stops typing. This module provides:
//!
//! - [`Signal`]: an observable value cell.
//! - [`DebouncedSignal`]: an input signal plus a settled signal that a
//!   debouncer keeps in sync.

mod signal;
mod debounced_signal;

pub use signal::{Signal, Subscription};
pub use debounced_signal::DebouncedSignal;
