//! Debounce Core
//!
//! This crate provides a debounce primitive: wrap a function so that a
//! burst of rapid calls collapses into a single invocation per quiet
//! period. It implements:
//!
//! - Trailing-edge and leading-edge (immediate) debouncing
//! - Per-call outcomes that resolve once the debounce window settles
//! - Cancellation, both explicit and on drop
//! - Pluggable timers: a virtual clock for tests, tokio for real use
//! - A debounced reactive signal for UI-style state
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `timer`: The scheduling interface and its implementations
//! - `debounce`: The debounce state machine and its public handle
//! - `reactive`: Signals and the debounced signal built on them
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use debounce_core::{DebounceConfig, Debouncer, TokioScheduler};
//!
//! let search = Debouncer::with_config(
//!     |query: String| println!("searching for {query}"),
//!     DebounceConfig::trailing(Duration::from_millis(300)),
//!     TokioScheduler::current(),
//! );
//!
//! search.call("r".into());
//! search.call("ru".into());
//! search.call("rust".into());
//! // ~300ms later, prints: "searching for rust"
//! ```

pub mod error;
pub mod timer;
pub mod debounce;
pub mod reactive;

pub use error::{DebounceError, Result};
pub use timer::{Scheduler, Task, TimerHandle, TimerId, TokioScheduler, VirtualScheduler};
pub use debounce::{
    Canceller, DebounceConfig, DebounceState, Debouncer, Edge, Outcome, DEFAULT_WAIT,
};
pub use reactive::{DebouncedSignal, Signal, Subscription};
