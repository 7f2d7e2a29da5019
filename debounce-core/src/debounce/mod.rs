//! Debouncing
//!
//! This module implements the debounce primitive itself.
//!
//! # Concepts
//!
//! ## Windows
//!
//! A window opens on the first call after a quiet period and stays open
//! until the wait elapses with no further calls. Each call inside the
//! window pushes its end back. Exactly one timer is armed per window.
//!
//! ## Edges
//!
//! - Trailing: the function runs once, when the window closes, with the
//!   last call's arguments.
//! - Leading: the function runs once, when the window opens, with the
//!   first call's arguments. Closing the window runs nothing.
//!
//! ## Outcomes
//!
//! Every call yields an [`Outcome`] future carrying its window's result.
//! Cancelled windows reject their outcomes.

mod config;
mod state;
mod outcome;
mod debouncer;

pub use config::{DebounceConfig, Edge, DEFAULT_WAIT};
pub use state::DebounceState;
pub use outcome::Outcome;
pub use debouncer::{Canceller, Debouncer};
