//! Error types for the debounce core.

use thiserror::Error;

/// Errors surfaced by debounced calls and their configuration.
///
/// Failures of the wrapped function itself are not represented here: they
/// travel through the function's own return type untouched.
#[derive(Debug, Error)]
pub enum DebounceError {
    /// The debounce window was cancelled, or its owner dropped, before
    /// the call resolved.
    #[error("debounced call was cancelled before it fired")]
    Cancelled,

    /// The window closed without producing a result for this caller.
    ///
    /// Happens when the wrapped function panicked while the window fired.
    #[error("debounce window closed without producing a result")]
    Abandoned,

    /// Configuration could not be parsed.
    #[error("invalid debounce config: {0}")]
    Config(#[from] serde_json::Error),

    /// A tokio-backed scheduler was requested outside a tokio runtime.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl DebounceError {
    /// Whether this error came from cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DebounceError::Cancelled)
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = DebounceError> = std::result::Result<T, E>;
