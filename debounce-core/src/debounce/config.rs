//! Debounce configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Quiet period used when none is given.
pub const DEFAULT_WAIT: Duration = Duration::from_millis(500);

fn default_wait_ms() -> u64 {
    DEFAULT_WAIT.as_millis() as u64
}

/// Which edge of a burst triggers the wrapped function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// Fire on the first call of a burst, then suppress until quiet.
    Leading,
    /// Fire once the burst has been quiet for the full wait.
    Trailing,
}

/// Settings for a debouncer.
///
/// Deserializes from `{"wait_ms": 1000, "immediate": true}`; both fields
/// are optional and unknown keys are rejected.
///
/// The wait has millisecond granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebounceConfig {
    /// Length of the quiet period in milliseconds.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// Fire on the leading edge instead of the trailing edge.
    #[serde(default)]
    pub immediate: bool,
}

impl DebounceConfig {
    /// Trailing-edge config with the given wait.
    ///
    /// Sub-millisecond remainders round up, so a non-zero wait never
    /// becomes zero.
    pub fn new(wait: Duration) -> Self {
        let mut millis = wait.as_millis();
        if wait.subsec_nanos() % 1_000_000 != 0 {
            millis += 1;
        }
        Self {
            wait_ms: u64::try_from(millis).unwrap_or(u64::MAX),
            immediate: false,
        }
    }

    /// Trailing-edge config with the given wait.
    pub fn trailing(wait: Duration) -> Self {
        Self::new(wait)
    }

    /// Leading-edge config with the given wait.
    pub fn leading(wait: Duration) -> Self {
        Self::new(wait).with_immediate(true)
    }

    /// Set the immediate flag.
    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The quiet period.
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// The edge that fires.
    pub fn edge(&self) -> Edge {
        if self.immediate {
            Edge::Leading
        } else {
            Edge::Trailing
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT)
    }
}

impl From<Edge> for DebounceConfig {
    fn from(edge: Edge) -> Self {
        Self::default().with_immediate(edge == Edge::Leading)
    }
}
