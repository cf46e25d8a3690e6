//! Run configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it
//! overrides:
//!
//! ```
//! use u_banker::config::RunConfig;
//!
//! let config = RunConfig::from_json(r#"{ "default_deadline": 50 }"#).unwrap();
//! assert_eq!(config.default_deadline, 50);
//! assert_eq!(config.time_unit_ms, 0);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::LoadError;
use crate::models::NO_DEADLINE;

/// Tunables for loading and running a process set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Deadline for processes whose header declares none.
    pub default_deadline: i64,
    /// Computation time for processes whose header declares none.
    /// `None` derives it from the sum of the stream's `compute` directives.
    pub default_computation_time: Option<i64>,
    /// Wall-clock milliseconds slept per `compute` time unit (0 = virtual time only).
    pub time_unit_ms: u64,
    /// Verify ledger invariants after every process.
    pub check_invariants: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_deadline: NO_DEADLINE,
            default_computation_time: None,
            time_unit_ms: 0,
            check_invariants: cfg!(debug_assertions),
        }
    }
}

impl RunConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default deadline.
    pub fn with_default_deadline(mut self, deadline: i64) -> Self {
        self.default_deadline = deadline;
        self
    }

    /// Sets a fixed default computation time.
    pub fn with_default_computation_time(mut self, computation_time: i64) -> Self {
        self.default_computation_time = Some(computation_time);
        self
    }

    /// Sets the wall-clock length of one time unit.
    pub fn with_time_unit_ms(mut self, ms: u64) -> Self {
        self.time_unit_ms = ms;
        self
    }

    /// Enables or disables per-process invariant checks.
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }

    /// Wall-clock length of one time unit.
    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
