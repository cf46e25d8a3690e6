//! Per-process execution results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::Denial;
use crate::models::{ProcessId, Units};

/// Lifecycle of a process within one run.
///
/// `Running` is initial; `Blocked` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    Running,
    Blocked,
    Completed,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Running => "running",
            ProcessState::Blocked => "blocked",
            ProcessState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// One entry of the "resources used" list a process accumulates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageRecord {
    /// Granted by `request`.
    Requested { resource: String, amount: Units },
    /// Returned by `release`.
    Released { resource: String, amount: Units },
    /// Claimed by `use_resources`.
    Used { resource: String, instance: String },
}

impl fmt::Display for UsageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageRecord::Requested { resource, amount } => write!(f, "{resource} ({amount})"),
            UsageRecord::Released { resource, amount } => {
                write!(f, "{resource} (released: {amount})")
            }
            UsageRecord::Used { resource, instance } => write!(f, "{resource}:{instance}"),
        }
    }
}

/// Effect of one executed instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEvent {
    Computed(i64),
    Granted(Vec<Units>),
    Denied(Denial),
    Used(Vec<String>),
    Released(Vec<Units>),
    PrintedUsage(String),
    Ended(Vec<Units>),
}

/// Outcome of replaying one process's instruction stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub process_id: ProcessId,
    pub state: ProcessState,
    /// Sum of executed `compute` durations.
    pub compute_time: i64,
    pub usage: Vec<UsageRecord>,
    pub trace: Vec<TraceEvent>,
    pub denial: Option<Denial>,
    /// Whether `end` returned the allocation.
    pub released_on_end: bool,
    /// Allocation row still held when the stream stopped.
    pub held_at_finish: Vec<Units>,
}

impl ExecutionReport {
    pub(crate) fn new(process_id: ProcessId) -> Self {
        Self {
            process_id,
            state: ProcessState::Running,
            compute_time: 0,
            usage: Vec::new(),
            trace: Vec::new(),
            denial: None,
            released_on_end: false,
            held_at_finish: Vec::new(),
        }
    }

    /// Whether the process stopped on a denied request.
    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.state == ProcessState::Blocked
    }

    /// The usage list as printed by `print_resources_used`.
    pub fn usage_line(&self) -> String {
        self.usage
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether the process still holds anything.
    pub fn holds_resources(&self) -> bool {
        self.held_at_finish.iter().any(|&h| h > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_line() {
        let mut report = ExecutionReport::new(1);
        report.usage.push(UsageRecord::Requested {
            resource: "R1".into(),
            amount: 2,
        });
        report.usage.push(UsageRecord::Released {
            resource: "R1".into(),
            amount: 1,
        });
        report.usage.push(UsageRecord::Used {
            resource: "R2".into(),
            instance: "x".into(),
        });
        assert_eq!(report.usage_line(), "R1 (2), R1 (released: 1), R2:x");
    }

    #[test]
    fn test_holds_resources() {
        let mut report = ExecutionReport::new(1);
        assert!(!report.holds_resources());
        report.held_at_finish = vec![0, 1];
        assert!(report.holds_resources());
        assert!(!report.is_blocked());
        assert_eq!(ProcessState::Blocked.to_string(), "blocked");
    }
}
