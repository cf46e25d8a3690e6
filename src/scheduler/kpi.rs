//! Run quality metrics (KPIs).
//!
//! Computes real-time performance indicators from a completed run.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest dispatch end time |
//! | Completed / Blocked | Processes by final state |
//! | Deadline Misses | Completed processes ending after their deadline |
//! | Total Tardiness | Sum of max(0, end - deadline) |
//! | Maximum Tardiness | Largest single delay |
//! | On-Time Rate | Fraction of completed processes meeting deadlines |
//!
//! Blocked processes never finish, so they are counted separately and left
//! out of the tardiness figures.

use serde::{Deserialize, Serialize};

use super::RunReport;
use crate::engine::ProcessState;

/// Run performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunKpi {
    pub makespan: i64,
    pub completed: usize,
    pub blocked: usize,
    pub deadline_misses: usize,
    pub total_tardiness: i64,
    pub max_tardiness: i64,
    /// Fraction of completed processes meeting their deadline (0.0..1.0).
    pub on_time_rate: f64,
}

impl RunKpi {
    /// Computes KPIs from a run report.
    pub fn calculate(report: &RunReport) -> Self {
        let makespan = report.timeline.iter().map(|d| d.end).max().unwrap_or(0);
        let mut completed = 0;
        let mut blocked = 0;
        let mut misses = 0;
        let mut total_tardiness: i64 = 0;
        let mut max_tardiness: i64 = 0;

        for (slot, execution) in report.timeline.iter().zip(&report.executions) {
            match execution.state {
                ProcessState::Blocked => {
                    blocked += 1;
                    continue;
                }
                ProcessState::Completed => completed += 1,
                ProcessState::Running => continue,
            }

            if slot.end > slot.deadline {
                let tardiness = slot.end - slot.deadline;
                misses += 1;
                total_tardiness += tardiness;
                max_tardiness = max_tardiness.max(tardiness);
            }
        }

        let on_time_rate = if completed == 0 {
            1.0
        } else {
            (completed - misses) as f64 / completed as f64
        };

        Self {
            makespan,
            completed,
            blocked,
            deadline_misses: misses,
            total_tardiness,
            max_tardiness,
            on_time_rate,
        }
    }

    /// Whether every process completed on time.
    pub fn all_met(&self) -> bool {
        self.blocked == 0 && self.deadline_misses == 0
    }
}
