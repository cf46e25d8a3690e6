//! Human-readable and JSON renderings of ledger and run state.
//!
//! [`StateReport`] prints a ledger snapshot:
//!
//! ```text
//! Current State:
//! Available Resources: R1: a, b (1), R2: x (0)
//! Allocation Matrix:
//! 1 1
//! 0 0
//! Need Matrix:
//! Process 1: 0, 0
//! Process 2: 2, 1
//! ```
//!
//! [`RunSummary`] prints a whole run: the timeline with each process's
//! outcome, the KPIs, then the ledger state after every process. Both only
//! read the data they are given.

use std::fmt;

use crate::ledger::LedgerSnapshot;
use crate::models::ResourceCatalog;
use crate::scheduler::{RunKpi, RunReport};

/// Display adapter for a ledger snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StateReport<'a> {
    pub snapshot: &'a LedgerSnapshot,
    pub catalog: &'a ResourceCatalog,
}

impl<'a> StateReport<'a> {
    pub fn new(snapshot: &'a LedgerSnapshot, catalog: &'a ResourceCatalog) -> Self {
        Self { snapshot, catalog }
    }
}

fn join<T: ToString>(values: &[T], separator: &str) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for StateReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current State:")?;

        let available = self
            .catalog
            .types()
            .iter()
            .zip(&self.snapshot.available)
            .map(|(resource, count)| {
                format!("{}: {} ({})", resource.name, resource.instances.join(", "), count)
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "Available Resources: {available}")?;

        writeln!(f, "Allocation Matrix:")?;
        for row in &self.snapshot.allocation {
            writeln!(f, "{}", join(row, " "))?;
        }

        writeln!(f, "Need Matrix:")?;
        for (pid, row) in self.snapshot.process_ids.iter().zip(&self.snapshot.need) {
            writeln!(f, "Process {pid}: {}", join(row, ", "))?;
        }
        Ok(())
    }
}

/// Display adapter for a complete run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary<'a> {
    pub report: &'a RunReport,
    pub catalog: &'a ResourceCatalog,
}

impl<'a> RunSummary<'a> {
    pub fn new(report: &'a RunReport, catalog: &'a ResourceCatalog) -> Self {
        Self { report, catalog }
    }
}

fn format_time(value: i64) -> String {
    if value == i64::MAX {
        "-".to_string()
    } else {
        value.to_string()
    }
}

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "=== {} ===", report.strategy)?;
        writeln!(
            f,
            "{:>8} {:>6} {:>6} {:>9} {:>7}  state",
            "process", "start", "end", "deadline", "laxity"
        )?;

        for (slot, execution) in report.timeline.iter().zip(&report.executions) {
            let laxity = if slot.deadline == i64::MAX {
                "-".to_string()
            } else {
                slot.laxity.to_string()
            };
            write!(
                f,
                "{:>8} {:>6} {:>6} {:>9} {:>7}  {}",
                slot.process_id,
                slot.start,
                slot.end,
                format_time(slot.deadline),
                laxity,
                execution.state
            )?;
            if let Some(denial) = &execution.denial {
                write!(f, " ({denial})")?;
            }
            writeln!(f)?;
        }

        let kpi = RunKpi::calculate(report);
        writeln!(
            f,
            "makespan={} completed={} blocked={} misses={} tardiness={} (max {}) on_time={:.0}%",
            kpi.makespan,
            kpi.completed,
            kpi.blocked,
            kpi.deadline_misses,
            kpi.total_tardiness,
            kpi.max_tardiness,
            kpi.on_time_rate * 100.0
        )?;

        if report.snapshots.is_empty() {
            writeln!(f)?;
            return write!(f, "{}", StateReport::new(&report.initial, self.catalog));
        }
        for (slot, snapshot) in report.timeline.iter().zip(&report.snapshots) {
            writeln!(f)?;
            writeln!(f, "After process {} (t={}):", slot.process_id, slot.end)?;
            write!(f, "{}", StateReport::new(snapshot, self.catalog))?;
        }
        Ok(())
    }
}

/// Serializes run reports, with their KPIs, as pretty JSON.
pub fn runs_to_json(reports: &[RunReport]) -> Result<String, serde_json::Error> {
    let entries: Vec<serde_json::Value> = reports
        .iter()
        .map(|report| {
            Ok(serde_json::json!({
                "run": serde_json::to_value(report)?,
                "kpi": serde_json::to_value(RunKpi::calculate(report))?,
            }))
        })
        .collect::<Result<_, serde_json::Error>>()?;
    serde_json::to_string_pretty(&entries)
}
