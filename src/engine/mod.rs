//! Process execution engine.
//!
//! Interprets one process's instruction stream against the ledger, one
//! instruction at a time. Exactly one process advances at any moment;
//! `compute` consumes virtual time unless a wall-clock time unit is set.

mod executor;
mod report;

pub use executor::ExecutionEngine;
pub use report::{ExecutionReport, ProcessState, TraceEvent, UsageRecord};
