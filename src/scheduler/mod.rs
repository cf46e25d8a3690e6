//! Scheduling strategies and run KPIs.
//!
//! # Algorithm
//!
//! `Scheduler` orders the process set with a dispatching strategy and
//! replays the execution engine over that order, one process at a time,
//! against a fresh ledger per run:
//!
//! - **Sequential**: ascending id; safety is enforced by the ledger alone
//! - **EDF**: ascending deadline, ties by id
//! - **LLF**: least laxity first, re-evaluated after each completion
//!
//! # KPI
//!
//! `RunKpi` computes makespan, deadline misses and tardiness for a run.
//!
//! # References
//!
//! - Liu (2000), "Real-Time Systems", Ch. 6
//! - Silberschatz et al. (2018), "Operating System Concepts", Ch. 5, 8

mod driver;
mod kpi;

pub use driver::{Dispatch, RunReport, Scheduler, Strategy};
pub use kpi::RunKpi;
