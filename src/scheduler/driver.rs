//! Scheduling driver.
//!
//! # Algorithm
//!
//! 1. Validate the catalog and process set once, up front.
//! 2. For a run, plan the dispatch order on a virtual clock:
//!    - Sequential / EDF: one stable sort (FIFO or deadline, ties by id)
//!    - LLF: repeatedly pick the least-laxity process, advance the clock by
//!      its computation time, re-evaluate laxity for the rest
//! 3. Build a fresh ledger and replay the engine over the plan, one process
//!    at a time, snapshotting after each.
//!
//! The clock advances by each process's declared computation time whether
//! it completes or blocks, so the plan never depends on ledger outcomes.
//! LLF is non-preemptive: laxity is only re-evaluated between processes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::RunConfig;
use crate::dispatching::{rules, RuleEngine, SchedulingContext, TieBreaker};
use crate::engine::{ExecutionEngine, ExecutionReport, ProcessState};
use crate::error::{Error, LedgerError};
use crate::ledger::{AllocationLedger, LedgerSnapshot};
use crate::models::{ProcessDescriptor, ProcessId, ResourceCatalog};
use crate::validation::validate_input;

/// Process ordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Ascending id under deadlock-avoidance gating.
    Sequential,
    /// Earliest Deadline First.
    Edf,
    /// Least Laxity First (non-preemptive).
    Llf,
}

impl Strategy {
    /// All strategies, in the order `run_all` uses.
    pub const ALL: [Strategy; 3] = [Strategy::Sequential, Strategy::Edf, Strategy::Llf];

    /// Whether priorities change as the clock advances.
    pub fn is_dynamic(self) -> bool {
        matches!(self, Strategy::Llf)
    }

    /// The rule engine implementing this strategy.
    pub fn rule_engine(self) -> RuleEngine {
        let engine = match self {
            Strategy::Sequential => RuleEngine::new().with_rule(rules::Fifo),
            Strategy::Edf => RuleEngine::new().with_rule(rules::Edf),
            Strategy::Llf => RuleEngine::new().with_rule(rules::Llf),
        };
        engine.with_final_tie_breaker(TieBreaker::ById)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Sequential => "sequential",
            Strategy::Edf => "edf",
            Strategy::Llf => "llf",
        };
        f.write_str(s)
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "banker" | "bankers" => Ok(Strategy::Sequential),
            "edf" => Ok(Strategy::Edf),
            "llf" => Ok(Strategy::Llf),
            other => Err(format!("unknown strategy `{other}`")),
        }
    }
}

/// One slot of the planned timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatch {
    pub process_id: ProcessId,
    /// Clock value when the process was dispatched.
    pub start: i64,
    /// `start + computation_time`.
    pub end: i64,
    pub deadline: i64,
    /// Laxity at dispatch time.
    pub laxity: i64,
}

/// Result of one scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub strategy: Strategy,
    /// Ledger state before the first process.
    pub initial: LedgerSnapshot,
    pub timeline: Vec<Dispatch>,
    /// One per dispatched process, in timeline order.
    pub executions: Vec<ExecutionReport>,
    /// Ledger state after each process, in timeline order.
    pub snapshots: Vec<LedgerSnapshot>,
}

impl RunReport {
    /// Process ids in execution order.
    pub fn order(&self) -> Vec<ProcessId> {
        self.timeline.iter().map(|d| d.process_id).collect()
    }

    /// Ledger state at the end of the run.
    pub fn final_snapshot(&self) -> &LedgerSnapshot {
        self.snapshots.last().unwrap_or(&self.initial)
    }

    /// Execution report of a process.
    pub fn execution(&self, pid: ProcessId) -> Option<&ExecutionReport> {
        self.executions.iter().find(|e| e.process_id == pid)
    }

    /// Ids of processes that stopped on a denied request.
    pub fn blocked(&self) -> Vec<ProcessId> {
        self.executions
            .iter()
            .filter(|e| e.state == ProcessState::Blocked)
            .map(|e| e.process_id)
            .collect()
    }

    /// Ids of processes that ran to completion.
    pub fn completed(&self) -> Vec<ProcessId> {
        self.executions
            .iter()
            .filter(|e| e.state == ProcessState::Completed)
            .map(|e| e.process_id)
            .collect()
    }
}

/// Owns the inputs of a run and replays them under a strategy.
///
/// # Example
///
/// ```
/// use u_banker::config::RunConfig;
/// use u_banker::models::{Instruction, ProcessDescriptor, ResourceCatalog, ResourceType};
/// use u_banker::scheduler::{Scheduler, Strategy};
///
/// let catalog = ResourceCatalog::new()
///     .with_type(ResourceType::new("R1").with_instances(["a", "b"]));
/// let processes = vec![
///     ProcessDescriptor::new(1).with_deadline(10).with_computation_time(2)
///         .with_instructions([Instruction::Request(vec![1]), Instruction::End]),
///     ProcessDescriptor::new(2).with_deadline(4).with_computation_time(1)
///         .with_instructions([Instruction::Request(vec![2]), Instruction::End]),
/// ];
///
/// let scheduler = Scheduler::new(catalog, processes, RunConfig::default()).unwrap();
/// let report = scheduler.run(Strategy::Llf).unwrap();
/// assert_eq!(report.order(), vec![2, 1]);
/// assert_eq!(report.final_snapshot().available, vec![2]);
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler {
    catalog: ResourceCatalog,
    processes: Vec<ProcessDescriptor>,
    config: RunConfig,
    engine: ExecutionEngine,
}

impl Scheduler {
    /// Validates the inputs and creates a scheduler.
    ///
    /// # Errors
    /// [`Error::Validation`] listing every problem found.
    pub fn new(
        catalog: ResourceCatalog,
        processes: Vec<ProcessDescriptor>,
        config: RunConfig,
    ) -> Result<Self, Error> {
        validate_input(&catalog, &processes)?;
        let engine = ExecutionEngine::from_config(&config);
        Ok(Self {
            catalog,
            processes,
            config,
            engine,
        })
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn processes(&self) -> &[ProcessDescriptor] {
        &self.processes
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Plans the dispatch timeline of a strategy without executing anything.
    pub fn plan(&self, strategy: Strategy) -> Vec<Dispatch> {
        let rules = strategy.rule_engine();
        let mut context = SchedulingContext::at_time(0);
        let mut timeline = Vec::with_capacity(self.processes.len());

        let mut dispatch = |process: &ProcessDescriptor, context: &mut SchedulingContext| {
            let start = context.current_time;
            context.advance(process.computation_time);
            timeline.push(Dispatch {
                process_id: process.id,
                start,
                end: context.current_time,
                deadline: process.deadline,
                laxity: process.laxity_at(start),
            });
        };

        if strategy.is_dynamic() {
            let mut remaining: Vec<&ProcessDescriptor> = self.processes.iter().collect();
            while let Some(best) = rules.select_best(&remaining, &context) {
                let process = remaining.remove(best);
                dispatch(process, &mut context);
            }
        } else {
            for index in rules.sort_indices(&self.processes, &context) {
                dispatch(&self.processes[index], &mut context);
            }
        }

        timeline
    }

    /// Runs every process once under `strategy` against a fresh ledger.
    ///
    /// # Errors
    /// Ledger misuse, or a broken invariant when
    /// [`RunConfig::check_invariants`] is set.
    pub fn run(&self, strategy: Strategy) -> Result<RunReport, LedgerError> {
        let timeline = self.plan(strategy);
        let mut ledger = AllocationLedger::new(&self.catalog, &self.processes);
        log::info!(
            "Running {} scheduling over {} processes",
            strategy,
            timeline.len()
        );

        let mut report = RunReport {
            strategy,
            initial: ledger.snapshot(),
            timeline: Vec::with_capacity(timeline.len()),
            executions: Vec::with_capacity(timeline.len()),
            snapshots: Vec::with_capacity(timeline.len()),
        };

        for slot in timeline {
            let process = self
                .process(slot.process_id)
                .ok_or(LedgerError::UnknownProcess(slot.process_id))?;
            log::debug!(
                "Dispatching process {} at t={} (deadline {}, laxity {})",
                slot.process_id,
                slot.start,
                slot.deadline,
                slot.laxity
            );

            let execution = self.engine.run(&mut ledger, process)?;
            if self.config.check_invariants {
                ledger.check_invariants()?;
            }

            report.timeline.push(slot);
            report.executions.push(execution);
            report.snapshots.push(ledger.snapshot());
        }

        log::info!(
            "{} scheduling completed: {} completed, {} blocked",
            strategy,
            report.completed().len(),
            report.blocked().len()
        );
        Ok(report)
    }

    /// Runs Sequential, EDF and LLF in turn, each on its own ledger.
    pub fn run_all(&self) -> Result<Vec<RunReport>, LedgerError> {
        Strategy::ALL.iter().map(|&s| self.run(s)).collect()
    }

    fn process(&self, pid: ProcessId) -> Option<&ProcessDescriptor> {
        self.processes.iter().find(|p| p.id == pid)
    }
}
