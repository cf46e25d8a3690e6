//! Instruction-stream interpreter.
//!
//! # Algorithm
//!
//! 1. Start in `Running`.
//! 2. Execute instructions in order while `Running`:
//!    - `compute(d)`: add `d` to the compute total (optionally sleep)
//!    - `request(v)`: ask the ledger; a denial moves to `Blocked` and stops,
//!      keeping whatever is already held
//!    - `use_resources`: claim mentioned instances directly
//!    - `release(v)`: return amounts
//!    - `print_resources_used`: emit the usage list
//!    - `end`: release everything, move to `Completed`, stop
//! 3. An exhausted stream also ends in `Completed` (nothing is released).
//! 4. Reconcile `Need = Max - Allocation` for the process.

use std::thread;
use std::time::Duration;

use super::{ExecutionReport, ProcessState, TraceEvent, UsageRecord};
use crate::config::RunConfig;
use crate::error::LedgerError;
use crate::ledger::{AllocationLedger, RequestOutcome};
use crate::models::{Instruction, ProcessDescriptor, Units};

/// Longest wall-clock pause a single `compute` may take.
const MAX_COMPUTE_PAUSE: Duration = Duration::from_secs(3600);

/// Replays one process at a time against a ledger.
///
/// # Example
///
/// ```
/// use u_banker::engine::{ExecutionEngine, ProcessState};
/// use u_banker::ledger::AllocationLedger;
/// use u_banker::models::{Instruction, ProcessDescriptor, ResourceCatalog, ResourceType};
///
/// let catalog = ResourceCatalog::new()
///     .with_type(ResourceType::new("R1").with_instances(["a", "b"]));
/// let process = ProcessDescriptor::new(1).with_instructions([
///     Instruction::Request(vec![1]),
///     Instruction::Compute(3),
///     Instruction::End,
/// ]);
/// let mut ledger = AllocationLedger::new(&catalog, std::slice::from_ref(&process));
///
/// let report = ExecutionEngine::new().run(&mut ledger, &process).unwrap();
/// assert_eq!(report.state, ProcessState::Completed);
/// assert_eq!(report.compute_time, 3);
/// assert_eq!(ledger.available(), &[2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    time_unit: Duration,
}

impl ExecutionEngine {
    /// Creates an engine running on virtual time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine from a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new().with_time_unit(config.time_unit())
    }

    /// Sleeps this long per `compute` time unit.
    pub fn with_time_unit(mut self, time_unit: Duration) -> Self {
        self.time_unit = time_unit;
        self
    }

    /// Executes `process` to completion or until a request is denied.
    ///
    /// # Errors
    /// Only ledger misuse (unknown process, wrong amount arity) is an error;
    /// denials are reported in the returned [`ExecutionReport`].
    pub fn run(
        &self,
        ledger: &mut AllocationLedger,
        process: &ProcessDescriptor,
    ) -> Result<ExecutionReport, LedgerError> {
        let pid = process.id;
        let mut report = ExecutionReport::new(pid);
        log::info!("Process {} started", pid);

        for instruction in &process.instructions {
            if report.state != ProcessState::Running {
                break;
            }
            match instruction {
                Instruction::Compute(duration) => {
                    self.compute(*duration);
                    report.compute_time += duration;
                    report.trace.push(TraceEvent::Computed(*duration));
                }
                Instruction::Request(amounts) => match ledger.request(pid, amounts)? {
                    RequestOutcome::Granted => {
                        record_amounts(&mut report, ledger, amounts, false);
                        report.trace.push(TraceEvent::Granted(amounts.clone()));
                    }
                    RequestOutcome::Denied(denial) => {
                        log::warn!(
                            "Process {} request {:?} denied ({}). Deadlock may occur.",
                            pid,
                            amounts,
                            denial
                        );
                        report.trace.push(TraceEvent::Denied(denial.clone()));
                        report.denial = Some(denial);
                        report.state = ProcessState::Blocked;
                    }
                },
                Instruction::UseResources => {
                    let claimed = ledger.use_direct(pid, process.mentions())?;
                    let instances: Vec<String> =
                        claimed.iter().map(|(_, inst)| inst.clone()).collect();
                    log::info!(
                        "Using resources for Process {}: {}",
                        pid,
                        instances.join(" ")
                    );
                    for (j, instance) in claimed {
                        report.usage.push(UsageRecord::Used {
                            resource: ledger.catalog().name(j).to_string(),
                            instance,
                        });
                    }
                    report.trace.push(TraceEvent::Used(instances));
                }
                Instruction::Release(amounts) => {
                    let released = ledger.release(pid, amounts)?;
                    record_amounts(&mut report, ledger, &released, true);
                    report.trace.push(TraceEvent::Released(released));
                }
                Instruction::PrintResourcesUsed => {
                    let line = report.usage_line();
                    log::info!("Resources used by Process {}: {}", pid, line);
                    report.trace.push(TraceEvent::PrintedUsage(line));
                }
                Instruction::End => {
                    let released = ledger.release_all(pid)?;
                    report.released_on_end = true;
                    report.trace.push(TraceEvent::Ended(released));
                    report.state = ProcessState::Completed;
                }
                Instruction::Mention(_) => {}
            }
        }

        if report.state == ProcessState::Running {
            report.state = ProcessState::Completed;
        }

        ledger.reconcile_need(pid)?;
        report.held_at_finish = ledger.allocation(pid)?.to_vec();

        log::info!(
            "Process {} {} in {} units",
            pid,
            report.state,
            report.compute_time
        );
        Ok(report)
    }

    fn compute(&self, duration: i64) {
        let pause = self.pause_for(duration);
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    /// Wall-clock pause for a `compute` of `duration` units, capped at
    /// [`MAX_COMPUTE_PAUSE`].
    fn pause_for(&self, duration: i64) -> Duration {
        if self.time_unit.is_zero() || duration <= 0 {
            return Duration::ZERO;
        }
        match u32::try_from(duration)
            .ok()
            .and_then(|units| self.time_unit.checked_mul(units))
        {
            Some(pause) if pause <= MAX_COMPUTE_PAUSE => pause,
            _ => {
                log::warn!(
                    "compute({}) at {:?} per unit exceeds {:?}, sleeping {:?}",
                    duration,
                    self.time_unit,
                    MAX_COMPUTE_PAUSE,
                    MAX_COMPUTE_PAUSE
                );
                MAX_COMPUTE_PAUSE
            }
        }
    }
}

fn record_amounts(
    report: &mut ExecutionReport,
    ledger: &AllocationLedger,
    amounts: &[Units],
    released: bool,
) {
    for (j, &amount) in amounts.iter().enumerate() {
        if amount <= 0 {
            continue;
        }
        let resource = ledger.catalog().name(j).to_string();
        report.usage.push(if released {
            UsageRecord::Released { resource, amount }
        } else {
            UsageRecord::Requested { resource, amount }
        });
    }
}
