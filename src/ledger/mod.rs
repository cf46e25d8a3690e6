//! Resource-allocation ledger (Banker's algorithm).
//!
//! Owns the `Available`, `Max`, `Allocation` and `Need` matrices and is the
//! only mutable state of a run. Every mutator takes `&mut self`, so a
//! request's check, commit, safety test and rollback form one critical
//! section; [`SharedLedger`] extends the same guarantee across threads.
//!
//! # Invariants
//!
//! At every point observable from outside the ledger:
//! 1. `Available[j] + Σ_i Allocation[i][j] == total[j]`
//! 2. `Need[i][j] == Max[i][j] - Allocation[i][j]`
//! 3. `Allocation[i][j] >= 0` and `Available[j] >= 0`
//!
//! # Usage
//!
//! ```
//! use u_banker::ledger::{AllocationLedger, RequestOutcome};
//! use u_banker::models::{Instruction, ProcessDescriptor, ResourceCatalog, ResourceType};
//!
//! let catalog = ResourceCatalog::new()
//!     .with_type(ResourceType::new("R1").with_instances(["a", "b"]));
//! let processes = vec![
//!     ProcessDescriptor::new(1).with_instruction(Instruction::Request(vec![2])),
//! ];
//! let mut ledger = AllocationLedger::new(&catalog, &processes);
//!
//! assert_eq!(ledger.request(1, &[2]).unwrap(), RequestOutcome::Granted);
//! assert_eq!(ledger.available(), &[0]);
//! assert!(!ledger.request(1, &[1]).unwrap().is_granted());
//! ```

mod safety;
mod shared;

pub use shared::SharedLedger;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::LedgerError;
use crate::models::{ProcessDescriptor, ProcessId, ResourceCatalog, Units};

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum Denial {
    /// The request exceeds the process's own remaining claim.
    #[error("claim violation on resource {resource}: requested {requested}, need {need}")]
    ClaimViolation {
        resource: usize,
        requested: Units,
        need: Units,
    },
    /// Not enough free instances right now.
    #[error("insufficient supply on resource {resource}: requested {requested}, available {available}")]
    InsufficientSupply {
        resource: usize,
        requested: Units,
        available: Units,
    },
    /// Granting would leave no safe completion order.
    #[error("request would leave the system in an unsafe state")]
    UnsafeState,
}

/// Result of [`AllocationLedger::request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOutcome {
    Granted,
    Denied(Denial),
}

impl RequestOutcome {
    /// Whether the request was granted.
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, RequestOutcome::Granted)
    }

    /// The denial reason, if denied.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            RequestOutcome::Granted => None,
            RequestOutcome::Denied(d) => Some(d),
        }
    }
}

/// A point-in-time copy of the ledger matrices.
///
/// Rows follow `process_ids`; columns follow catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub process_ids: Vec<ProcessId>,
    pub totals: Vec<Units>,
    pub available: Vec<Units>,
    pub max: Vec<Vec<Units>>,
    pub allocation: Vec<Vec<Units>>,
    pub need: Vec<Vec<Units>>,
}

impl LedgerSnapshot {
    /// Row index of a process id.
    pub fn row(&self, pid: ProcessId) -> Option<usize> {
        self.process_ids.iter().position(|&p| p == pid)
    }
}

/// The Banker's-algorithm ledger.
#[derive(Debug, Clone)]
pub struct AllocationLedger {
    catalog: ResourceCatalog,
    process_ids: Vec<ProcessId>,
    totals: Vec<Units>,
    available: Vec<Units>,
    max: Vec<Vec<Units>>,
    allocation: Vec<Vec<Units>>,
    need: Vec<Vec<Units>>,
}

impl AllocationLedger {
    /// Initializes the ledger from a catalog and process set.
    ///
    /// - `Available[j]` = instance count of resource j
    /// - `Max[i]` = arguments of process i's first `request` directive
    /// - `Allocation` = 0, `Need` = `Max`
    ///
    /// Rows are ordered by ascending process id.
    pub fn new(catalog: &ResourceCatalog, processes: &[ProcessDescriptor]) -> Self {
        let m = catalog.len();
        let mut ordered: Vec<&ProcessDescriptor> = processes.iter().collect();
        ordered.sort_by_key(|p| p.id);

        let totals = catalog.instance_counts();
        let max: Vec<Vec<Units>> = ordered.iter().map(|p| p.declared_max(m)).collect();
        let allocation = vec![vec![0; m]; ordered.len()];
        let need = max.clone();

        Self {
            catalog: catalog.clone(),
            process_ids: ordered.iter().map(|p| p.id).collect(),
            available: totals.clone(),
            totals,
            max,
            allocation,
            need,
        }
    }

    /// The catalog this ledger was built from.
    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    /// Process ids in row order.
    pub fn process_ids(&self) -> &[ProcessId] {
        &self.process_ids
    }

    /// Number of resource types.
    #[inline]
    pub fn resource_count(&self) -> usize {
        self.totals.len()
    }

    /// Total instances per resource type.
    pub fn totals(&self) -> &[Units] {
        &self.totals
    }

    /// Free instances per resource type.
    pub fn available(&self) -> &[Units] {
        &self.available
    }

    /// Declared maximum claim of a process.
    pub fn max(&self, pid: ProcessId) -> Result<&[Units], LedgerError> {
        let row = self.row(pid)?;
        Ok(&self.max[row])
    }

    /// Current allocation of a process.
    pub fn allocation(&self, pid: ProcessId) -> Result<&[Units], LedgerError> {
        let row = self.row(pid)?;
        Ok(&self.allocation[row])
    }

    /// Remaining claim of a process.
    pub fn need(&self, pid: ProcessId) -> Result<&[Units], LedgerError> {
        let row = self.row(pid)?;
        Ok(&self.need[row])
    }

    /// Requests resources for a process.
    ///
    /// Denies without mutation on a claim violation or insufficient
    /// supply. Otherwise commits tentatively and keeps the commit only if
    /// the resulting state is safe; an unsafe commit is rolled back exactly.
    ///
    /// # Errors
    /// [`LedgerError::UnknownProcess`], [`LedgerError::ArityMismatch`] or
    /// [`LedgerError::NegativeAmount`]. Nothing is mutated on error.
    pub fn request(
        &mut self,
        pid: ProcessId,
        amounts: &[Units],
    ) -> Result<RequestOutcome, LedgerError> {
        let row = self.row(pid)?;
        self.check_arity(amounts)?;
        if let Some((resource, &amount)) = amounts.iter().enumerate().find(|(_, &a)| a < 0) {
            return Err(LedgerError::NegativeAmount { resource, amount });
        }

        for (j, &requested) in amounts.iter().enumerate() {
            if requested > self.need[row][j] {
                let denial = Denial::ClaimViolation {
                    resource: j,
                    requested,
                    need: self.need[row][j],
                };
                log::debug!("Process {} denied: {}", pid, denial);
                return Ok(RequestOutcome::Denied(denial));
            }
        }

        for (j, &requested) in amounts.iter().enumerate() {
            if requested > self.available[j] {
                let denial = Denial::InsufficientSupply {
                    resource: j,
                    requested,
                    available: self.available[j],
                };
                log::debug!("Process {} denied: {}", pid, denial);
                return Ok(RequestOutcome::Denied(denial));
            }
        }

        self.apply(row, amounts, 1);

        if !self.is_safe() {
            self.apply(row, amounts, -1);
            log::debug!("Process {} denied: unsafe state for {:?}", pid, amounts);
            return Ok(RequestOutcome::Denied(Denial::UnsafeState));
        }

        log::debug!("Process {} granted {:?}", pid, amounts);
        Ok(RequestOutcome::Granted)
    }

    /// Returns resources from a process. Never denied.
    ///
    /// Amounts larger than what the process holds are clamped to its
    /// current allocation, so `Allocation` never goes negative. Returns the
    /// amounts actually released.
    pub fn release(
        &mut self,
        pid: ProcessId,
        amounts: &[Units],
    ) -> Result<Vec<Units>, LedgerError> {
        let row = self.row(pid)?;
        self.check_arity(amounts)?;

        let released: Vec<Units> = amounts
            .iter()
            .zip(&self.allocation[row])
            .enumerate()
            .map(|(j, (&wanted, &held))| {
                if wanted > held {
                    log::warn!(
                        "Process {} released {} of {} but holds {}; clamping",
                        pid,
                        wanted,
                        self.catalog.name(j),
                        held
                    );
                    held
                } else {
                    wanted.max(0)
                }
            })
            .collect();

        self.apply(row, &released, -1);
        log::debug!("Process {} released {:?}", pid, released);
        Ok(released)
    }

    /// Releases the whole allocation row of a process.
    pub fn release_all(&mut self, pid: ProcessId) -> Result<Vec<Units>, LedgerError> {
        let held = self.allocation(pid)?.to_vec();
        self.release(pid, &held)
    }

    /// Claims one unit of every available instance whose identifier is in
    /// `mentioned`, bypassing both the claim check and the safety check.
    ///
    /// Resources and their instances are visited in declaration order; a
    /// unit is taken only while `Available[j] > 0`. `Need` may go negative
    /// as a result. Returns `(resource index, instance id)` for each claim.
    pub fn use_direct<'a, I>(
        &mut self,
        pid: ProcessId,
        mentioned: I,
    ) -> Result<Vec<(usize, String)>, LedgerError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let row = self.row(pid)?;
        let mentioned: HashSet<&str> = mentioned.into_iter().collect();
        let mut claimed = Vec::new();

        for (j, resource) in self.catalog.types().iter().enumerate() {
            for instance in &resource.instances {
                if self.available[j] > 0 && mentioned.contains(instance.as_str()) {
                    self.available[j] -= 1;
                    self.allocation[row][j] += 1;
                    self.need[row][j] -= 1;
                    claimed.push((j, instance.clone()));
                }
            }
        }

        if !claimed.is_empty() {
            log::debug!("Process {} used {:?} without a safety check", pid, claimed);
        }
        Ok(claimed)
    }

    /// Recomputes `Need[i] = Max[i] - Allocation[i]` for one process.
    pub fn reconcile_need(&mut self, pid: ProcessId) -> Result<(), LedgerError> {
        let row = self.row(pid)?;
        for j in 0..self.resource_count() {
            self.need[row][j] = self.max[row][j] - self.allocation[row][j];
        }
        Ok(())
    }

    /// Whether the current state is safe. Side-effect free.
    pub fn is_safe(&self) -> bool {
        self.safe_sequence().is_some()
    }

    /// A completion order (process ids) witnessing safety, if one exists.
    pub fn safe_sequence(&self) -> Option<Vec<ProcessId>> {
        safety::safe_sequence(&self.available, &self.allocation, &self.need)
            .map(|rows| rows.into_iter().map(|r| self.process_ids[r]).collect())
    }

    /// Owned copy of all matrices.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            process_ids: self.process_ids.clone(),
            totals: self.totals.clone(),
            available: self.available.clone(),
            max: self.max.clone(),
            allocation: self.allocation.clone(),
            need: self.need.clone(),
        }
    }

    /// Verifies conservation, `Need = Max - Allocation` and non-negativity.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        for j in 0..self.resource_count() {
            let held: Units = self.allocation.iter().map(|row| row[j]).sum();
            if self.available[j] + held != self.totals[j] {
                return Err(LedgerError::InvariantViolated(format!(
                    "conservation of {}: available {} + allocated {} != total {}",
                    self.catalog.name(j),
                    self.available[j],
                    held,
                    self.totals[j]
                )));
            }
            if self.available[j] < 0 {
                return Err(LedgerError::InvariantViolated(format!(
                    "negative availability of {}",
                    self.catalog.name(j)
                )));
            }
        }
        for (row, &pid) in self.process_ids.iter().enumerate() {
            for j in 0..self.resource_count() {
                if self.allocation[row][j] < 0 {
                    return Err(LedgerError::InvariantViolated(format!(
                        "negative allocation of {} to process {}",
                        self.catalog.name(j),
                        pid
                    )));
                }
                if self.need[row][j] != self.max[row][j] - self.allocation[row][j] {
                    return Err(LedgerError::InvariantViolated(format!(
                        "need of process {} for {} is {}, expected {}",
                        pid,
                        self.catalog.name(j),
                        self.need[row][j],
                        self.max[row][j] - self.allocation[row][j]
                    )));
                }
            }
        }
        Ok(())
    }

    fn row(&self, pid: ProcessId) -> Result<usize, LedgerError> {
        self.process_ids
            .iter()
            .position(|&p| p == pid)
            .ok_or(LedgerError::UnknownProcess(pid))
    }

    fn check_arity(&self, amounts: &[Units]) -> Result<(), LedgerError> {
        if amounts.len() != self.resource_count() {
            return Err(LedgerError::ArityMismatch {
                expected: self.resource_count(),
                got: amounts.len(),
            });
        }
        Ok(())
    }

    /// Moves `amounts` between `Available` and a process row:
    /// `sign = 1` allocates, `sign = -1` returns.
    fn apply(&mut self, row: usize, amounts: &[Units], sign: Units) {
        for (j, &amount) in amounts.iter().enumerate() {
            let delta = sign * amount;
            self.available[j] -= delta;
            self.allocation[row][j] += delta;
            self.need[row][j] -= delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instruction, ResourceType};

    fn catalog(counts: &[usize]) -> ResourceCatalog {
        counts
            .iter()
            .enumerate()
            .map(|(j, &n)| {
                ResourceType::new(format!("R{}", j + 1))
                    .with_instances((0..n).map(|k| format!("r{}_{}", j + 1, k)))
            })
            .collect()
    }

    fn claimant(id: ProcessId, max: &[Units]) -> ProcessDescriptor {
        ProcessDescriptor::new(id).with_instruction(Instruction::Request(max.to_vec()))
    }

    #[test]
    fn test_initialize() {
        let ledger = AllocationLedger::new(
            &catalog(&[3, 2]),
            &[claimant(2, &[1, 1]), claimant(1, &[3, 0])],
        );
        assert_eq!(ledger.available(), &[3, 2]);
        assert_eq!(ledger.process_ids(), &[1, 2]);
        assert_eq!(ledger.max(1).unwrap(), &[3, 0]);
        assert_eq!(ledger.need(2).unwrap(), &[1, 1]);
        assert_eq!(ledger.allocation(2).unwrap(), &[0, 0]);
        assert!(ledger.check_invariants().is_ok());
    }

    #[test]
    fn test_single_resource_scenario() {
        let mut ledger = AllocationLedger::new(&catalog(&[2]), &[claimant(1, &[2])]);

        assert_eq!(ledger.request(1, &[2]).unwrap(), RequestOutcome::Granted);
        assert_eq!(ledger.available(), &[0]);
        assert_eq!(ledger.need(1).unwrap(), &[0]);

        let outcome = ledger.request(1, &[1]).unwrap();
        assert!(matches!(
            outcome,
            RequestOutcome::Denied(Denial::ClaimViolation { need: 0, .. })
        ));
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_claim_violation_leaves_state_unchanged() {
        let mut ledger = AllocationLedger::new(&catalog(&[5, 5]), &[claimant(1, &[1, 1])]);
        let before = ledger.snapshot();

        let outcome = ledger.request(1, &[2, 0]).unwrap();
        assert!(matches!(
            outcome.denial(),
            Some(Denial::ClaimViolation { resource: 0, .. })
        ));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_insufficient_supply() {
        let mut ledger = AllocationLedger::new(
            &catalog(&[2]),
            &[claimant(1, &[2]), claimant(2, &[2])],
        );
        assert!(ledger.request(1, &[2]).unwrap().is_granted());
        let before = ledger.snapshot();

        let outcome = ledger.request(2, &[1]).unwrap();
        assert!(matches!(
            outcome.denial(),
            Some(Denial::InsufficientSupply { available: 0, .. })
        ));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_unsafe_request_rolls_back() {
        let mut ledger = AllocationLedger::new(
            &catalog(&[4]),
            &[claimant(1, &[3]), claimant(2, &[3])],
        );
        // p1 holds 2 (needs 1), 2 free: p1 can finish, then p2
        assert!(ledger.request(1, &[2]).unwrap().is_granted());
        assert!(ledger.is_safe());
        let before = ledger.snapshot();

        // p2 taking both free units leaves 0 free with p1 needing 1 and
        // p2 needing 1: nobody can finish
        let outcome = ledger.request(2, &[2]).unwrap();
        assert_eq!(outcome, RequestOutcome::Denied(Denial::UnsafeState));
        assert_eq!(ledger.snapshot(), before);
        ledger.check_invariants().unwrap();

        // a smaller request from p2 is still fine
        assert!(ledger.request(2, &[1]).unwrap().is_granted());
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_is_safe_idempotent() {
        let mut ledger = AllocationLedger::new(
            &catalog(&[4, 2]),
            &[claimant(1, &[2, 1]), claimant(2, &[3, 2])],
        );
        ledger.request(1, &[1, 1]).unwrap();
        let before = ledger.snapshot();
        let first = ledger.is_safe();
        let second = ledger.is_safe();
        assert_eq!(first, second);
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_release_moves_amounts_back() {
        let mut ledger = AllocationLedger::new(&catalog(&[3, 3]), &[claimant(1, &[2, 2])]);
        ledger.request(1, &[2, 1]).unwrap();

        let released = ledger.release(1, &[1, 1]).unwrap();
        assert_eq!(released, vec![1, 1]);
        assert_eq!(ledger.available(), &[2, 3]);
        assert_eq!(ledger.allocation(1).unwrap(), &[1, 0]);
        assert_eq!(ledger.need(1).unwrap(), &[1, 2]);
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_release_clamps_to_allocation() {
        let mut ledger = AllocationLedger::new(&catalog(&[3]), &[claimant(1, &[2])]);
        ledger.request(1, &[1]).unwrap();

        let released = ledger.release(1, &[5]).unwrap();
        assert_eq!(released, vec![1]);
        assert_eq!(ledger.available(), &[3]);
        assert_eq!(ledger.allocation(1).unwrap(), &[0]);
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_release_all() {
        let mut ledger = AllocationLedger::new(&catalog(&[3, 1]), &[claimant(1, &[2, 1])]);
        ledger.request(1, &[2, 1]).unwrap();
        assert_eq!(ledger.release_all(1).unwrap(), vec![2, 1]);
        assert_eq!(ledger.available(), &[3, 1]);
        assert_eq!(ledger.need(1).unwrap(), &[2, 1]);
    }

    #[test]
    fn test_use_direct_bypasses_checks() {
        let mut ledger = AllocationLedger::new(&catalog(&[2, 1]), &[claimant(1, &[0, 0])]);

        let claimed = ledger
            .use_direct(1, ["r1_0", "r1_1", "r2_0", "unrelated"])
            .unwrap();
        assert_eq!(claimed.len(), 3);
        assert_eq!(claimed[0], (0, "r1_0".to_string()));
        assert_eq!(ledger.available(), &[0, 0]);
        assert_eq!(ledger.allocation(1).unwrap(), &[2, 1]);
        // claim of zero exceeded: need goes negative but stays consistent
        assert_eq!(ledger.need(1).unwrap(), &[-2, -1]);
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_use_direct_stops_at_zero_available() {
        let mut ledger = AllocationLedger::new(
            &catalog(&[2]),
            &[claimant(1, &[1]), claimant(2, &[1])],
        );
        ledger.request(2, &[1]).unwrap();
        let claimed = ledger.use_direct(1, ["r1_0", "r1_1"]).unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(ledger.available(), &[0]);
    }

    #[test]
    fn test_reconcile_need() {
        let mut ledger = AllocationLedger::new(&catalog(&[2]), &[claimant(1, &[2])]);
        ledger.request(1, &[1]).unwrap();
        ledger.reconcile_need(1).unwrap();
        assert_eq!(ledger.need(1).unwrap(), &[1]);
    }

    #[test]
    fn test_safe_sequence_ids() {
        let mut ledger = AllocationLedger::new(
            &catalog(&[1]),
            &[claimant(1, &[1]), claimant(2, &[1])],
        );
        ledger.request(2, &[1]).unwrap();
        // p1 needs 1 with 0 free; p2 already holds its max
        assert_eq!(ledger.safe_sequence(), Some(vec![2, 1]));
    }

    #[test]
    fn test_ledger_errors() {
        let mut ledger = AllocationLedger::new(&catalog(&[2]), &[claimant(1, &[1])]);
        assert_eq!(
            ledger.request(9, &[1]),
            Err(LedgerError::UnknownProcess(9))
        );
        assert_eq!(
            ledger.request(1, &[1, 1]),
            Err(LedgerError::ArityMismatch {
                expected: 1,
                got: 2
            })
        );
        assert!(ledger.release(1, &[]).is_err());
    }

    #[test]
    fn test_request_rejects_negative_amount() {
        let mut ledger = AllocationLedger::new(&catalog(&[2, 2]), &[claimant(1, &[1, 1])]);
        let before = ledger.snapshot();

        assert_eq!(
            ledger.request(1, &[1, -1]),
            Err(LedgerError::NegativeAmount {
                resource: 1,
                amount: -1
            })
        );
        assert_eq!(ledger.snapshot(), before);
        ledger.check_invariants().unwrap();
    }
}
