//! Thread-safe ledger handle.
//!
//! Wraps an [`AllocationLedger`] in a single mutex. Each call takes the lock
//! once, so a request's check, commit, safety test and rollback can never
//! interleave with another request or release.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{AllocationLedger, LedgerSnapshot, RequestOutcome};
use crate::error::LedgerError;
use crate::models::{ProcessId, Units};

/// Cloneable, lock-guarded handle to one ledger.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<AllocationLedger>>,
}

impl SharedLedger {
    /// Moves a ledger behind the lock.
    pub fn new(ledger: AllocationLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AllocationLedger>, LedgerError> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// See [`AllocationLedger::request`].
    pub fn request(
        &self,
        pid: ProcessId,
        amounts: &[Units],
    ) -> Result<RequestOutcome, LedgerError> {
        self.lock()?.request(pid, amounts)
    }

    /// See [`AllocationLedger::release`].
    pub fn release(&self, pid: ProcessId, amounts: &[Units]) -> Result<Vec<Units>, LedgerError> {
        self.lock()?.release(pid, amounts)
    }

    /// See [`AllocationLedger::is_safe`].
    pub fn is_safe(&self) -> Result<bool, LedgerError> {
        Ok(self.lock()?.is_safe())
    }

    /// See [`AllocationLedger::snapshot`].
    pub fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        Ok(self.lock()?.snapshot())
    }

    /// Runs `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut AllocationLedger) -> R) -> Result<R, LedgerError> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    /// Takes the ledger back if this is the last handle.
    pub fn into_inner(self) -> Result<AllocationLedger, LedgerError> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().map_err(|_| LedgerError::LockPoisoned),
            Err(inner) => Ok(inner.lock().map_err(|_| LedgerError::LockPoisoned)?.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instruction, ProcessDescriptor, ResourceCatalog, ResourceType};
    use std::thread;

    fn shared(n_processes: usize) -> SharedLedger {
        let catalog = ResourceCatalog::new()
            .with_type(ResourceType::new("R1").with_instances(["a", "b", "c", "d"]))
            .with_type(ResourceType::new("R2").with_instances(["x", "y"]));
        let processes: Vec<_> = (1..=n_processes)
            .map(|id| ProcessDescriptor::new(id).with_instruction(Instruction::Request(vec![2, 1])))
            .collect();
        SharedLedger::new(AllocationLedger::new(&catalog, &processes))
    }

    #[test]
    fn test_concurrent_request_release_conserves() {
        let ledger = shared(4);
        let handles: Vec<_> = (1..=4)
            .map(|pid| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        if ledger.request(pid, &[1, 1]).unwrap().is_granted() {
                            ledger.release(pid, &[1, 1]).unwrap();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let ledger = ledger.into_inner().unwrap();
        ledger.check_invariants().unwrap();
        assert_eq!(ledger.available(), &[4, 2]);
    }

    #[test]
    fn test_with_and_snapshot() {
        let ledger = shared(1);
        let granted = ledger.with(|l| l.request(1, &[2, 1])).unwrap().unwrap();
        assert!(granted.is_granted());
        assert_eq!(ledger.snapshot().unwrap().available, vec![2, 1]);
        assert!(ledger.is_safe().unwrap());
    }

    #[test]
    fn test_poisoned_lock() {
        let ledger = shared(1);
        let poisoner = ledger.clone();
        let _ = thread::spawn(move || {
            poisoner
                .with(|_| panic!("poison the ledger lock"))
                .unwrap();
        })
        .join();
        assert_eq!(ledger.request(1, &[1, 0]), Err(LedgerError::LockPoisoned));
    }
}
