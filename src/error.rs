use std::path::PathBuf;

use thiserror::Error;

use crate::models::{InstructionError, ProcessId, Units};
use crate::validation::ValidationError;

/// Failure to read or decode a descriptor or configuration source.
///
/// Always fatal: nothing touches the ledger after a load error.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: malformed resource descriptor `{text}`")]
    MalformedResource { line: usize, text: String },
    #[error("line {line}: instruction before any `process_` header")]
    InstructionOutsideProcess { line: usize },
    #[error("line {line}: invalid process attribute `{text}`")]
    InvalidAttribute { line: usize, text: String },
    #[error("line {line}: {source}")]
    Instruction {
        line: usize,
        #[source]
        source: InstructionError,
    },
}

/// Misuse of the ledger API, or a broken lock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unknown process {0}")]
    UnknownProcess(ProcessId),
    #[error("amount vector has {got} entries, expected {expected}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("negative amount {amount} for resource {resource}")]
    NegativeAmount { resource: usize, amount: Units },
    #[error("ledger lock poisoned")]
    LockPoisoned,
    #[error("ledger invariant violated: {0}")]
    InvariantViolated(String),
}

/// Top-level error for a scheduling run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("invalid input: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
