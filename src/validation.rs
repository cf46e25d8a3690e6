//! Input validation for resource-manager runs.
//!
//! Checks structural integrity of the catalog and process set before the
//! ledger is built. Detects:
//! - Duplicate resource names, instance identifiers and process ids
//! - Resource types without instances
//! - Processes without instructions
//! - `request`/`release` argument counts that differ from the catalog size
//! - Negative amounts or `compute` durations
//! - Declared maximum claims larger than the total supply

use crate::models::{Instruction, ProcessDescriptor, ResourceCatalog};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same identifier.
    DuplicateId,
    /// A resource type has no instances.
    EmptyResource,
    /// A process has no instructions.
    EmptyProcess,
    /// An amount vector does not have one entry per resource type.
    ArityMismatch,
    /// A declared maximum exceeds the total instances of a resource.
    ExcessiveClaim,
    /// A `request`/`release` amount or a `compute` duration is negative.
    NegativeAmount,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the inputs of a run.
///
/// Checks:
/// 1. No duplicate resource names
/// 2. No duplicate instance identifiers (across all resource types)
/// 3. Every resource type has at least one instance
/// 4. No duplicate process ids
/// 5. Every process has at least one instruction
/// 6. Every `request`/`release` has one amount per resource type
/// 7. No negative amount, `compute` duration or computation time
/// 8. No declared maximum exceeds the total supply
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(catalog: &ResourceCatalog, processes: &[ProcessDescriptor]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    let mut instances = HashSet::new();
    for resource in catalog.types() {
        if !names.insert(resource.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate resource name: {}", resource.name),
            ));
        }
        if resource.instances.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyResource,
                format!("Resource '{}' has no instances", resource.name),
            ));
        }
        for instance in &resource.instances {
            if !instances.insert(instance.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate instance ID: {instance}"),
                ));
            }
        }
    }

    let resource_count = catalog.len();
    let totals = catalog.instance_counts();
    let mut process_ids = HashSet::new();

    for process in processes {
        if !process_ids.insert(process.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate process ID: {}", process.id),
            ));
        }

        if process.instructions.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyProcess,
                format!("Process {} has no instructions", process.id),
            ));
        }

        if process.computation_time < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeAmount,
                format!(
                    "Process {} has negative computation time {}",
                    process.id, process.computation_time
                ),
            ));
        }

        for instruction in &process.instructions {
            let negative = match instruction {
                Instruction::Compute(duration) => *duration < 0,
                other => other.amounts().is_some_and(|a| a.iter().any(|&v| v < 0)),
            };
            if negative {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NegativeAmount,
                    format!("Process {}: `{}` has a negative argument", process.id, instruction),
                ));
            }

            if let Some(amounts) = instruction.amounts() {
                if amounts.len() != resource_count {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::ArityMismatch,
                        format!(
                            "Process {}: `{}` has {} amounts, expected {}",
                            process.id,
                            instruction,
                            amounts.len(),
                            resource_count
                        ),
                    ));
                }
            }
        }

        let declares = process
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::Request(_)));
        if declares {
            let max = process.declared_max(resource_count);
            for (j, (&claim, &total)) in max.iter().zip(&totals).enumerate() {
                if claim > total {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::ExcessiveClaim,
                        format!(
                            "Process {} claims {} of '{}' but only {} exist",
                            process.id,
                            claim,
                            catalog.name(j),
                            total
                        ),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
