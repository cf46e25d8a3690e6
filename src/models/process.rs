//! Process descriptor model.
//!
//! A process is a numbered instruction stream with real-time metadata
//! (deadline and computation time) used by the EDF and LLF strategies.
//!
//! # Time Representation
//! Deadlines and computation times are abstract time units relative to
//! the start of a scheduling run (t=0).

use serde::{Deserialize, Serialize};

use super::{Instruction, Units};

/// 1-based process identifier, assigned in declaration order.
pub type ProcessId = usize;

/// Deadline used when a process declares none ("never late").
pub const NO_DEADLINE: i64 = i64::MAX;

/// An immutable process record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    /// Stable 1-based identifier.
    pub id: ProcessId,
    /// Latest completion time.
    pub deadline: i64,
    /// Declared computation time.
    pub computation_time: i64,
    /// Ordered instruction stream.
    pub instructions: Vec<Instruction>,
}

impl ProcessDescriptor {
    /// Creates a process with no deadline, zero computation time and an
    /// empty stream.
    pub fn new(id: ProcessId) -> Self {
        Self {
            id,
            deadline: NO_DEADLINE,
            computation_time: 0,
            instructions: Vec::new(),
        }
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the declared computation time.
    pub fn with_computation_time(mut self, computation_time: i64) -> Self {
        self.computation_time = computation_time;
        self
    }

    /// Appends an instruction.
    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Appends several instructions.
    pub fn with_instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(instructions);
        self
    }

    /// Maximum claim declared by this process.
    ///
    /// The arguments of the first `request` directive, one per resource
    /// type. Missing trailing entries are zero; a process that never
    /// requests anything claims nothing.
    pub fn declared_max(&self, resource_count: usize) -> Vec<Units> {
        let mut max = vec![0; resource_count];
        let first = self.instructions.iter().find_map(|ins| match ins {
            Instruction::Request(amounts) => Some(amounts),
            _ => None,
        });
        if let Some(amounts) = first {
            for (slot, &amount) in max.iter_mut().zip(amounts) {
                *slot = amount;
            }
        }
        max
    }

    /// Sum of all `compute` durations in the stream.
    pub fn total_compute(&self) -> i64 {
        self.instructions
            .iter()
            .map(|ins| match ins {
                Instruction::Compute(d) => *d,
                _ => 0,
            })
            .sum()
    }

    /// Free-text lines of the stream, in order.
    pub fn mentions(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|ins| match ins {
            Instruction::Mention(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether `instance` appears as a mention in the stream.
    pub fn mentions_instance(&self, instance: &str) -> bool {
        self.mentions().any(|m| m == instance)
    }

    /// Laxity at `current_time`: `deadline - current_time - computation_time`.
    ///
    /// Saturates instead of overflowing for [`NO_DEADLINE`].
    #[inline]
    pub fn laxity_at(&self, current_time: i64) -> i64 {
        self.deadline
            .saturating_sub(current_time)
            .saturating_sub(self.computation_time)
    }

    /// Whether the process declares a real deadline.
    #[inline]
    pub fn has_deadline(&self) -> bool {
        self.deadline != NO_DEADLINE
    }
}

impl AsRef<ProcessDescriptor> for ProcessDescriptor {
    fn as_ref(&self) -> &ProcessDescriptor {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let p = ProcessDescriptor::new(3)
            .with_deadline(10)
            .with_computation_time(2)
            .with_instruction(Instruction::Compute(2))
            .with_instruction(Instruction::End);
        assert_eq!(p.id, 3);
        assert_eq!(p.deadline, 10);
        assert_eq!(p.computation_time, 2);
        assert_eq!(p.instructions.len(), 2);
        assert!(p.has_deadline());
    }

    #[test]
    fn test_declared_max_uses_first_request() {
        let p = ProcessDescriptor::new(1).with_instructions([
            Instruction::Compute(1),
            Instruction::Request(vec![2, 1]),
            Instruction::Request(vec![5, 5]),
        ]);
        assert_eq!(p.declared_max(2), vec![2, 1]);
    }

    #[test]
    fn test_declared_max_without_request() {
        let p = ProcessDescriptor::new(1).with_instruction(Instruction::End);
        assert_eq!(p.declared_max(3), vec![0, 0, 0]);
    }

    #[test]
    fn test_declared_max_pads_short_request() {
        let p = ProcessDescriptor::new(1).with_instruction(Instruction::Request(vec![4]));
        assert_eq!(p.declared_max(2), vec![4, 0]);
    }

    #[test]
    fn test_total_compute_and_mentions() {
        let p = ProcessDescriptor::new(1).with_instructions([
            Instruction::Compute(2),
            Instruction::Mention("printer1".into()),
            Instruction::Compute(3),
        ]);
        assert_eq!(p.total_compute(), 5);
        assert!(p.mentions_instance("printer1"));
        assert!(!p.mentions_instance("printer2"));
    }

    #[test]
    fn test_laxity() {
        let a = ProcessDescriptor::new(1)
            .with_deadline(10)
            .with_computation_time(2);
        assert_eq!(a.laxity_at(0), 8);
        assert_eq!(a.laxity_at(1), 7);
        // past the deadline laxity goes negative
        assert_eq!(a.laxity_at(12), -4);

        let unbounded = ProcessDescriptor::new(2).with_computation_time(5);
        assert!(unbounded.laxity_at(100) > 0);
        assert!(!unbounded.has_deadline());
    }
}
