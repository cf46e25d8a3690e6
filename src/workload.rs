//! Random workload generation.
//!
//! Produces catalogs and process sets that pass input validation, for
//! stress-testing the ledger and the strategies. Every generated stream
//! opens with a `request` (its maximum claim), then mixes `compute`,
//! `release`, re-requests within the claim, `use_resources` over mentioned
//! instances and `print_resources_used`. Most streams end with `end`; some
//! stop without it so that allocations are retained.
//!
//! Generation is deterministic for a given seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;

use crate::models::{Instruction, ProcessDescriptor, ResourceCatalog, ResourceType, Units};

/// A generated catalog and process set.
#[derive(Debug, Clone)]
pub struct Workload {
    pub catalog: ResourceCatalog,
    pub processes: Vec<ProcessDescriptor>,
}

impl Workload {
    /// Renders the catalog in resource descriptor format.
    pub fn resource_text(&self) -> String {
        let mut out = String::new();
        for resource in self.catalog.types() {
            let _ = writeln!(out, "{}: {}", resource.name, resource.instances.join(", "));
        }
        out
    }

    /// Renders the processes in process descriptor format.
    pub fn process_text(&self) -> String {
        let mut out = String::new();
        for process in &self.processes {
            let _ = write!(out, "process_{}", process.id);
            if process.has_deadline() {
                let _ = write!(out, " deadline={}", process.deadline);
            }
            let _ = writeln!(out, " computation={}", process.computation_time);
            for instruction in &process.instructions {
                let _ = writeln!(out, "{instruction}");
            }
        }
        out
    }
}

/// Random workload parameters.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    /// Number of resource types (inclusive range).
    pub resource_types: (usize, usize),
    /// Instances per resource type (inclusive range).
    pub instances: (usize, usize),
    /// Number of processes (inclusive range).
    pub processes: (usize, usize),
    /// Duration of each `compute` (inclusive range).
    pub compute: (Units, Units),
    /// Probability that a process gets a deadline.
    pub deadline_probability: f64,
    /// Probability that a stream finishes with `end`.
    pub end_probability: f64,
}

impl Default for WorkloadGenerator {
    fn default() -> Self {
        Self {
            resource_types: (1, 4),
            instances: (1, 5),
            processes: (2, 8),
            compute: (1, 5),
            deadline_probability: 0.8,
            end_probability: 0.8,
        }
    }
}

impl WorkloadGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of processes to exactly `count`.
    pub fn with_process_count(mut self, count: usize) -> Self {
        self.processes = (count, count);
        self
    }

    /// Sets the resource-type range.
    pub fn with_resource_types(mut self, min: usize, max: usize) -> Self {
        self.resource_types = (min.max(1), max.max(min.max(1)));
        self
    }

    /// Sets the instances-per-type range.
    pub fn with_instances(mut self, min: usize, max: usize) -> Self {
        self.instances = (min.max(1), max.max(min.max(1)));
        self
    }

    /// Generates a workload from a seed.
    pub fn generate_seeded(&self, seed: u64) -> Workload {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate(&mut rng)
    }

    /// Generates a workload.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Workload {
        let type_count = rng.random_range(self.resource_types.0..=self.resource_types.1);
        let catalog: ResourceCatalog = (0..type_count)
            .map(|j| {
                let count = rng.random_range(self.instances.0..=self.instances.1);
                ResourceType::new(format!("R{}", j + 1))
                    .with_instances((0..count).map(|k| format!("r{}_{}", j + 1, k)))
            })
            .collect();

        let process_count = rng.random_range(self.processes.0..=self.processes.1);
        let processes = (1..=process_count)
            .map(|id| self.generate_process(id, &catalog, rng))
            .collect();

        Workload { catalog, processes }
    }

    fn generate_process<R: Rng>(
        &self,
        id: usize,
        catalog: &ResourceCatalog,
        rng: &mut R,
    ) -> ProcessDescriptor {
        let totals = catalog.instance_counts();
        let max: Vec<Units> = totals.iter().map(|&t| rng.random_range(0..=t)).collect();

        let mut instructions = vec![Instruction::Request(max.clone())];
        let mut held = max;

        for _ in 0..rng.random_range(1..=4) {
            match rng.random_range(0..5) {
                0 | 1 => instructions.push(Instruction::Compute(
                    rng.random_range(self.compute.0..=self.compute.1),
                )),
                2 => {
                    let amounts: Vec<Units> =
                        held.iter().map(|&h| rng.random_range(0..=h)).collect();
                    for (h, a) in held.iter_mut().zip(&amounts) {
                        *h -= a;
                    }
                    instructions.push(Instruction::Release(amounts.clone()));
                    if rng.random_bool(0.5) {
                        // take some of it back, within the claim
                        let again: Vec<Units> =
                            amounts.iter().map(|&a| rng.random_range(0..=a)).collect();
                        for (h, a) in held.iter_mut().zip(&again) {
                            *h += a;
                        }
                        instructions.push(Instruction::Request(again));
                    }
                }
                3 => {
                    let resource = &catalog.types()[rng.random_range(0..catalog.len())];
                    let instance = &resource.instances[rng.random_range(0..resource.instances.len())];
                    instructions.push(Instruction::Mention(instance.clone()));
                    instructions.push(Instruction::UseResources);
                }
                _ => instructions.push(Instruction::PrintResourcesUsed),
            }
        }

        if !instructions.iter().any(|i| matches!(i, Instruction::Compute(_))) {
            instructions.push(Instruction::Compute(self.compute.0.max(1)));
        }
        if rng.random_bool(self.end_probability) {
            instructions.push(Instruction::End);
        }

        let process = ProcessDescriptor::new(id).with_instructions(instructions);
        let computation_time = process.total_compute();
        let process = process.with_computation_time(computation_time);

        if rng.random_bool(self.deadline_probability) {
            let slack = rng.random_range(0..=computation_time * 3);
            process.with_deadline(computation_time + slack)
        } else {
            process
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::loader::{parse_processes, parse_resources};
    use crate::scheduler::{Scheduler, Strategy};
    use crate::validation::validate_input;

    #[test]
    fn test_generated_workloads_validate() {
        let generator = WorkloadGenerator::new();
        for seed in 0..50 {
            let workload = generator.generate_seeded(seed);
            assert!(
                validate_input(&workload.catalog, &workload.processes).is_ok(),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let generator = WorkloadGenerator::new();
        let a = generator.generate_seeded(7);
        let b = generator.generate_seeded(7);
        assert_eq!(a.catalog, b.catalog);
        assert_eq!(a.processes, b.processes);
    }

    #[test]
    fn test_invariants_hold_under_all_strategies() {
        let generator = WorkloadGenerator::new().with_process_count(6);
        let config = RunConfig::default().with_invariant_checks(true);

        for seed in 0..40 {
            let workload = generator.generate_seeded(seed);
            let scheduler = Scheduler::new(workload.catalog, workload.processes, config.clone())
                .unwrap();

            for strategy in Strategy::ALL {
                let report = scheduler.run(strategy).unwrap();
                assert_eq!(report.executions.len(), 6);

                let totals = &report.initial.totals;
                for snapshot in &report.snapshots {
                    for j in 0..totals.len() {
                        let held: Units = snapshot.allocation.iter().map(|row| row[j]).sum();
                        assert_eq!(snapshot.available[j] + held, totals[j], "seed {seed}");
                        assert!(snapshot.available[j] >= 0);
                    }
                    for ((max, alloc), need) in
                        snapshot.max.iter().zip(&snapshot.allocation).zip(&snapshot.need)
                    {
                        for j in 0..totals.len() {
                            assert!(alloc[j] >= 0);
                            assert_eq!(need[j], max[j] - alloc[j]);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_text_renders_through_loader() {
        let workload = WorkloadGenerator::new().generate_seeded(3);
        let catalog = parse_resources(&workload.resource_text()).unwrap();
        let processes = parse_processes(&workload.process_text(), &RunConfig::default()).unwrap();
        assert_eq!(catalog, workload.catalog);
        assert_eq!(processes, workload.processes);
    }
}
