//! Descriptor loaders.
//!
//! # Resource descriptors
//!
//! ```text
//! R1: printer1, printer2
//! R2: disk
//! ```
//!
//! # Process descriptors
//!
//! ```text
//! process_1 deadline=10 computation=2
//! request(1, 0)
//! printer1
//! use_resources
//! compute(2)
//! end
//! process_2
//! ...
//! ```
//!
//! Ids are assigned 1, 2, ... in declaration order, whatever the header
//! says. Missing `deadline`/`computation` attributes come from
//! [`RunConfig`], for text and JSON process lists alike.

use serde::Deserialize;
use std::path::Path;

use crate::config::RunConfig;
use crate::error::LoadError;
use crate::models::{Instruction, ProcessDescriptor, ProcessId, ResourceCatalog, ResourceType};

const PROCESS_HEADER: &str = "process_";

/// Parses a resource descriptor text into a catalog.
pub fn parse_resources(text: &str) -> Result<ResourceCatalog, LoadError> {
    let mut types = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = || LoadError::MalformedResource {
            line: index + 1,
            text: line.to_string(),
        };

        let (name, rest) = line.split_once(':').ok_or_else(malformed)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed());
        }

        let mut resource = ResourceType::new(name);
        if !rest.trim().is_empty() {
            for instance in rest.split(',') {
                let instance = instance.trim();
                if instance.is_empty() {
                    return Err(malformed());
                }
                resource = resource.with_instance(instance);
            }
        }
        types.push(resource);
    }

    Ok(types.into_iter().collect())
}

/// Parses a process descriptor text.
pub fn parse_processes(text: &str, config: &RunConfig) -> Result<Vec<ProcessDescriptor>, LoadError> {
    struct Pending {
        process: ProcessDescriptor,
        computation_time: Option<i64>,
    }

    let finish = |pending: Pending| {
        let computation_time = pending
            .computation_time
            .or(config.default_computation_time)
            .unwrap_or_else(|| pending.process.total_compute());
        pending.process.with_computation_time(computation_time)
    };

    let mut processes = Vec::new();
    let mut current: Option<Pending> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(PROCESS_HEADER) {
            if let Some(done) = current.take() {
                processes.push(finish(done));
            }
            let id = processes.len() + 1;
            let mut pending = Pending {
                process: ProcessDescriptor::new(id).with_deadline(config.default_deadline),
                computation_time: None,
            };
            parse_attributes(line, line_no, &mut pending.process, &mut pending.computation_time)?;
            current = Some(pending);
            continue;
        }

        let pending = current
            .as_mut()
            .ok_or(LoadError::InstructionOutsideProcess { line: line_no })?;
        let instruction = Instruction::parse(line).map_err(|source| LoadError::Instruction {
            line: line_no,
            source,
        })?;
        pending.process.instructions.push(instruction);
    }

    if let Some(done) = current.take() {
        processes.push(finish(done));
    }
    Ok(processes)
}

/// Header attributes after the `process_N` token: `key=value` or `key: value`.
fn parse_attributes(
    header: &str,
    line: usize,
    process: &mut ProcessDescriptor,
    computation_time: &mut Option<i64>,
) -> Result<(), LoadError> {
    let attributes = header
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest)
        .unwrap_or("");
    let normalized = attributes.replace(": ", "=").replace(':', "=");

    for token in normalized.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        let invalid = || LoadError::InvalidAttribute {
            line,
            text: token.to_string(),
        };
        let (key, value) = token.split_once('=').ok_or_else(invalid)?;
        let value: i64 = value.trim().parse().map_err(|_| invalid())?;
        match key.trim() {
            "deadline" => process.deadline = value,
            "computation" | "computation_time" => *computation_time = Some(value),
            _ => return Err(invalid()),
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses a resource descriptor file.
pub fn load_resources(path: impl AsRef<Path>) -> Result<ResourceCatalog, LoadError> {
    parse_resources(&read(path.as_ref())?)
}

/// Reads and parses a process descriptor file.
pub fn load_processes(
    path: impl AsRef<Path>,
    config: &RunConfig,
) -> Result<Vec<ProcessDescriptor>, LoadError> {
    parse_processes(&read(path.as_ref())?, config)
}

/// Reads a catalog serialized as JSON.
pub fn load_resources_json(path: impl AsRef<Path>) -> Result<ResourceCatalog, LoadError> {
    Ok(serde_json::from_str(&read(path.as_ref())?)?)
}

/// One process of a JSON process list. Omitted fields take the same
/// defaults as the text format.
#[derive(Debug, Deserialize)]
struct ProcessEntry {
    #[serde(default)]
    id: Option<ProcessId>,
    #[serde(default)]
    deadline: Option<i64>,
    #[serde(default)]
    computation_time: Option<i64>,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

/// Parses a JSON process list.
///
/// Entries without an `id` are numbered by position (1-based). Missing
/// `deadline` and `computation_time` come from [`RunConfig`], as in
/// [`parse_processes`].
pub fn parse_processes_json(
    text: &str,
    config: &RunConfig,
) -> Result<Vec<ProcessDescriptor>, LoadError> {
    let entries: Vec<ProcessEntry> = serde_json::from_str(text)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let process = ProcessDescriptor::new(entry.id.unwrap_or(index + 1))
                .with_deadline(entry.deadline.unwrap_or(config.default_deadline))
                .with_instructions(entry.instructions);
            let computation_time = entry
                .computation_time
                .or(config.default_computation_time)
                .unwrap_or_else(|| process.total_compute());
            process.with_computation_time(computation_time)
        })
        .collect())
}

/// Reads a process list serialized as JSON.
pub fn load_processes_json(
    path: impl AsRef<Path>,
    config: &RunConfig,
) -> Result<Vec<ProcessDescriptor>, LoadError> {
    parse_processes_json(&read(path.as_ref())?, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{InstructionError, NO_DEADLINE};
    use crate::scheduler::Scheduler;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_parse_resources() {
        let catalog = parse_resources("R1: a, b, c\n\n  R2:x\n").unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name(0), "R1");
        assert_eq!(catalog.get(0).unwrap().instances, vec!["a", "b", "c"]);
        assert_eq!(catalog.instance_counts(), vec![3, 1]);
    }

    #[test]
    fn test_parse_resources_errors() {
        assert!(matches!(
            parse_resources("R1 a, b"),
            Err(LoadError::MalformedResource { line: 1, .. })
        ));
        assert!(matches!(
            parse_resources("R1: a\n: b"),
            Err(LoadError::MalformedResource { line: 2, .. })
        ));
        assert!(matches!(
            parse_resources("R1: a,,b"),
            Err(LoadError::MalformedResource { .. })
        ));
    }

    #[test]
    fn test_resource_without_instances_loads() {
        // rejected later by validation, not by the loader
        let catalog = parse_resources("R1:").unwrap();
        assert_eq!(catalog.instance_counts(), vec![0]);
    }

    #[test]
    fn test_parse_processes() {
        let text = "\
process_1 deadline=10 computation=2
request(1, 0)
compute(2)
end

process_7
calculate(3)
compute(4)
";
        let processes = parse_processes(text, &RunConfig::default()).unwrap();
        assert_eq!(processes.len(), 2);

        assert_eq!(processes[0].id, 1);
        assert_eq!(processes[0].deadline, 10);
        assert_eq!(processes[0].computation_time, 2);
        assert_eq!(processes[0].instructions.len(), 3);

        // ids follow declaration order, not the header number
        assert_eq!(processes[1].id, 2);
        assert_eq!(processes[1].deadline, NO_DEADLINE);
        // derived from the compute directives
        assert_eq!(processes[1].computation_time, 7);
    }

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::new()
            .with_default_deadline(40)
            .with_default_computation_time(5);
        let processes = parse_processes("process_1\ncompute(1)\n", &config).unwrap();
        assert_eq!(processes[0].deadline, 40);
        assert_eq!(processes[0].computation_time, 5);
    }

    #[test]
    fn test_colon_attributes() {
        let processes =
            parse_processes("process_1: deadline: 4, computation: 1\nend\n", &RunConfig::default())
                .unwrap();
        assert_eq!(processes[0].deadline, 4);
        assert_eq!(processes[0].computation_time, 1);
    }

    #[test]
    fn test_parse_processes_errors() {
        let config = RunConfig::default();
        assert!(matches!(
            parse_processes("compute(1)\n", &config),
            Err(LoadError::InstructionOutsideProcess { line: 1 })
        ));
        assert!(matches!(
            parse_processes("process_1 priority=3\n", &config),
            Err(LoadError::InvalidAttribute { line: 1, .. })
        ));
        assert!(matches!(
            parse_processes("process_1 deadline=soon\n", &config),
            Err(LoadError::InvalidAttribute { .. })
        ));
        assert!(matches!(
            parse_processes("process_1\nrequest(1,\n", &config),
            Err(LoadError::Instruction {
                line: 2,
                source: InstructionError::Unterminated(_)
            })
        ));
    }

    #[test]
    fn test_mentions_are_kept() {
        let processes =
            parse_processes("process_1\nprinter1\nuse_resources\n", &RunConfig::default()).unwrap();
        assert!(processes[0].mentions_instance("printer1"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_resources("/nonexistent/resources.txt"),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn test_json_files() {
        let dir = std::env::temp_dir().join(format!("u-banker-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let catalog = parse_resources("R1: a, b").unwrap();
        let processes = parse_processes("process_1\nrequest(1)\nend\n", &RunConfig::default()).unwrap();
        let catalog_path = dir.join("resources.json");
        let processes_path = dir.join("processes.json");
        std::fs::write(&catalog_path, serde_json::to_string(&catalog).unwrap()).unwrap();
        std::fs::write(&processes_path, serde_json::to_string(&processes).unwrap()).unwrap();

        assert_eq!(load_resources_json(&catalog_path).unwrap(), catalog);
        assert_eq!(
            load_processes_json(&processes_path, &RunConfig::default()).unwrap(),
            processes
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_json_defaults_from_config() {
        let config = RunConfig::new().with_default_deadline(30);
        let text = r#"[
            { "instructions": [ { "request": [1] }, { "compute": 2 }, { "compute": 3 }, "end" ] },
            { "id": 9, "deadline": 4, "computation_time": 1, "instructions": [ "end" ] }
        ]"#;
        let processes = parse_processes_json(text, &config).unwrap();

        assert_eq!(processes[0].id, 1);
        assert_eq!(processes[0].deadline, 30);
        assert_eq!(processes[0].computation_time, 5);
        assert_eq!(processes[1].id, 9);
        assert_eq!(processes[1].deadline, 4);
        assert_eq!(processes[1].computation_time, 1);

        let fixed = RunConfig::new().with_default_computation_time(8);
        assert_eq!(parse_processes_json(text, &fixed).unwrap()[0].computation_time, 8);
    }

    #[test]
    fn test_json_negative_amount_rejected() {
        let catalog = parse_resources("R1: a, b").unwrap();
        let config = RunConfig::default();

        let negative_request = r#"[ { "instructions": [ { "request": [-1] } ] } ]"#;
        let processes = parse_processes_json(negative_request, &config).unwrap();
        let err = Scheduler::new(catalog.clone(), processes, config.clone()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ref errors)
                if errors.iter().any(|e| e.kind == ValidationErrorKind::NegativeAmount)
        ));

        let negative_compute = r#"[ { "instructions": [ { "compute": -7 }, "end" ] } ]"#;
        let processes = parse_processes_json(negative_compute, &config).unwrap();
        assert!(Scheduler::new(catalog, processes, config).is_err());
    }
}
