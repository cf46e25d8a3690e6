//! Process instruction model and tokenizer.
//!
//! Each line of a process body decodes to exactly one [`Instruction`].
//! Keywords are matched as whole tokens, so an instance called `pending`
//! is never mistaken for `end`.
//!
//! # Grammar
//!
//! ```text
//! compute(n) | calculate(n)
//! request(a, b, ...)
//! release(a, b, ...)
//! use_resources
//! print_resources_used
//! end
//! <anything else>        -> Mention (referenced by use_resources)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Units;

/// A decoded process instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Occupy the execution context for the given number of time units.
    Compute(Units),
    /// Ask the ledger for amounts, one per resource type.
    Request(Vec<Units>),
    /// Claim every available instance mentioned in the stream.
    UseResources,
    /// Return amounts, one per resource type.
    Release(Vec<Units>),
    /// Emit the resources used so far.
    PrintResourcesUsed,
    /// Release everything held and finish.
    End,
    /// Free text, usually an instance identifier.
    Mention(String),
}

/// Instruction decoding error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstructionError {
    #[error("unknown directive `{0}`")]
    UnknownDirective(String),
    #[error("directive `{0}` requires a parenthesized argument list")]
    MissingArguments(String),
    #[error("directive `{0}` takes no arguments")]
    UnexpectedArguments(String),
    #[error("unterminated argument list in `{0}`")]
    Unterminated(String),
    #[error("invalid amount `{value}` in `{line}`")]
    InvalidAmount { line: String, value: String },
    #[error("`compute` takes exactly one argument, got {0}")]
    ComputeArity(usize),
}

const ARGUMENT_DIRECTIVES: [&str; 4] = ["compute", "calculate", "request", "release"];
const BARE_DIRECTIVES: [&str; 3] = ["use_resources", "print_resources_used", "end"];

impl Instruction {
    /// Decodes a single instruction line.
    ///
    /// Surrounding whitespace is ignored. Lines that are neither a known
    /// directive nor shaped like a call (`name(...)`) become a
    /// [`Instruction::Mention`].
    pub fn parse(line: &str) -> Result<Self, InstructionError> {
        let line = line.trim();

        if let Some(open) = line.find('(') {
            let keyword = line[..open].trim();
            if !is_identifier(keyword) {
                return Ok(Instruction::Mention(line.to_string()));
            }
            let rest = &line[open + 1..];
            let close = rest
                .rfind(')')
                .ok_or_else(|| InstructionError::Unterminated(line.to_string()))?;
            if !rest[close + 1..].trim().is_empty() {
                return Err(InstructionError::Unterminated(line.to_string()));
            }
            let amounts = parse_amounts(line, &rest[..close])?;

            return match keyword {
                "compute" | "calculate" => match amounts.as_slice() {
                    [duration] => Ok(Instruction::Compute(*duration)),
                    other => Err(InstructionError::ComputeArity(other.len())),
                },
                "request" => Ok(Instruction::Request(amounts)),
                "release" => Ok(Instruction::Release(amounts)),
                k if BARE_DIRECTIVES.contains(&k) => {
                    Err(InstructionError::UnexpectedArguments(k.to_string()))
                }
                k => Err(InstructionError::UnknownDirective(k.to_string())),
            };
        }

        match line {
            "use_resources" => Ok(Instruction::UseResources),
            "print_resources_used" => Ok(Instruction::PrintResourcesUsed),
            "end" => Ok(Instruction::End),
            k if ARGUMENT_DIRECTIVES.contains(&k) => {
                Err(InstructionError::MissingArguments(k.to_string()))
            }
            other => Ok(Instruction::Mention(other.to_string())),
        }
    }

    /// Amount vector carried by `request`/`release`, if any.
    pub fn amounts(&self) -> Option<&[Units]> {
        match self {
            Instruction::Request(a) | Instruction::Release(a) => Some(a),
            _ => None,
        }
    }

    /// Whether this is a directive (anything except a mention).
    pub fn is_directive(&self) -> bool {
        !matches!(self, Instruction::Mention(_))
    }
}

impl FromStr for Instruction {
    type Err = InstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instruction::parse(s)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Compute(d) => write!(f, "compute({d})"),
            Instruction::Request(a) => write!(f, "request({})", join(a)),
            Instruction::UseResources => f.write_str("use_resources"),
            Instruction::Release(a) => write!(f, "release({})", join(a)),
            Instruction::PrintResourcesUsed => f.write_str("print_resources_used"),
            Instruction::End => f.write_str("end"),
            Instruction::Mention(text) => f.write_str(text),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_amounts(line: &str, args: &str) -> Result<Vec<Units>, InstructionError> {
    if args.trim().is_empty() {
        return Ok(Vec::new());
    }
    args.split(',')
        .map(|raw| {
            let value = raw.trim();
            match value.parse::<Units>() {
                Ok(n) if n >= 0 => Ok(n),
                _ => Err(InstructionError::InvalidAmount {
                    line: line.to_string(),
                    value: value.to_string(),
                }),
            }
        })
        .collect()
}

fn join(amounts: &[Units]) -> String {
    amounts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
