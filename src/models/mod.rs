//! Resource-manager domain models.
//!
//! Provides the read-only inputs of a run: the resource catalog and the
//! process descriptors with their tokenized instruction streams.
//!
//! # Domain Mappings
//!
//! | u-banker | Operating system | Database | Cluster |
//! |----------|------------------|----------|---------|
//! | ResourceType | Device class | Lock class | Node pool |
//! | Instance | Device | Row lock | Node |
//! | ProcessDescriptor | Process | Transaction | Job |
//! | Instruction | System call | Statement | Step |

mod instruction;
mod process;
mod resource;

pub use instruction::{Instruction, InstructionError};
pub use process::{ProcessDescriptor, ProcessId, NO_DEADLINE};
pub use resource::{ResourceCatalog, ResourceType};

/// Resource amount (instance count) used by every matrix and amount vector.
pub type Units = i64;
