//! Deadlock-avoiding resource manager with real-time process scheduling.
//!
//! Processes declare a maximum claim on a set of resource types and then
//! replay an instruction stream (`request`, `compute`, `release`, ...)
//! against a Banker's-algorithm ledger that only grants requests leaving
//! the system in a safe state. The order in which processes run is chosen
//! by a scheduling strategy.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `ResourceCatalog`, `ProcessDescriptor`, `Instruction`
//! - **`loader`**: Text and JSON descriptor loaders
//! - **`validation`**: Input integrity checks (duplicate IDs, arity, excessive claims)
//! - **`ledger`**: `AllocationLedger` (Available / Max / Allocation / Need) and its safety check
//! - **`engine`**: `ExecutionEngine`, replaying one process against the ledger
//! - **`dispatching`**: Priority rules (FIFO, EDF, LLF) and the rule engine
//! - **`scheduler`**: Strategy driver and run KPIs
//! - **`report`**: Ledger state and run rendering
//! - **`workload`**: Seeded random workloads for stress testing
//!
//! # Example
//!
//! ```
//! use u_banker::config::RunConfig;
//! use u_banker::loader::{parse_processes, parse_resources};
//! use u_banker::scheduler::{Scheduler, Strategy};
//!
//! let catalog = parse_resources("R1: a, b\n").unwrap();
//! let processes = parse_processes(
//!     "process_1\nrequest(2)\nend\nprocess_2\nrequest(1)\nend\n",
//!     &RunConfig::default(),
//! )
//! .unwrap();
//!
//! let scheduler = Scheduler::new(catalog, processes, RunConfig::default()).unwrap();
//! let report = scheduler.run(Strategy::Sequential).unwrap();
//! assert_eq!(report.completed(), vec![1, 2]);
//! ```
//!
//! # References
//!
//! - Dijkstra (1965), "Cooperating Sequential Processes" (Banker's algorithm)
//! - Silberschatz et al. (2018), "Operating System Concepts", Ch. 8
//! - Liu (2000), "Real-Time Systems"

pub mod config;
pub mod dispatching;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod validation;
pub mod workload;

pub use error::{Error, Result};
