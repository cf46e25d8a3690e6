//! Dispatching rules and rule engine for process ordering.
//!
//! Provides the priority rules behind the three scheduling strategies
//! (FIFO by id, EDF, LLF) and a rule engine that sorts or selects
//! processes by them.
//!
//! # Usage
//!
//! ```
//! use u_banker::dispatching::{RuleEngine, SchedulingContext, TieBreaker};
//! use u_banker::dispatching::rules;
//! use u_banker::models::ProcessDescriptor;
//!
//! let processes = vec![
//!     ProcessDescriptor::new(1).with_deadline(5),
//!     ProcessDescriptor::new(2).with_deadline(1),
//!     ProcessDescriptor::new(3).with_deadline(3),
//! ];
//! let engine = RuleEngine::new()
//!     .with_rule(rules::Edf)
//!     .with_final_tie_breaker(TieBreaker::ById);
//!
//! let order: Vec<_> = engine
//!     .sort_indices(&processes, &SchedulingContext::at_time(0))
//!     .into_iter()
//!     .map(|i| processes[i].id)
//!     .collect();
//! assert_eq!(order, vec![2, 3, 1]);
//! ```
//!
//! # References
//!
//! - Liu & Layland (1973), "Scheduling Algorithms for Multiprogramming in a
//!   Hard-Real-Time Environment"
//! - Mok (1983), "Fundamental Design Problems of Distributed Systems for the
//!   Hard-Real-Time Environment" (least laxity)

mod context;
mod engine;
pub mod rules;

pub use context::SchedulingContext;
pub use engine::{RuleEngine, TieBreaker};

use crate::models::ProcessDescriptor;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (dispatched first).
pub type RuleScore = f64;

/// A dispatching rule that evaluates process priority.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for processes that should run first.
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "EDF", "LLF").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a process given the current scheduling context.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, process: &ProcessDescriptor, context: &SchedulingContext) -> RuleScore;

    /// Exact integer priority, when the rule has one.
    ///
    /// The rule engine compares these instead of the `f64` scores when both
    /// sides provide one, so large deadlines never collapse into a tie.
    fn exact_score(&self, _process: &ProcessDescriptor, _context: &SchedulingContext) -> Option<i64> {
        None
    }

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
