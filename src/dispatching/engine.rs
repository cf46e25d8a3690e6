//! Rule engine for multi-criteria dispatching.
//!
//! Applies rules in sequence: the next rule is consulted only when the
//! previous ones tie, and a final tie-breaker settles what remains. Rules
//! that expose an exact integer score are compared on it; the rest are
//! compared on their `f64` score within an epsilon.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::ProcessDescriptor;

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Leave tied processes in input order (the sort is stable).
    #[default]
    InputOrder,
    /// Deterministic by ascending process id.
    ById,
}

/// A composable rule engine for process prioritization.
///
/// # Example
/// ```
/// use u_banker::dispatching::{RuleEngine, TieBreaker};
/// use u_banker::dispatching::rules;
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::Llf)
///     .with_final_tie_breaker(TieBreaker::ById);
/// assert_eq!(engine.rule_names(), vec!["LLF"]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            tie_breaker: TieBreaker::InputOrder,
            epsilon: 1e-9,
        }
    }

    /// Adds a rule; rules added later only break ties of earlier ones.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Names of the configured rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Sorts processes by priority (highest priority first).
    ///
    /// Returns indices into the input slice. The sort is stable.
    pub fn sort_indices<P: AsRef<ProcessDescriptor>>(
        &self,
        processes: &[P],
        context: &SchedulingContext,
    ) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..processes.len()).collect();
        indices.sort_by(|&a, &b| {
            self.compare(processes[a].as_ref(), processes[b].as_ref(), context)
        });
        indices
    }

    /// Returns the index of the highest-priority process.
    ///
    /// Among equals, the earliest in the input wins unless the tie-breaker
    /// says otherwise.
    pub fn select_best<P: AsRef<ProcessDescriptor>>(
        &self,
        processes: &[P],
        context: &SchedulingContext,
    ) -> Option<usize> {
        (0..processes.len()).reduce(|best, candidate| {
            match self.compare(
                processes[candidate].as_ref(),
                processes[best].as_ref(),
                context,
            ) {
                Ordering::Less => candidate,
                _ => best,
            }
        })
    }

    /// Scores of one process under each rule.
    pub fn evaluate(&self, process: &ProcessDescriptor, context: &SchedulingContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|rule| rule.evaluate(process, context))
            .collect()
    }

    fn compare(
        &self,
        a: &ProcessDescriptor,
        b: &ProcessDescriptor,
        context: &SchedulingContext,
    ) -> Ordering {
        for rule in &self.rules {
            if let (Some(key_a), Some(key_b)) =
                (rule.exact_score(a, context), rule.exact_score(b, context))
            {
                match key_a.cmp(&key_b) {
                    Ordering::Equal => continue,
                    ordering => return ordering,
                }
            }

            let score_a = rule.evaluate(a, context);
            let score_b = rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }

        match self.tie_breaker {
            TieBreaker::InputOrder => Ordering::Equal,
            TieBreaker::ById => a.id.cmp(&b.id),
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.rule_names())
            .field("tie_breaker", &self.tie_breaker)
            .finish()
    }
}
