//! Built-in dispatching rules.
//!
//! # Categories
//!
//! - **Arrival**: FIFO (declaration order, i.e. process id)
//! - **Due-date**: EDF
//! - **Slack**: LLF
//!
//! # Score Convention
//! All rules return lower scores for higher priority processes.

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::ProcessDescriptor;

// ======================== Arrival rules ========================

/// First In First Out.
///
/// Orders processes by id, which is their declaration order. This is the
/// order used by the deadlock-avoidance run.
#[derive(Debug, Clone, Copy)]
pub struct Fifo;

impl DispatchingRule for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn evaluate(&self, process: &ProcessDescriptor, _context: &SchedulingContext) -> RuleScore {
        process.id as f64
    }

    fn exact_score(&self, process: &ProcessDescriptor, _context: &SchedulingContext) -> Option<i64> {
        i64::try_from(process.id).ok()
    }

    fn description(&self) -> &'static str {
        "First In First Out"
    }
}

// ======================== Due-date rules ========================

/// Earliest Deadline First.
///
/// Prioritizes processes with earlier deadlines. Processes without a
/// deadline sort last.
///
/// # Reference
/// Liu & Layland (1973); equivalent to Jackson's EDD rule on one machine.
#[derive(Debug, Clone, Copy)]
pub struct Edf;

impl DispatchingRule for Edf {
    fn name(&self) -> &'static str {
        "EDF"
    }

    fn evaluate(&self, process: &ProcessDescriptor, _context: &SchedulingContext) -> RuleScore {
        if process.has_deadline() {
            process.deadline as f64
        } else {
            f64::MAX
        }
    }

    fn exact_score(&self, process: &ProcessDescriptor, _context: &SchedulingContext) -> Option<i64> {
        // NO_DEADLINE is i64::MAX, so deadline-free processes sort last
        Some(process.deadline)
    }

    fn description(&self) -> &'static str {
        "Earliest Deadline First"
    }
}

// ======================== Slack rules ========================

/// Least Laxity First.
///
/// Laxity = deadline - current_time - computation_time.
/// Prioritizes the process with the least room to spare. Laxity depends
/// on the clock, so callers re-evaluate after each completion.
///
/// Processes without a deadline get maximum laxity (lowest priority).
#[derive(Debug, Clone, Copy)]
pub struct Llf;

impl DispatchingRule for Llf {
    fn name(&self) -> &'static str {
        "LLF"
    }

    fn evaluate(&self, process: &ProcessDescriptor, context: &SchedulingContext) -> RuleScore {
        if !process.has_deadline() {
            return f64::MAX;
        }
        process.laxity_at(context.current_time) as f64
    }

    fn exact_score(&self, process: &ProcessDescriptor, context: &SchedulingContext) -> Option<i64> {
        if !process.has_deadline() {
            return Some(i64::MAX);
        }
        Some(process.laxity_at(context.current_time))
    }

    fn description(&self) -> &'static str {
        "Least Laxity First"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_process(id: usize, deadline: Option<i64>, computation_time: i64) -> ProcessDescriptor {
        let p = ProcessDescriptor::new(id).with_computation_time(computation_time);
        match deadline {
            Some(d) => p.with_deadline(d),
            None => p,
        }
    }

    #[test]
    fn test_fifo() {
        let ctx = SchedulingContext::at_time(0);
        let first = make_process(1, Some(100), 1);
        let second = make_process(2, Some(1), 1);
        assert!(Fifo.evaluate(&first, &ctx) < Fifo.evaluate(&second, &ctx));
    }

    #[test]
    fn test_edf() {
        let ctx = SchedulingContext::at_time(0);
        let early = make_process(1, Some(10), 1);
        let late = make_process(2, Some(50), 1);
        let none = make_process(3, None, 1);
        assert!(Edf.evaluate(&early, &ctx) < Edf.evaluate(&late, &ctx));
        assert!(Edf.evaluate(&late, &ctx) < Edf.evaluate(&none, &ctx));
    }

    #[test]
    fn test_llf_initial_laxity() {
        let ctx = SchedulingContext::at_time(0);
        let a = make_process(1, Some(10), 2); // laxity 8
        let b = make_process(2, Some(4), 1); // laxity 3
        assert!((Llf.evaluate(&a, &ctx) - 8.0).abs() < 1e-10);
        assert!((Llf.evaluate(&b, &ctx) - 3.0).abs() < 1e-10);
        assert!(Llf.evaluate(&b, &ctx) < Llf.evaluate(&a, &ctx));
    }

    #[test]
    fn test_llf_recomputed_with_clock() {
        let a = make_process(1, Some(10), 2);
        let ctx = SchedulingContext::at_time(1);
        assert!((Llf.evaluate(&a, &ctx) - 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_llf_can_reorder_edf() {
        // EDF prefers the earlier deadline, LLF the tighter slack
        let ctx = SchedulingContext::at_time(0);
        let short = make_process(1, Some(10), 1); // laxity 9
        let long = make_process(2, Some(12), 8); // laxity 4
        assert!(Edf.evaluate(&short, &ctx) < Edf.evaluate(&long, &ctx));
        assert!(Llf.evaluate(&long, &ctx) < Llf.evaluate(&short, &ctx));
    }

    #[test]
    fn test_llf_no_deadline() {
        let ctx = SchedulingContext::at_time(0);
        let bounded = make_process(1, Some(1_000_000), 1);
        let unbounded = make_process(2, None, 1);
        assert!(Llf.evaluate(&bounded, &ctx) < Llf.evaluate(&unbounded, &ctx));
    }

    #[test]
    fn test_exact_scores_beyond_f64_precision() {
        let ctx = SchedulingContext::at_time(0);
        let later = make_process(1, Some((1 << 53) + 1), 0);
        let earlier = make_process(2, Some(1 << 53), 0);
        assert_eq!(Edf.evaluate(&later, &ctx), Edf.evaluate(&earlier, &ctx));
        assert!(Edf.exact_score(&earlier, &ctx) < Edf.exact_score(&later, &ctx));
        assert!(Llf.exact_score(&earlier, &ctx) < Llf.exact_score(&later, &ctx));
        assert_eq!(Llf.exact_score(&make_process(3, None, 1), &ctx), Some(i64::MAX));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(Fifo.description(), "First In First Out");
        assert_eq!(Edf.description(), "Earliest Deadline First");
        assert_eq!(Llf.description(), "Least Laxity First");
    }
}
