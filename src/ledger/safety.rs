//! Banker's-algorithm safety check.
//!
//! # Algorithm
//!
//! 1. `Work := Available`, `Finish[i] := false`.
//! 2. Sweep all unfinished processes in row (ascending id) order. A process
//!    whose `Need` fits in `Work` is assumed to run to completion and return
//!    its allocation: `Work += Allocation[i]`, `Finish[i] := true`.
//! 3. Repeat full sweeps until one makes no progress.
//! 4. The state is safe iff every process finished.
//!
//! A single sweep is not enough: a process early in the order may only
//! become satisfiable after a later one has returned its allocation.
//!
//! # Complexity
//! O(n² · m) for n processes and m resource types.
//!
//! # Reference
//! Dijkstra (1965), "Cooperating Sequential Processes";
//! Silberschatz et al. (2018), "Operating System Concepts", Ch. 8.6.3

use crate::models::Units;

/// Returns a completion order (row indices) proving the state safe, or
/// `None` if no such order exists. Pure: inputs are only read.
pub(crate) fn safe_sequence(
    available: &[Units],
    allocation: &[Vec<Units>],
    need: &[Vec<Units>],
) -> Option<Vec<usize>> {
    let n = need.len();
    let mut work = available.to_vec();
    let mut finish = vec![false; n];
    let mut order = Vec::with_capacity(n);

    loop {
        let mut progressed = false;
        for i in 0..n {
            if finish[i] {
                continue;
            }
            let fits = need[i].iter().zip(&work).all(|(need, work)| need <= work);
            if fits {
                for (w, held) in work.iter_mut().zip(&allocation[i]) {
                    *w += held;
                }
                finish[i] = true;
                order.push(i);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    if finish.iter().all(|&f| f) {
        Some(order)
    } else {
        None
    }
}
