//! Iteration count termination.

use seqforge_core::Model;

use super::Termination;
use crate::solution::Solution;

/// Terminates after a number of iterations.
///
/// Counts every [`Solution::update`], including the ones later rewound by a
/// best-solution restore.
///
/// # Example
///
/// ```
/// use seqforge_solver::termination::IterationLimit;
///
/// // Terminate after 1000 iterations
/// let term = IterationLimit::new(1000);
/// ```
#[derive(Debug, Clone)]
pub struct IterationLimit {
    limit: u64,
}

impl IterationLimit {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl<M: Model> Termination<M> for IterationLimit {
    fn is_terminated(&self, solution: &Solution<M>) -> bool {
        solution.total_iterations() >= self.limit
    }
}
