//! Time-based termination.

use std::time::Duration;

use seqforge_core::Model;

use super::Termination;
use crate::solution::Solution;

/// Terminates once the solution time reaches a limit.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use seqforge_solver::termination::TimeLimit;
///
/// let term = TimeLimit::new(Duration::from_secs(30));
/// let term = TimeLimit::millis(500);
/// ```
#[derive(Debug, Clone)]
pub struct TimeLimit {
    limit: Duration,
}

impl TimeLimit {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl<M: Model> Termination<M> for TimeLimit {
    fn is_terminated(&self, solution: &Solution<M>) -> bool {
        solution.time() >= self.limit.as_secs_f64()
    }
}
