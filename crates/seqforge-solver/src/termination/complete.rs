use seqforge_core::Model;

use super::Termination;
use crate::solution::Solution;

/// Terminates as soon as the best saved solution assigns every variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopWhenComplete;

impl<M: Model> Termination<M> for StopWhenComplete {
    fn is_terminated(&self, solution: &Solution<M>) -> bool {
        solution.is_best_complete()
    }
}
