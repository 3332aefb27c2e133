//! Termination conditions for the search loop.

mod complete;
mod general;
mod iteration;
mod time;

use std::fmt::Debug;

use seqforge_core::Model;

use crate::solution::Solution;

pub use complete::StopWhenComplete;
pub use general::GeneralTermination;
pub use iteration::IterationLimit;
pub use time::TimeLimit;

/// Decides when the solver loop should stop.
///
/// Checked once per iteration, under the solution lock.
pub trait Termination<M: Model>: Send + Debug {
    /// Returns true if solving should terminate.
    fn is_terminated(&self, solution: &Solution<M>) -> bool;
}

#[cfg(test)]
mod tests;
