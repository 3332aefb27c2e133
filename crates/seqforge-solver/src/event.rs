//! Event system for solver monitoring and extensibility.
//!
//! Three kinds of observers exist:
//!
//! - [`SolutionListener`]: notified by the [`Solution`] itself on update,
//!   best-save, restore and clear, and asked to contribute diagnostics.
//! - [`SolverListener`]: sees every proposal before it is committed and may
//!   veto it.
//! - [`SolverLifecycle`]: start, assignment, stop, finish and failure hooks.
//!
//! All callbacks are synchronous and run on the search thread while the
//! solution lock is held.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use seqforge_solver::event::{SolverEventSupport, SolverLifecycle};
//! use seqforge_solver::Solution;
//! use seqforge_test::PenaltyModel;
//!
//! #[derive(Debug)]
//! struct PrintOnFinish;
//! impl SolverLifecycle<PenaltyModel> for PrintOnFinish {
//!     fn on_finish(&self, solution: &Solution<PenaltyModel>) {
//!         println!("best value {}", solution.best_value());
//!     }
//! }
//!
//! let mut support = SolverEventSupport::<PenaltyModel>::new();
//! support.add_lifecycle(Arc::new(PrintOnFinish));
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use seqforge_core::{Info, Model, SeqForgeError};

use crate::solution::Solution;
use crate::strategy::Proposal;

/// Listener for solution changes.
pub trait SolutionListener<M: Model>: Send + Sync + Debug {
    /// Called after every [`Solution::update`].
    fn solution_updated(&self, _solution: &Solution<M>) {}

    /// Called after a best snapshot is saved.
    fn best_saved(&self, _solution: &Solution<M>) {}

    /// Called after the best snapshot is restored.
    fn best_restored(&self, _solution: &Solution<M>) {}

    /// Called after the best snapshot is cleared.
    fn best_cleared(&self, _solution: &Solution<M>) {}

    /// Adds diagnostics to the solution info.
    fn info(&self, _solution: &Solution<M>, _info: &mut Info) {}
}

/// Listener for neighbour selection.
pub trait SolverListener<M: Model>: Send + Sync + Debug {
    /// Called with every proposal before it is committed.
    ///
    /// Returning `false` discards the proposal; the iteration then counts as
    /// one without a move.
    fn neighbour_selected(&self, _iteration: u64, _proposal: &Proposal<M>) -> bool {
        true
    }
}

/// Lifecycle hooks of a solve.
pub trait SolverLifecycle<M: Model>: Send + Sync + Debug {
    /// Called once before the first iteration.
    fn on_start(&self, _solution: &Solution<M>) {}

    /// Called after a proposal was committed.
    fn on_assigned(&self, _solution: &Solution<M>, _value: f64) {}

    /// Called when the loop ends because the solver was stopped or the
    /// problem has no variables.
    fn on_stop(&self, _solution: &Solution<M>) {}

    /// Called when the loop ends because the termination condition was met.
    fn on_finish(&self, _solution: &Solution<M>) {}

    /// Called when the loop fails.
    fn on_failure(&self, _solution: &Solution<M>, _error: &SeqForgeError) {}
}

/// Central event broadcaster for solver events.
///
/// Listeners are called in registration order.
pub struct SolverEventSupport<M: Model> {
    solver_listeners: Vec<Arc<dyn SolverListener<M>>>,
    lifecycles: Vec<Arc<dyn SolverLifecycle<M>>>,
}

impl<M: Model> SolverEventSupport<M> {
    pub fn new() -> Self {
        Self {
            solver_listeners: Vec::new(),
            lifecycles: Vec::new(),
        }
    }

    pub fn add_solver_listener(&mut self, listener: Arc<dyn SolverListener<M>>) {
        self.solver_listeners.push(listener);
    }

    pub fn add_lifecycle(&mut self, lifecycle: Arc<dyn SolverLifecycle<M>>) {
        self.lifecycles.push(lifecycle);
    }

    /// Asks every listener; any veto rejects the proposal.
    pub fn fire_neighbour_selected(&self, iteration: u64, proposal: &Proposal<M>) -> bool {
        self.solver_listeners
            .iter()
            .all(|listener| listener.neighbour_selected(iteration, proposal))
    }

    pub fn fire_start(&self, solution: &Solution<M>) {
        for lifecycle in &self.lifecycles {
            lifecycle.on_start(solution);
        }
    }

    pub fn fire_assigned(&self, solution: &Solution<M>, value: f64) {
        for lifecycle in &self.lifecycles {
            lifecycle.on_assigned(solution, value);
        }
    }

    pub fn fire_stop(&self, solution: &Solution<M>) {
        for lifecycle in &self.lifecycles {
            lifecycle.on_stop(solution);
        }
    }

    pub fn fire_finish(&self, solution: &Solution<M>) {
        for lifecycle in &self.lifecycles {
            lifecycle.on_finish(solution);
        }
    }

    pub fn fire_failure(&self, solution: &Solution<M>, error: &SeqForgeError) {
        for lifecycle in &self.lifecycles {
            lifecycle.on_failure(solution, error);
        }
    }

    pub fn solver_listener_count(&self) -> usize {
        self.solver_listeners.len()
    }

    pub fn lifecycle_count(&self) -> usize {
        self.lifecycles.len()
    }
}

impl<M: Model> Default for SolverEventSupport<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Debug for SolverEventSupport<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverEventSupport")
            .field("solver_listeners", &self.solver_listeners.len())
            .field("lifecycles", &self.lifecycles.len())
            .finish()
    }
}
