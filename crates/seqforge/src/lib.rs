//! SeqForge - adaptive local search for timetabling in Rust
//!
//! Implement [`Model`] for your problem, describe the search with
//! [`Properties`] and call [`solve`].
//!
//! # Example
//!
//! ```rust
//! use seqforge::prelude::*;
//! use seqforge_test::PenaltyModel;
//!
//! let props = Properties::new()
//!     .with(keys::HILL_CLIMBER_NEIGHBOURS, "change;swap")
//!     .with(keys::TERMINATION_MAX_ITERS, 500)
//!     .with(keys::GENERAL_SEED, 1);
//! let model = PenaltyModel::new(vec![vec![3.0, 1.0], vec![0.0, 2.0]]);
//!
//! let solution = seqforge::solve(model, &props).unwrap();
//! assert!(solution.is_best_complete());
//! assert_eq!(solution.best_value(), 1.0);
//! ```

use std::path::Path;

pub use seqforge_config::{keys, ConfigError, Properties};
pub use seqforge_core::{
    Candidate, Commit, Info, LazyChangeNeighbour, LazyNeighbour, Model, Neighbour, Result,
    SeqForgeError, SimpleNeighbour, SwapNeighbour,
};
pub use seqforge_solver::{
    Extension, MoveSelector, NeighbourSelection, SearchEngine, SearchRegistry, Solution,
    SolutionListener, Solver, SolverLifecycle, SolverListener, SolverState, Termination,
};

#[cfg(feature = "console")]
pub use seqforge_console as console;

/// Solves `model` with the built-in selectors and strategies.
///
/// Blocks until the termination condition in `props` is met, then hands
/// back the solution with its best snapshot. A failed search is an error.
pub fn solve<M: Model>(model: M, props: &Properties) -> Result<Solution<M>> {
    solve_with(model, props, &SearchRegistry::new())
}

/// Like [`solve`] with a custom registry of selectors and strategies.
pub fn solve_with<M: Model>(
    model: M,
    props: &Properties,
    registry: &SearchRegistry<M>,
) -> Result<Solution<M>> {
    #[cfg(feature = "console")]
    seqforge_console::init();

    let mut solver = Solver::from_properties(model, props, registry)?;
    let state = solver.solve()?;
    if state == SolverState::Failed {
        return Err(SeqForgeError::Search(
            "the search failed, see the solve_failed event".to_string(),
        ));
    }
    tracing::debug!(event = "solved", state = %state, best_value = solver.best_value());
    solver.into_solution()
}

/// Like [`solve`] with properties loaded from a `.toml`, `.yaml` or
/// `key=value` file.
pub fn solve_file<M: Model>(model: M, path: impl AsRef<Path>) -> Result<Solution<M>> {
    let props = Properties::load(path)?;
    solve(model, &props)
}

pub mod prelude {
    pub use super::{keys, Properties};
    pub use super::{Candidate, Commit, Info, Model, Neighbour, SeqForgeError};
    pub use super::{SearchRegistry, Solution, Solver, SolverState};
}
