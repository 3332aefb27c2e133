//! SeqForge Solver Engine
//!
//! This crate provides the local-search engine:
//! - Solution with best-state bookkeeping and listeners
//! - Move generators, selectors and the string-keyed registry
//! - Heuristic sequences learning which generators to chain
//! - Acceptance strategies (hill climbing, great deluge, simulated
//!   annealing), construction and the composite orchestrator
//! - Termination conditions, comparator and extensions
//! - The threaded Solver

pub mod comparator;
pub mod event;
pub mod extension;
pub mod selector;
pub mod sequence;
pub mod solution;
pub mod solver;
pub mod strategy;
pub mod termination;

#[cfg(test)]
mod test_utils;

pub use comparator::{GeneralComparator, SolutionComparator};
pub use event::{SolutionListener, SolverEventSupport, SolverLifecycle, SolverListener};
pub use extension::{Extension, ExtensionRegistry, Registration};
pub use selector::{
    parse_selector_specs, ChangeMoveSelector, LazyChangeMoveSelector, MoveSelector,
    NeighbourSelector, SearchRegistry, SelectorFactory, SelectorPool, SelectorSpec,
    StrategyFactory, SwapMoveSelector,
};
pub use sequence::{learning_increment, HeuristicSequence, SequenceScores, SharedScores};
pub use solution::{BestSnapshot, PerturbationCounter, Solution};
pub use solver::{SearchEngine, Solver, SolverState};
pub use strategy::{
    AcceptStats, Acceptance, AcceptanceCriterion, AnnealingSchedule, Chain, DelugeSchedule,
    GreatDeluge, GroupAccept, HillClimbing, NeighbourSelection, Orchestrator, Proposal,
    SearchPhase, SimulatedAnnealing, StandardConstruction,
};
pub use termination::{GeneralTermination, IterationLimit, StopWhenComplete, Termination, TimeLimit};
