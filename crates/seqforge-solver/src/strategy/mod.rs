//! Neighbour selection strategies.
//!
//! A [`NeighbourSelection`] hands the solver one [`Proposal`] per call. The
//! acceptance strategies ([`HillClimbing`], [`GreatDeluge`],
//! [`SimulatedAnnealing`]) each drive their own [`HeuristicSequence`](crate::sequence::HeuristicSequence)
//! and only return candidates they accept. [`Orchestrator`] and
//! [`GroupAccept`] combine them with [`StandardConstruction`].

mod construction;
mod great_deluge;
mod group_accept;
mod hill_climbing;
mod orchestrator;
mod simulated_annealing;


use std::fmt::{self, Debug};

use rand::rngs::StdRng;
use seqforge_config::LearningMethod;
use seqforge_core::{Candidate, Commit, LazyNeighbour, Model, Neighbour, Result};
use smallvec::SmallVec;

use crate::sequence::HeuristicSequence;
use crate::solution::Solution;

pub use construction::StandardConstruction;
pub use great_deluge::{DelugeSchedule, GreatDeluge};
pub use group_accept::GroupAccept;
pub use hill_climbing::HillClimbing;
pub use orchestrator::{Orchestrator, SearchPhase};
pub use simulated_annealing::{AcceptStats, Acceptance, AnnealingSchedule, SimulatedAnnealing};

/// Acceptance predicate evaluated while a lazy neighbour is applied.
pub type AcceptanceCriterion<M> = Box<dyn FnMut(&M, f64) -> bool + Send>;

/// Candidates an acceptance strategy draws in one call before it yields.
pub(crate) const MAX_ATTEMPTS: u64 = 10_000;

/// One draw of an acceptance strategy from its heuristic sequence.
pub(crate) enum Draw<M: Model> {
    /// The schedule reheated and the strategy yields.
    Yield,
    /// The picked selector proposed nothing.
    Empty,
    Candidate(usize, Candidate<M>),
}

/// What a strategy hands to the solver.
pub enum Proposal<M: Model> {
    /// An accepted move with a known delta.
    Move(Box<dyn Neighbour<M>>),
    /// A move whose acceptance is decided while it is applied.
    Lazy {
        neighbour: Box<dyn LazyNeighbour<M>>,
        criterion: AcceptanceCriterion<M>,
    },
}

impl<M: Model> Proposal<M> {
    pub fn lazy(neighbour: Box<dyn LazyNeighbour<M>>, criterion: AcceptanceCriterion<M>) -> Self {
        Proposal::Lazy {
            neighbour,
            criterion,
        }
    }

    /// Known delta, `None` for lazy proposals.
    pub fn value(&self) -> Option<f64> {
        match self {
            Proposal::Move(neighbour) => Some(neighbour.value()),
            Proposal::Lazy { .. } => None,
        }
    }

    /// Commits the proposal into `model`.
    pub fn commit(self, model: &mut M, iteration: u64) -> Commit {
        match self {
            Proposal::Move(neighbour) => {
                neighbour.assign(model, iteration);
                Commit::Applied(neighbour.value())
            }
            Proposal::Lazy {
                neighbour,
                mut criterion,
            } => neighbour.commit(model, iteration, &mut *criterion),
        }
    }
}

impl<M: Model> Debug for Proposal<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proposal::Move(neighbour) => f.debug_tuple("Move").field(neighbour).finish(),
            Proposal::Lazy { neighbour, .. } => f.debug_tuple("Lazy").field(neighbour).finish(),
        }
    }
}

/// Top-level neighbour selection driven by the solver.
pub trait NeighbourSelection<M: Model>: Send + Debug {
    fn name(&self) -> &'static str;

    /// Prepares for a solve. Resets learned scores.
    fn init(&mut self, solution: &Solution<M>) -> Result<()>;

    /// Next proposal, or `None` when the strategy has nothing to offer.
    ///
    /// Strategies may modify the solution (for example to restore the best
    /// state) but never commit the returned proposal themselves.
    fn select_neighbour(
        &mut self,
        solution: &mut Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Proposal<M>>>;

    /// Called by the solver after it saved a new best solution.
    fn best_saved(&mut self, _solution: &Solution<M>) {}

    /// Resets every learned sequence score.
    fn reset_scores(&mut self) {}
}

/// The selectors used since the last chain end, with a failure counter.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    selectors: SmallVec<[usize; 8]>,
    failures: u64,
    reset_interval: u64,
}

impl Chain {
    /// A chain dropped after `reset_interval` consecutive failures.
    pub fn new(reset_interval: u64) -> Self {
        Self {
            selectors: SmallVec::new(),
            failures: 0,
            reset_interval: reset_interval.max(1),
        }
    }

    /// 0-based selector indices, oldest first.
    pub fn selectors(&self) -> &[usize] {
        &self.selectors
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.selectors.clear();
        self.failures = 0;
    }

    /// Score table row of the current last selector: 0 for an empty chain,
    /// otherwise its 1-based index.
    pub fn previous_row(&self) -> usize {
        self.selectors.last().map_or(0, |idx| idx + 1)
    }

    /// Records an accepted non-worsening move by `selected` and learns from
    /// it with the sequence's configured rule.
    pub fn record_improvement<M: Model>(
        &mut self,
        sequence: &HeuristicSequence<M>,
        selected: usize,
        value: f64,
        time: f64,
    ) {
        self.record_improvement_with(
            sequence,
            sequence.config().learning_method,
            selected,
            value,
            time,
        );
    }

    /// Like [`Chain::record_improvement`] with an explicit learning rule.
    pub fn record_improvement_with<M: Model>(
        &mut self,
        sequence: &HeuristicSequence<M>,
        method: LearningMethod,
        selected: usize,
        value: f64,
        time: f64,
    ) {
        let previous = self.previous_row();
        let ended = sequence.is_ended();
        self.selectors.push(selected);
        sequence.update_score_with(method, previous, selected, ended, value, time);
        if ended {
            self.selectors.clear();
        }
        self.failures = 0;
    }

    /// Records an accepted move that did not improve.
    pub fn record_acceptance(&mut self) {
        self.failures = 0;
    }

    /// Records a missing or rejected candidate. Drops the chain once the
    /// reset interval is reached.
    pub fn record_failure(&mut self) {
        self.failures += 1;
        if self.failures >= self.reset_interval {
            self.clear();
        }
    }
}
