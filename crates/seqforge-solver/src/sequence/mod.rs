//! Adaptive heuristic sequencing.
//!
//! A [`HeuristicSequence`] learns which move generators work well after which.
//! It keeps two score tables over its `k` selectors:
//!
//! - transition scores `k+1 × k`, where row 0 means "no previous selector"
//!   and row `i` means "selector `i-1` came last";
//! - outcome scores `k × 2`, counting how often using a selector continued
//!   (column 0) or ended (column 1) a successful chain.
//!
//! Every entry starts at 1.0 and only grows.


use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use seqforge_config::{LearningMethod, SequenceConfig};
use seqforge_core::{Candidate, Model, Result, SeqForgeError};
use tracing::trace;

use crate::selector::{roulette, NeighbourSelector};
use crate::solution::Solution;

/// Ceiling of the time-weighted learning increment.
const MAX_TIME_WEIGHT: f64 = 1e12;

/// The learned score tables of one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceScores {
    transitions: Vec<Vec<f64>>,
    outcomes: Vec<[f64; 2]>,
}

impl SequenceScores {
    /// Fresh tables for `k` selectors, every entry 1.0.
    pub fn new(k: usize) -> Self {
        Self {
            transitions: vec![vec![1.0; k]; k + 1],
            outcomes: vec![[1.0; 2]; k],
        }
    }

    pub fn selector_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Sets every entry back to 1.0.
    pub fn reset(&mut self) {
        *self = Self::new(self.selector_count());
    }

    /// Score of using `current` after `previous` (0 = chain start, else
    /// 1-based selector index).
    pub fn transition(&self, previous: usize, current: usize) -> f64 {
        self.transitions[previous][current]
    }

    /// Score of `current` continuing (`false`) or ending (`true`) a chain.
    pub fn outcome(&self, current: usize, ended: bool) -> f64 {
        self.outcomes[current][ended as usize]
    }

    /// Adds `amount` to both tables. Negative amounts are ignored.
    pub fn reward(&mut self, previous: usize, current: usize, ended: bool, amount: f64) {
        if !(amount > 0.0) {
            return;
        }
        self.transitions[previous][current] += amount;
        self.outcomes[current][ended as usize] += amount;
    }
}

/// Score tables shared between sequences.
///
/// Sequences own their tables unless explicitly wired to a shared handle
/// with [`HeuristicSequence::with_shared_scores`].
pub type SharedScores = Arc<Mutex<SequenceScores>>;

fn lock(scores: &SharedScores) -> MutexGuard<'_, SequenceScores> {
    scores.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Learning increment for an accepted non-worsening move.
pub fn learning_increment(method: LearningMethod, value: f64, time: f64) -> f64 {
    match method {
        LearningMethod::Count => 1.0,
        LearningMethod::TimeWeighted => (time / 30.0).exp().floor().min(MAX_TIME_WEIGHT),
        LearningMethod::Delta => -value,
    }
}

/// Picks the next selector of a chain and learns from successful chains.
pub struct HeuristicSequence<M: Model> {
    selectors: Vec<NeighbourSelector<M>>,
    scores: SharedScores,
    config: SequenceConfig,
    ended: bool,
}

impl<M: Model> HeuristicSequence<M> {
    /// Creates a sequence with its own score tables.
    pub fn new(selectors: Vec<NeighbourSelector<M>>, config: SequenceConfig) -> Result<Self> {
        let scores = Arc::new(Mutex::new(SequenceScores::new(selectors.len())));
        Self::with_shared_scores(selectors, config, scores)
    }

    /// Creates a sequence that learns into `scores`.
    pub fn with_shared_scores(
        selectors: Vec<NeighbourSelector<M>>,
        config: SequenceConfig,
        scores: SharedScores,
    ) -> Result<Self> {
        if selectors.is_empty() {
            return Err(SeqForgeError::Config(
                "a heuristic sequence needs at least one neighbour selector".to_string(),
            ));
        }
        let k = lock(&scores).selector_count();
        if k != selectors.len() {
            return Err(SeqForgeError::Config(format!(
                "shared scores cover {} selectors, sequence has {}",
                k,
                selectors.len()
            )));
        }
        Ok(Self {
            selectors,
            scores,
            config,
            ended: false,
        })
    }

    /// Handle to the score tables, for wiring another sequence to them.
    pub fn shared_scores(&self) -> SharedScores {
        Arc::clone(&self.scores)
    }

    /// Snapshot of the current tables.
    pub fn scores(&self) -> SequenceScores {
        lock(&self.scores).clone()
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Initializes every selector and resets the tables.
    pub fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        for selector in &mut self.selectors {
            selector.init(solution)?;
        }
        self.reset_scores();
        Ok(())
    }

    pub fn reset_scores(&mut self) {
        lock(&self.scores).reset();
        self.ended = false;
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn selector(&self, idx: usize) -> &NeighbourSelector<M> {
        &self.selectors[idx]
    }

    pub fn selector_mut(&mut self, idx: usize) -> &mut NeighbourSelector<M> {
        &mut self.selectors[idx]
    }

    pub fn selectors(&self) -> &[NeighbourSelector<M>] {
        &self.selectors
    }

    pub fn set_hill_climbing_mode(&mut self, enabled: bool) {
        for selector in &mut self.selectors {
            selector.set_hill_climbing_mode(enabled);
        }
    }

    /// Picks the selector that should follow `chain` (0-based indices) and
    /// decides whether it ends the chain, see [`HeuristicSequence::is_ended`].
    pub fn get_neighbour(&mut self, chain: &[usize], rng: &mut StdRng) -> usize {
        let k = self.selectors.len();
        let last = chain.last().map_or(0, |idx| idx + 1);

        let mut admissible: Vec<usize> = if self.config.selection_type.allows_repeats() {
            (0..k).collect()
        } else {
            (0..k).filter(|idx| !chain.contains(idx)).collect()
        };
        if admissible.is_empty() {
            admissible = (0..k).collect();
        }

        let scores = lock(&self.scores);
        let picked = if admissible.len() == 1 {
            admissible[0]
        } else if self.config.selection_type.uses_roulette() {
            let weights: Vec<f64> = admissible
                .iter()
                .map(|&idx| scores.transition(last, idx))
                .collect();
            roulette(&weights, rng).map_or(admissible[0], |pos| admissible[pos])
        } else {
            let sample = index::sample(rng, admissible.len(), 2);
            let first = admissible[sample.index(0)];
            let second = admissible[sample.index(1)];
            if scores.transition(last, first) > scores.transition(last, second) {
                first
            } else {
                second
            }
        };

        self.ended = if chain.len() + 1 >= k {
            true
        } else if !self.config.sequence {
            true
        } else {
            let cont = scores.outcome(picked, false);
            let end = scores.outcome(picked, true);
            rng.random::<f64>() * (cont + end) - cont > 0.0
        };
        drop(scores);

        trace!(
            event = "sequence_pick",
            selector = self.selectors[picked].name(),
            chain_len = chain.len(),
            ended = self.ended,
        );
        picked
    }

    /// Whether the selector returned by the last
    /// [`HeuristicSequence::get_neighbour`] ends its chain.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Applies the configured learning rule.
    pub fn update_score(&self, previous: usize, current: usize, ended: bool, value: f64, time: f64) {
        self.update_score_with(self.config.learning_method, previous, current, ended, value, time);
    }

    /// Applies `method` regardless of the configured one.
    pub fn update_score_with(
        &self,
        method: LearningMethod,
        previous: usize,
        current: usize,
        ended: bool,
        value: f64,
        time: f64,
    ) {
        let amount = learning_increment(method, value, time);
        lock(&self.scores).reward(previous, current, ended, amount);
    }

    /// Asks selector `idx` for a candidate.
    pub fn select_neighbour(
        &mut self,
        idx: usize,
        solution: &Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        self.selectors[idx].select_neighbour(solution, rng)
    }
}

impl<M: Model> Debug for HeuristicSequence<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicSequence")
            .field("selectors", &self.selectors)
            .field("config", &self.config)
            .field("ended", &self.ended)
            .finish()
    }
}
