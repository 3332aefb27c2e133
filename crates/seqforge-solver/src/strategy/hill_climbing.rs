use std::fmt;

use rand::rngs::StdRng;
use seqforge_config::{keys, ConfigError, HillClimberConfig, Properties, SequenceConfig};
use seqforge_core::{Candidate, Model, Result};
use tracing::{debug, trace};

use super::{Chain, NeighbourSelection, Proposal};
use crate::selector::SearchRegistry;
use crate::sequence::HeuristicSequence;
use crate::solution::Solution;

/// Hill climbing over a heuristic sequence.
///
/// Only non-worsening candidates are returned. After `max_idle` attempts
/// without a new best solution the strategy returns `None` once and starts
/// counting again.
pub struct HillClimbing<M: Model> {
    sequence: HeuristicSequence<M>,
    chain: Chain,
    max_idle: u64,
    iteration: u64,
    last_improving: u64,
}

impl<M: Model> fmt::Debug for HillClimbing<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HillClimbing")
            .field("sequence", &self.sequence)
            .field("chain", &self.chain)
            .field("max_idle", &self.max_idle)
            .field("iteration", &self.iteration)
            .field("last_improving", &self.last_improving)
            .finish()
    }
}

impl<M: Model> HillClimbing<M> {
    pub fn new(sequence: HeuristicSequence<M>, max_idle: u64) -> Self {
        let chain = Chain::new(sequence.config().reset_interval());
        Self {
            sequence,
            chain,
            max_idle,
            iteration: 0,
            last_improving: 0,
        }
    }

    pub fn from_properties(props: &Properties, registry: &SearchRegistry<M>) -> Result<Self> {
        let config = HillClimberConfig::from_properties(props)?;
        let spec = config
            .neighbours
            .as_deref()
            .ok_or_else(|| ConfigError::Missing(keys::HILL_CLIMBER_NEIGHBOURS.to_string()))?;
        let selectors = registry.build_selectors(spec, props)?;
        let sequence = HeuristicSequence::new(selectors, SequenceConfig::from_properties(props)?)?;
        Ok(Self::new(sequence, config.max_idle))
    }

    pub fn sequence(&self) -> &HeuristicSequence<M> {
        &self.sequence
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Attempts since the last new best solution.
    pub fn idle(&self) -> u64 {
        self.iteration - self.last_improving
    }
}

impl<M: Model> NeighbourSelection<M> for HillClimbing<M> {
    fn name(&self) -> &'static str {
        "hill_climbing"
    }

    fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        self.sequence.init(solution)?;
        self.sequence.set_hill_climbing_mode(true);
        self.chain.clear();
        self.iteration = 0;
        self.last_improving = 0;
        Ok(())
    }

    fn select_neighbour(
        &mut self,
        solution: &mut Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Proposal<M>>> {
        loop {
            self.iteration += 1;
            if self.iteration - self.last_improving >= self.max_idle {
                debug!(
                    event = "idle",
                    strategy = "hill_climbing",
                    attempts = self.iteration,
                );
                self.iteration = 0;
                self.last_improving = 0;
                return Ok(None);
            }

            let idx = self.sequence.get_neighbour(self.chain.selectors(), rng);
            match self.sequence.select_neighbour(idx, solution, rng)? {
                None => self.chain.record_failure(),
                Some(Candidate::Lazy(neighbour)) => {
                    return Ok(Some(Proposal::lazy(
                        neighbour,
                        Box::new(|_: &M, value: f64| value <= 0.0),
                    )));
                }
                Some(Candidate::Eager(neighbour)) => {
                    let value = neighbour.value();
                    if value <= 0.0 {
                        self.chain
                            .record_improvement(&self.sequence, idx, value, solution.time());
                        self.sequence.selector_mut(idx).update_points(-value);
                        trace!(
                            event = "accept",
                            strategy = "hill_climbing",
                            selector = self.sequence.selector(idx).name(),
                            value = value,
                        );
                        return Ok(Some(Proposal::Move(neighbour)));
                    }
                    self.chain.record_failure();
                }
            }
        }
    }

    fn best_saved(&mut self, _solution: &Solution<M>) {
        self.last_improving = self.iteration;
    }

    fn reset_scores(&mut self) {
        self.sequence.reset_scores();
    }
}
