use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seqforge_config::{
    keys, ConfigError, GeneralConfig, GreatDelugeConfig, LearningMethod, Properties, SearchConfig,
    SequenceConfig, SimulatedAnnealingConfig,
};
use seqforge_core::{Candidate, Model, Result};
use tracing::{debug, trace};

use super::great_deluge::reference_value;
use super::{
    AnnealingSchedule, Chain, DelugeSchedule, NeighbourSelection, Proposal, StandardConstruction,
    MAX_ATTEMPTS,
};
use crate::selector::SearchRegistry;
use crate::sequence::HeuristicSequence;
use crate::solution::Solution;

/// Vote weight of the great deluge criterion.
const DELUGE_WEIGHT: f64 = 0.35;

/// Vote weight of the simulated annealing criterion.
const ANNEALING_WEIGHT: f64 = 0.45;

/// Weighted vote needed to accept.
const VOTE_THRESHOLD: f64 = 0.5;

/// Group acceptance: great deluge and simulated annealing vote on every
/// candidate.
///
/// Construction runs first. Afterwards a candidate is accepted when
/// `0.35 × gd + 0.45 × sa > 0.5`, which in practice means both criteria
/// must agree. Without an annealing schedule the deluge alone decides and
/// accepted non-worsening moves feed count-based sequence learning.
///
/// An accepted candidate advances both schedules. If that makes the
/// annealing schedule restore the best solution, the candidate is dropped
/// and a fresh one is drawn.
pub struct GroupAccept<M: Model> {
    construction: StandardConstruction<M>,
    constructed: bool,
    sequence: HeuristicSequence<M>,
    chain: Chain,
    deluge: DelugeSchedule,
    annealing: Option<AnnealingSchedule>,
}

impl<M: Model> fmt::Debug for GroupAccept<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupAccept")
            .field("construction", &self.construction)
            .field("constructed", &self.constructed)
            .field("sequence", &self.sequence)
            .field("chain", &self.chain)
            .field("deluge", &self.deluge)
            .field("annealing", &self.annealing)
            .finish()
    }
}

impl<M: Model> GroupAccept<M> {
    pub fn new(
        construction: StandardConstruction<M>,
        sequence: HeuristicSequence<M>,
        deluge: DelugeSchedule,
        annealing: Option<AnnealingSchedule>,
    ) -> Self {
        let chain = Chain::new(sequence.config().reset_interval());
        Self {
            construction,
            constructed: false,
            sequence,
            chain,
            deluge,
            annealing,
        }
    }

    /// Builds the strategy; annealing takes part when `Sequence.SA` is
    /// non-negative.
    pub fn from_properties(props: &Properties, registry: &SearchRegistry<M>) -> Result<Self> {
        let search = SearchConfig::from_properties(props)?;
        let general = GeneralConfig::from_properties(props)?;
        let deluge_config = GreatDelugeConfig::from_properties(props)?;
        let spec = deluge_config
            .neighbours
            .clone()
            .ok_or_else(|| ConfigError::Missing(keys::GREAT_DELUGE_NEIGHBOURS.to_string()))?;
        let selectors = registry.build_selectors(&spec, props)?;
        let sequence = HeuristicSequence::new(selectors, SequenceConfig::from_properties(props)?)?;
        let deluge = DelugeSchedule::new(deluge_config, general.cool_in_accept, false);
        let annealing = if search.sa_rank >= 0 {
            Some(AnnealingSchedule::new(
                SimulatedAnnealingConfig::from_properties(props)?,
                false,
            ))
        } else {
            None
        };
        Ok(Self::new(
            StandardConstruction::from_properties(props)?,
            sequence,
            deluge,
            annealing,
        ))
    }

    pub fn deluge(&self) -> &DelugeSchedule {
        &self.deluge
    }

    pub fn annealing(&self) -> Option<&AnnealingSchedule> {
        self.annealing.as_ref()
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }
}

/// Weighted vote of the two acceptance criteria.
pub(crate) fn vote(deluge: bool, annealing: bool) -> bool {
    let score = f64::from(u8::from(deluge)) * DELUGE_WEIGHT
        + f64::from(u8::from(annealing)) * ANNEALING_WEIGHT;
    score > VOTE_THRESHOLD
}

impl<M: Model> NeighbourSelection<M> for GroupAccept<M> {
    fn name(&self) -> &'static str {
        "group"
    }

    fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        self.construction.init(solution)?;
        self.sequence.init(solution)?;
        self.chain.clear();
        self.constructed = false;
        self.deluge.reset();
        if let Some(annealing) = &mut self.annealing {
            annealing.init(solution.model().total_domain_size());
        }
        Ok(())
    }

    fn select_neighbour(
        &mut self,
        solution: &mut Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Proposal<M>>> {
        if !self.constructed {
            if let Some(proposal) = self.construction.select_neighbour(solution, rng)? {
                return Ok(Some(proposal));
            }
            self.constructed = true;
            debug!(
                event = "phase_switch",
                from = "construction",
                to = "group",
                iteration = solution.iteration(),
            );
        }

        let reference = reference_value(solution);
        if self.deluge.bound().is_none() {
            self.deluge.inc_iter(reference);
        }

        for _ in 0..MAX_ATTEMPTS {
            let idx = self.sequence.get_neighbour(self.chain.selectors(), rng);
            let candidate = match self.sequence.select_neighbour(idx, solution, rng)? {
                Some(candidate) => candidate,
                None => {
                    self.chain.record_failure();
                    continue;
                }
            };

            let neighbour = match candidate {
                Candidate::Eager(neighbour) => neighbour,
                Candidate::Lazy(neighbour) => {
                    let bound = self.deluge.bound();
                    let annealing = self
                        .annealing
                        .as_ref()
                        .map(|a| (a.acceptance(), a.config().relative_acceptance));
                    let mut lazy_rng = ChaCha8Rng::seed_from_u64(rng.random());
                    let criterion = move |model: &M, value: f64| {
                        let total = model.total_value();
                        let gd = value <= 0.0 || bound.is_some_and(|bound| total <= bound);
                        match annealing {
                            Some((acceptance, relative)) => {
                                let delta = if relative { value } else { total - reference };
                                vote(gd, acceptance.accept(delta, &mut lazy_rng))
                            }
                            None => gd,
                        }
                    };
                    return Ok(Some(Proposal::lazy(neighbour, Box::new(criterion))));
                }
            };

            let value = neighbour.value();
            let total = solution.model().total_value();
            let gd = self.deluge.accepts(total, value);

            let accepted = match &mut self.annealing {
                Some(annealing) => {
                    if vote(gd, annealing.judge(total, reference, value, rng)) {
                        annealing.inc_iter(solution);
                        self.deluge.inc_iter(reference);
                        if annealing.just_restored() {
                            // The value was measured before the restore.
                            continue;
                        }
                        annealing.record(value);
                        true
                    } else {
                        false
                    }
                }
                None if gd => {
                    if value <= 0.0 {
                        self.chain.record_improvement_with(
                            &self.sequence,
                            LearningMethod::Count,
                            idx,
                            value,
                            solution.time(),
                        );
                    }
                    self.deluge.inc_iter(reference);
                    true
                }
                None => false,
            };

            if accepted {
                trace!(
                    event = "accept",
                    strategy = "group",
                    selector = self.sequence.selector(idx).name(),
                    value = value,
                );
                return Ok(Some(Proposal::Move(neighbour)));
            }
            self.chain.record_failure();
        }
        Ok(None)
    }

    fn best_saved(&mut self, _solution: &Solution<M>) {
        self.deluge.best_saved();
        if let Some(annealing) = &mut self.annealing {
            annealing.best_saved();
        }
    }

    fn reset_scores(&mut self) {
        self.sequence.reset_scores();
    }
}
