use std::fmt;

use rand::rngs::StdRng;
use seqforge_config::{
    keys, ConfigError, GeneralConfig, GreatDelugeConfig, Properties, SearchConfig, SequenceConfig,
};
use seqforge_core::{Candidate, Model, Result};
use tracing::{debug, trace};

use super::{Chain, Draw, NeighbourSelection, Proposal, MAX_ATTEMPTS};
use crate::selector::SearchRegistry;
use crate::sequence::HeuristicSequence;
use crate::solution::Solution;

/// The water level of a great deluge search.
///
/// The bound starts at `upper × reference` and decays geometrically. Once it
/// falls below `lower^(1+idle) × reference` it is raised again to
/// `max(reference + 2, upper^idle × reference)`, where `idle` counts the
/// reheats since the last new best solution.
#[derive(Debug, Clone)]
pub struct DelugeSchedule {
    config: GreatDelugeConfig,
    cool_in_accept: bool,
    next_on_reheat: bool,
    bound: Option<f64>,
    iteration: u64,
    idle: u32,
    last_improving: u64,
}

impl DelugeSchedule {
    pub fn new(config: GreatDelugeConfig, cool_in_accept: bool, next_on_reheat: bool) -> Self {
        Self {
            config,
            cool_in_accept,
            next_on_reheat,
            bound: None,
            iteration: 0,
            idle: 0,
            last_improving: 0,
        }
    }

    pub fn config(&self) -> &GreatDelugeConfig {
        &self.config
    }

    /// Forgets the bound; the next [`DelugeSchedule::inc_iter`] sets it again.
    pub fn reset(&mut self) {
        self.bound = None;
        self.iteration = 0;
        self.idle = 0;
        self.last_improving = 0;
    }

    /// Current bound, `None` before the first iteration.
    pub fn bound(&self) -> Option<f64> {
        self.bound
    }

    pub fn set_bound(&mut self, bound: f64) {
        self.bound = Some(bound);
    }

    /// Moves the bound along with an external change of the best value.
    pub fn shift_bound(&mut self, delta: f64) {
        if let Some(bound) = &mut self.bound {
            *bound += delta;
        }
    }

    /// Reheats since the last new best solution.
    pub fn idle_reheats(&self) -> u32 {
        self.idle
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Schedule iteration of the last new best solution.
    pub fn last_improving(&self) -> u64 {
        self.last_improving
    }

    pub fn cools_in_accept(&self) -> bool {
        self.cool_in_accept
    }

    /// Multiplies the bound by the cool rate.
    pub fn cool(&mut self) {
        if let Some(bound) = &mut self.bound {
            *bound *= self.config.cool_rate;
        }
    }

    /// Advances one iteration; returns `true` when a reheat asks the caller
    /// to yield.
    pub fn inc_iter(&mut self, reference: f64) -> bool {
        let Some(mut bound) = self.bound else {
            self.bound = Some(self.config.upper_bound_rate * reference);
            self.iteration = 0;
            self.last_improving = 0;
            return false;
        };
        self.iteration += 1;
        if !self.cool_in_accept {
            bound *= self.config.cool_rate;
        }

        let floor = self.config.lower_bound_rate.powi(1 + self.idle as i32) * reference;
        if bound < floor {
            self.idle += 1;
            bound = (reference + 2.0)
                .max(self.config.upper_bound_rate.powi(self.idle as i32) * reference);
            self.bound = Some(bound);
            debug!(
                event = "reheat",
                strategy = "great_deluge",
                bound = bound,
                idle = self.idle,
                iteration = self.iteration,
            );
            return self.next_on_reheat;
        }
        self.bound = Some(bound);
        false
    }

    /// Raises the bound as after a reheat, at least one step above the
    /// reference.
    pub fn alter_bound(&mut self, reference: f64) {
        let steps = self.idle.max(1) as i32;
        self.bound =
            Some((reference + 2.0).max(self.config.upper_bound_rate.powi(steps) * reference));
    }

    /// Whether a move of `value` from a solution of `total` stays under water.
    pub fn accepts(&self, total: f64, value: f64) -> bool {
        value <= 0.0 || self.bound.is_some_and(|bound| total + value <= bound)
    }

    pub fn best_saved(&mut self) {
        self.idle = 0;
        self.last_improving = self.iteration;
    }
}

/// Value the deluge bound is relative to: the best value once one exists.
pub(crate) fn reference_value<M: Model>(solution: &Solution<M>) -> f64 {
    if solution.has_best() {
        solution.best_value()
    } else {
        solution.model().total_value()
    }
}

/// Great deluge over a heuristic sequence.
///
/// Returns `None` on a reheat when `next_on_reheat` is set, and also on a
/// reheat with no candidate generated since the previous one, whatever the
/// setting. A call that draws 10 000 candidates without accepting any
/// returns `None` too, so a bound stuck at zero never blocks the solver.
pub struct GreatDeluge<M: Model> {
    sequence: HeuristicSequence<M>,
    chain: Chain,
    schedule: DelugeSchedule,
    alter_bound_on_reheat: bool,
    alter_bound: bool,
    generated_since_reheat: bool,
}

impl<M: Model> fmt::Debug for GreatDeluge<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreatDeluge")
            .field("sequence", &self.sequence)
            .field("chain", &self.chain)
            .field("schedule", &self.schedule)
            .field("alter_bound_on_reheat", &self.alter_bound_on_reheat)
            .finish()
    }
}

impl<M: Model> GreatDeluge<M> {
    pub fn new(
        sequence: HeuristicSequence<M>,
        schedule: DelugeSchedule,
        alter_bound_on_reheat: bool,
    ) -> Self {
        let chain = Chain::new(sequence.config().reset_interval());
        Self {
            sequence,
            chain,
            schedule,
            alter_bound_on_reheat,
            alter_bound: false,
            generated_since_reheat: false,
        }
    }

    pub fn from_properties(props: &Properties, registry: &SearchRegistry<M>) -> Result<Self> {
        let config = GreatDelugeConfig::from_properties(props)?;
        let general = GeneralConfig::from_properties(props)?;
        let search = SearchConfig::from_properties(props)?;
        let spec = config
            .neighbours
            .clone()
            .ok_or_else(|| ConfigError::Missing(keys::GREAT_DELUGE_NEIGHBOURS.to_string()))?;
        let selectors = registry.build_selectors(&spec, props)?;
        let sequence = HeuristicSequence::new(selectors, SequenceConfig::from_properties(props)?)?;
        let schedule =
            DelugeSchedule::new(config, general.cool_in_accept, search.next_heuristics_on_reheat);
        Ok(Self::new(sequence, schedule, search.alter_bound_on_reheat))
    }

    pub fn schedule(&self) -> &DelugeSchedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut DelugeSchedule {
        &mut self.schedule
    }

    pub fn sequence(&self) -> &HeuristicSequence<M> {
        &self.sequence
    }

    /// Advances the schedule and draws one candidate from the sequence.
    fn draw(&mut self, solution: &Solution<M>, rng: &mut StdRng) -> Result<Draw<M>> {
        let reference = reference_value(solution);
        let reheats = self.schedule.idle_reheats();
        let yielded = self.schedule.inc_iter(reference);
        let reheated = self.schedule.idle_reheats() > reheats;
        if yielded || (reheated && !self.generated_since_reheat) {
            // Nothing generated since the last reheat: the selectors are exhausted.
            self.alter_bound = self.alter_bound_on_reheat;
            self.generated_since_reheat = false;
            return Ok(Draw::Yield);
        }
        if reheated {
            self.generated_since_reheat = false;
        }
        if self.alter_bound {
            self.schedule.alter_bound(reference);
            self.alter_bound = false;
        }

        let idx = self.sequence.get_neighbour(self.chain.selectors(), rng);
        match self.sequence.select_neighbour(idx, solution, rng)? {
            Some(candidate) => {
                self.generated_since_reheat = true;
                Ok(Draw::Candidate(idx, candidate))
            }
            None => {
                self.chain.record_failure();
                Ok(Draw::Empty)
            }
        }
    }
}

impl<M: Model> NeighbourSelection<M> for GreatDeluge<M> {
    fn name(&self) -> &'static str {
        "great_deluge"
    }

    fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        self.sequence.init(solution)?;
        self.chain.clear();
        self.schedule.reset();
        self.alter_bound = false;
        self.generated_since_reheat = false;
        Ok(())
    }

    fn select_neighbour(
        &mut self,
        solution: &mut Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Proposal<M>>> {
        for _ in 0..MAX_ATTEMPTS {
            let (idx, candidate) = match self.draw(solution, rng)? {
                Draw::Yield => return Ok(None),
                Draw::Empty => continue,
                Draw::Candidate(idx, candidate) => (idx, candidate),
            };
            match candidate {
                Candidate::Lazy(neighbour) => {
                    let bound = self.schedule.bound();
                    let criterion = move |model: &M, value: f64| {
                        value <= 0.0 || bound.is_some_and(|bound| model.total_value() <= bound)
                    };
                    return Ok(Some(Proposal::lazy(neighbour, Box::new(criterion))));
                }
                Candidate::Eager(neighbour) => {
                    let value = neighbour.value();
                    if !self.schedule.accepts(solution.model().total_value(), value) {
                        self.chain.record_failure();
                        continue;
                    }
                    if value <= 0.0 {
                        if self.schedule.cools_in_accept() {
                            self.schedule.cool();
                        }
                        self.chain
                            .record_improvement(&self.sequence, idx, value, solution.time());
                        self.sequence.selector_mut(idx).update_points(-value);
                    } else {
                        self.chain.record_acceptance();
                    }
                    trace!(
                        event = "accept",
                        strategy = "great_deluge",
                        selector = self.sequence.selector(idx).name(),
                        value = value,
                        bound = ?self.schedule.bound(),
                    );
                    return Ok(Some(Proposal::Move(neighbour)));
                }
            }
        }
        debug!(
            event = "idle",
            strategy = "great_deluge",
            attempts = MAX_ATTEMPTS,
            bound = ?self.schedule.bound(),
        );
        Ok(None)
    }

    fn best_saved(&mut self, _solution: &Solution<M>) {
        self.schedule.best_saved();
    }

    fn reset_scores(&mut self) {
        self.sequence.reset_scores();
    }
}
