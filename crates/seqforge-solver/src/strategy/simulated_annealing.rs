use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seqforge_config::{
    keys, ConfigError, Properties, SearchConfig, SequenceConfig, SimulatedAnnealingConfig,
};
use seqforge_core::{Candidate, Model, Result};
use tracing::{debug, trace};

use super::great_deluge::reference_value;
use super::{Chain, Draw, NeighbourSelection, Proposal, MAX_ATTEMPTS};
use crate::selector::SearchRegistry;
use crate::sequence::HeuristicSequence;
use crate::solution::Solution;

/// Accepted moves of one cooling period by sign of their delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptStats {
    pub improving: u64,
    pub zero: u64,
    pub worsening: u64,
}

impl AcceptStats {
    pub fn record(&mut self, value: f64) {
        if value < 0.0 {
            self.improving += 1;
        } else if value > 0.0 {
            self.worsening += 1;
        } else {
            self.zero += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.improving + self.zero + self.worsening
    }
}

/// The acceptance rule at a fixed temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceptance {
    pub temperature: f64,
    pub stochastic: bool,
}

impl Acceptance {
    /// Probability of accepting a move that changes the judged value by
    /// `delta`. Non-worsening moves are always accepted.
    pub fn probability(&self, delta: f64) -> f64 {
        if delta <= 0.0 {
            1.0
        } else if self.stochastic {
            1.0 / (1.0 + (delta / self.temperature).exp())
        } else {
            (-delta / self.temperature).exp()
        }
    }

    pub fn accept<R: Rng + ?Sized>(&self, delta: f64, rng: &mut R) -> bool {
        let p = self.probability(delta);
        p >= 1.0 || rng.random::<f64>() < p
    }
}

/// Temperature control of a simulated annealing search.
///
/// Lengths are measured in schedule iterations and derived from the total
/// domain size of the model at [`AnnealingSchedule::init`].
#[derive(Debug, Clone)]
pub struct AnnealingSchedule {
    config: SimulatedAnnealingConfig,
    next_on_reheat: bool,
    temperature: f64,
    reheat_rate: f64,
    temperature_length: u64,
    reheat_length: u64,
    restore_best_length: u64,
    iteration: u64,
    last_improving: u64,
    last_reheat: u64,
    last_cooling: u64,
    last_restore: u64,
    stats: AcceptStats,
}

impl AnnealingSchedule {
    pub fn new(config: SimulatedAnnealingConfig, next_on_reheat: bool) -> Self {
        let reheat_rate = config.effective_reheat_rate();
        Self {
            temperature: config.initial_temperature,
            config,
            next_on_reheat,
            reheat_rate,
            temperature_length: 1,
            reheat_length: 1,
            restore_best_length: 1,
            iteration: 0,
            last_improving: 0,
            last_reheat: 0,
            last_cooling: 0,
            last_restore: 0,
            stats: AcceptStats::default(),
        }
    }

    pub fn config(&self) -> &SimulatedAnnealingConfig {
        &self.config
    }

    /// Resets the temperature and derives the period lengths from
    /// `domain_size`, the sum of all domain sizes.
    pub fn init(&mut self, domain_size: usize) {
        let base = domain_size as f64;
        self.temperature = self.config.initial_temperature;
        self.temperature_length = ((self.config.temp_length_coef * base).round() as u64).max(1);
        let tl = self.temperature_length as f64;
        self.reheat_length = ((self.config.reheat_length_coef * tl).round() as u64).max(1);
        self.restore_best_length =
            ((self.config.effective_restore_best_length_coef() * tl).round() as u64).max(1);
        self.iteration = 0;
        self.last_improving = 0;
        self.last_reheat = 0;
        self.last_cooling = 0;
        self.last_restore = 0;
        self.stats = AcceptStats::default();
        debug!(
            event = "annealing_init",
            temperature = self.temperature,
            temperature_length = self.temperature_length,
            reheat_length = self.reheat_length,
            restore_best_length = self.restore_best_length,
        );
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.temperature = temperature;
    }

    pub fn temperature_length(&self) -> u64 {
        self.temperature_length
    }

    pub fn reheat_length(&self) -> u64 {
        self.reheat_length
    }

    pub fn restore_best_length(&self) -> u64 {
        self.restore_best_length
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn stats(&self) -> AcceptStats {
        self.stats
    }

    pub fn acceptance(&self) -> Acceptance {
        Acceptance {
            temperature: self.temperature,
            stochastic: self.config.stochastic_hc,
        }
    }

    pub fn probability(&self, delta: f64) -> f64 {
        self.acceptance().probability(delta)
    }

    /// The delta the acceptance rule judges: the move delta in relative mode,
    /// otherwise the distance of the resulting total from `reference`.
    pub fn judged_delta(&self, total: f64, reference: f64, value: f64) -> f64 {
        if self.config.relative_acceptance {
            value
        } else {
            total + value - reference
        }
    }

    /// Decides on a move of `value` without counting it.
    pub fn judge<R: Rng + ?Sized>(
        &self,
        total: f64,
        reference: f64,
        value: f64,
        rng: &mut R,
    ) -> bool {
        let delta = self.judged_delta(total, reference, value);
        self.acceptance().accept(delta, rng)
    }

    /// Counts an accepted move in the statistics of the cooling period.
    pub fn record(&mut self, value: f64) {
        self.stats.record(value);
    }

    /// Decides on a move of `value` and counts it when accepted.
    pub fn accept<R: Rng + ?Sized>(
        &mut self,
        total: f64,
        reference: f64,
        value: f64,
        rng: &mut R,
    ) -> bool {
        let accepted = self.judge(total, reference, value, rng);
        if accepted {
            self.record(value);
        }
        accepted
    }

    /// Advances one iteration, restoring the best solution, reheating or
    /// cooling when their periods are over. Returns `true` when a reheat asks
    /// the caller to yield.
    pub fn inc_iter<M: Model>(&mut self, solution: &mut Solution<M>) -> bool {
        self.iteration += 1;
        if self.iteration > self.last_improving + self.restore_best_length {
            solution.restore_best();
            self.last_improving = self.iteration;
            self.last_restore = self.iteration;
            debug!(
                event = "restore_best",
                strategy = "simulated_annealing",
                iteration = self.iteration,
            );
        }
        if self.iteration > self.last_reheat.max(self.last_improving) + self.reheat_length {
            self.reheat();
            return self.next_on_reheat;
        }
        if self.iteration > self.last_cooling + self.temperature_length {
            self.cool();
        }
        false
    }

    /// Whether the last [`AnnealingSchedule::inc_iter`] reheated.
    pub fn just_reheated(&self) -> bool {
        self.iteration > 0 && self.last_reheat == self.iteration
    }

    /// Whether the last [`AnnealingSchedule::inc_iter`] restored the best
    /// solution.
    pub fn just_restored(&self) -> bool {
        self.iteration > 0 && self.last_restore == self.iteration
    }

    fn cool(&mut self) {
        self.temperature *= self.config.cooling_rate;
        debug!(
            event = "cool",
            strategy = "simulated_annealing",
            temperature = self.temperature,
            iteration = self.iteration,
            improving = self.stats.improving,
            zero = self.stats.zero,
            worsening = self.stats.worsening,
        );
        self.stats = AcceptStats::default();
        self.last_cooling = self.iteration;
    }

    fn reheat(&mut self) {
        self.temperature *= self.reheat_rate;
        debug!(
            event = "reheat",
            strategy = "simulated_annealing",
            temperature = self.temperature,
            iteration = self.iteration,
            improving = self.stats.improving,
            zero = self.stats.zero,
            worsening = self.stats.worsening,
        );
        self.last_reheat = self.iteration;
    }

    pub fn best_saved(&mut self) {
        self.last_improving = self.iteration;
    }
}

/// Simulated annealing over a heuristic sequence.
///
/// Yields like [`GreatDeluge`](super::GreatDeluge): on a reheat when
/// `next_on_reheat` is set or nothing was generated since the previous
/// reheat, and after 10 000 draws without an accepted candidate.
pub struct SimulatedAnnealing<M: Model> {
    sequence: HeuristicSequence<M>,
    chain: Chain,
    schedule: AnnealingSchedule,
    generated_since_reheat: bool,
}

impl<M: Model> fmt::Debug for SimulatedAnnealing<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedAnnealing")
            .field("sequence", &self.sequence)
            .field("chain", &self.chain)
            .field("schedule", &self.schedule)
            .finish()
    }
}

impl<M: Model> SimulatedAnnealing<M> {
    pub fn new(sequence: HeuristicSequence<M>, schedule: AnnealingSchedule) -> Self {
        let chain = Chain::new(sequence.config().reset_interval());
        Self {
            sequence,
            chain,
            schedule,
            generated_since_reheat: false,
        }
    }

    pub fn from_properties(props: &Properties, registry: &SearchRegistry<M>) -> Result<Self> {
        let config = SimulatedAnnealingConfig::from_properties(props)?;
        let search = SearchConfig::from_properties(props)?;
        let spec = config
            .neighbours
            .clone()
            .ok_or_else(|| ConfigError::Missing(keys::SA_NEIGHBOURS.to_string()))?;
        let selectors = registry.build_selectors(&spec, props)?;
        let sequence = HeuristicSequence::new(selectors, SequenceConfig::from_properties(props)?)?;
        let schedule = AnnealingSchedule::new(config, search.next_heuristics_on_reheat);
        Ok(Self::new(sequence, schedule))
    }

    pub fn schedule(&self) -> &AnnealingSchedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut AnnealingSchedule {
        &mut self.schedule
    }

    pub fn sequence(&self) -> &HeuristicSequence<M> {
        &self.sequence
    }

    /// Advances the schedule and draws one candidate from the sequence.
    fn draw(&mut self, solution: &mut Solution<M>, rng: &mut StdRng) -> Result<Draw<M>> {
        let yielded = self.schedule.inc_iter(solution);
        let reheated = self.schedule.just_reheated();
        if yielded || (reheated && !self.generated_since_reheat) {
            self.generated_since_reheat = false;
            return Ok(Draw::Yield);
        }
        if reheated {
            self.generated_since_reheat = false;
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

impl<M: Model> NeighbourSelection<M> for SimulatedAnnealing<M> {
    fn name(&self) -> &'static str {
        "simulated_annealing"
    }

    fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        self.sequence.init(solution)?;
        self.schedule.init(solution.model().total_domain_size());
        self.chain.clear();
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
            let reference = reference_value(solution);
            match candidate {
                Candidate::Lazy(neighbour) => {
                    let acceptance = self.schedule.acceptance();
                    let relative = self.schedule.config().relative_acceptance;
                    let mut lazy_rng = ChaCha8Rng::seed_from_u64(rng.random());
                    let criterion = move |model: &M, value: f64| {
                        let delta = if relative {
                            value
                        } else {
                            model.total_value() - reference
                        };
                        acceptance.accept(delta, &mut lazy_rng)
                    };
                    return Ok(Some(Proposal::lazy(neighbour, Box::new(criterion))));
                }
                Candidate::Eager(neighbour) => {
                    let value = neighbour.value();
                    let total = solution.model().total_value();
                    if !self.schedule.accept(total, reference, value, rng) {
                        self.chain.record_failure();
                        continue;
                    }
                    if value <= 0.0 {
                        self.chain
                            .record_improvement(&self.sequence, idx, value, solution.time());
                        self.sequence.selector_mut(idx).update_points(-value);
                    } else {
                        self.chain.record_acceptance();
                    }
                    trace!(
                        event = "accept",
                        strategy = "simulated_annealing",
                        selector = self.sequence.selector(idx).name(),
                        value = value,
                        temperature = self.schedule.temperature(),
                    );
                    return Ok(Some(Proposal::Move(neighbour)));
                }
            }
        }
        debug!(
            event = "idle",
            strategy = "simulated_annealing",
            attempts = MAX_ATTEMPTS,
            temperature = self.schedule.temperature(),
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
