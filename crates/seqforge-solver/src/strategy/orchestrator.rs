use std::fmt;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use seqforge_config::{Properties, SearchConfig};
use seqforge_core::{Model, Result, SeqForgeError};
use tracing::{debug, info};

use super::{
    GreatDeluge, HillClimbing, NeighbourSelection, Proposal, SimulatedAnnealing,
    StandardConstruction,
};
use crate::selector::SearchRegistry;
use crate::solution::Solution;

/// Phase of the composite search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchPhase {
    Construction,
    HillClimbing,
    GreatDeluge,
    SimulatedAnnealing,
    Restart,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchPhase::Construction => "construction",
            SearchPhase::HillClimbing => "hill_climbing",
            SearchPhase::GreatDeluge => "great_deluge",
            SearchPhase::SimulatedAnnealing => "simulated_annealing",
            SearchPhase::Restart => "restart",
        };
        f.write_str(name)
    }
}

struct Stage<M: Model> {
    phase: SearchPhase,
    rank: i64,
    selection: Box<dyn NeighbourSelection<M>>,
}

/// Construction followed by a rotation of acceptance strategies.
///
/// Construction runs until it has nothing left to assign. The enabled
/// strategies then take turns in ascending rank order, each until it
/// returns `None`. If construction makes no progress for `restart_limit`
/// consecutive calls, every variable is unassigned, all sequence scores are
/// reset and construction starts over.
pub struct Orchestrator<M: Model> {
    construction: StandardConstruction<M>,
    stages: Vec<Stage<M>>,
    phase: SearchPhase,
    current: usize,
    restart_limit: u64,
    last_unassigned: Option<usize>,
    stalled: u64,
    restarts: u64,
}

impl<M: Model> Orchestrator<M> {
    /// Creates the orchestrator from `(rank, phase, strategy)` triples.
    ///
    /// Negative ranks are left out. Two enabled stages must not share a rank
    /// and at least one must be enabled.
    pub fn new(
        construction: StandardConstruction<M>,
        stages: Vec<(i64, SearchPhase, Box<dyn NeighbourSelection<M>>)>,
        restart_limit: u64,
    ) -> Result<Self> {
        let mut stages: Vec<Stage<M>> = stages
            .into_iter()
            .filter(|(rank, _, _)| *rank >= 0)
            .map(|(rank, phase, selection)| Stage {
                phase,
                rank,
                selection,
            })
            .collect();
        if stages.is_empty() {
            return Err(SeqForgeError::Config(
                "the orchestrator needs at least one enabled strategy".to_string(),
            ));
        }
        stages.sort_by_key(|stage| stage.rank);
        if let Some(pair) = stages.windows(2).find(|pair| pair[0].rank == pair[1].rank) {
            return Err(SeqForgeError::Config(format!(
                "{} and {} share rank {}",
                pair[0].phase, pair[1].phase, pair[0].rank
            )));
        }
        Ok(Self {
            construction,
            stages,
            phase: SearchPhase::Construction,
            current: 0,
            restart_limit: restart_limit.max(1),
            last_unassigned: None,
            stalled: 0,
            restarts: 0,
        })
    }

    pub fn from_properties(props: &Properties, registry: &SearchRegistry<M>) -> Result<Self> {
        let search = SearchConfig::from_properties(props)?;
        let mut stages: Vec<(i64, SearchPhase, Box<dyn NeighbourSelection<M>>)> = Vec::new();
        if search.hc_rank >= 0 {
            stages.push((
                search.hc_rank,
                SearchPhase::HillClimbing,
                Box::new(HillClimbing::from_properties(props, registry)?),
            ));
        }
        if search.gd_rank >= 0 {
            stages.push((
                search.gd_rank,
                SearchPhase::GreatDeluge,
                Box::new(GreatDeluge::from_properties(props, registry)?),
            ));
        }
        if search.sa_rank >= 0 {
            stages.push((
                search.sa_rank,
                SearchPhase::SimulatedAnnealing,
                Box::new(SimulatedAnnealing::from_properties(props, registry)?),
            ));
        }
        Self::new(
            StandardConstruction::from_properties(props)?,
            stages,
            search.restart_limit,
        )
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Enabled phases in rotation order.
    pub fn rotation(&self) -> Vec<SearchPhase> {
        self.stages.iter().map(|stage| stage.phase).collect()
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    fn switch_to(&mut self, phase: SearchPhase, solution: &Solution<M>) {
        debug!(
            event = "phase_switch",
            from = %self.phase,
            to = %phase,
            iteration = solution.iteration(),
            total_value = solution.model().total_value(),
            unassigned = solution.model().unassigned_count(),
        );
        self.phase = phase;
    }

    /// Counts construction calls without a drop in unassigned variables.
    /// Returns `true` once the restart limit is reached.
    fn check_stall(&mut self, solution: &Solution<M>) -> bool {
        let unassigned = solution.model().unassigned_count();
        match self.last_unassigned {
            Some(last) if unassigned >= last => {
                self.stalled += 1;
                self.stalled >= self.restart_limit
            }
            _ => {
                self.last_unassigned = Some(unassigned);
                self.stalled = 0;
                false
            }
        }
    }

    fn restart(&mut self, solution: &mut Solution<M>) {
        let iteration = solution.iteration();
        let model = solution.model_mut();
        for variable in 0..model.variable_count() {
            model.unassign(variable, iteration);
        }
        for stage in &mut self.stages {
            stage.selection.reset_scores();
        }
        self.restarts += 1;
        self.last_unassigned = None;
        self.stalled = 0;
        info!(
            event = "restart",
            restarts = self.restarts,
            iteration = iteration,
        );
    }
}

impl<M: Model> fmt::Debug for Orchestrator<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("phase", &self.phase)
            .field("rotation", &self.rotation())
            .field("restart_limit", &self.restart_limit)
            .field("restarts", &self.restarts)
            .finish()
    }
}

impl<M: Model> NeighbourSelection<M> for Orchestrator<M> {
    fn name(&self) -> &'static str {
        "orchestrator"
    }

    fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        self.construction.init(solution)?;
        for stage in &mut self.stages {
            stage.selection.init(solution)?;
        }
        self.phase = SearchPhase::Construction;
        self.current = 0;
        self.last_unassigned = None;
        self.stalled = 0;
        self.restarts = 0;
        Ok(())
    }

    fn select_neighbour(
        &mut self,
        solution: &mut Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Proposal<M>>> {
        let mut exhausted = 0;
        loop {
            match self.phase {
                SearchPhase::Construction => {
                    let proposal = self.construction.select_neighbour(solution, rng)?;
                    if self.check_stall(solution) {
                        self.switch_to(SearchPhase::Restart, solution);
                        continue;
                    }
                    if proposal.is_some() {
                        return Ok(proposal);
                    }
                    self.current = 0;
                    let next = self.stages[0].phase;
                    self.switch_to(next, solution);
                }
                SearchPhase::Restart => {
                    self.restart(solution);
                    self.switch_to(SearchPhase::Construction, solution);
                }
                _ => {
                    let stage = &mut self.stages[self.current];
                    if let Some(proposal) = stage.selection.select_neighbour(solution, rng)? {
                        return Ok(Some(proposal));
                    }
                    exhausted += 1;
                    self.current = (self.current + 1) % self.stages.len();
                    let next = self.stages[self.current].phase;
                    self.switch_to(next, solution);
                    if exhausted >= self.stages.len() {
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn best_saved(&mut self, solution: &Solution<M>) {
        for stage in &mut self.stages {
            stage.selection.best_saved(solution);
        }
    }

    fn reset_scores(&mut self) {
        for stage in &mut self.stages {
            stage.selection.reset_scores();
        }
    }
}
