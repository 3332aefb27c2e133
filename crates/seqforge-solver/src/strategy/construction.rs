use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::marker::PhantomData;

use rand::rngs::StdRng;
use rand::Rng;
use seqforge_config::{ConstructionConfig, Properties};
use seqforge_core::{Model, Result, SimpleNeighbour};
use tracing::trace;

use super::{NeighbourSelection, Proposal};
use crate::solution::Solution;

/// Builds a complete assignment one variable at a time.
///
/// Each call picks a random unassigned variable and the value minimizing
/// `conflicts × conflict_weight + delta × value_weight`. Recently chosen
/// (variable, value) pairs are tabu unless every value of the variable is.
pub struct StandardConstruction<M: Model> {
    config: ConstructionConfig,
    tabu: VecDeque<(usize, usize)>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> StandardConstruction<M> {
    pub fn new(config: ConstructionConfig) -> Self {
        Self {
            config,
            tabu: VecDeque::new(),
            _model: PhantomData,
        }
    }

    pub fn from_properties(props: &Properties) -> Result<Self> {
        Ok(Self::new(ConstructionConfig::from_properties(props)?))
    }

    pub fn config(&self) -> &ConstructionConfig {
        &self.config
    }

    fn is_tabu(&self, variable: usize, value_idx: usize) -> bool {
        self.tabu.contains(&(variable, value_idx))
    }

    fn remember(&mut self, variable: usize, value_idx: usize) {
        if self.config.tabu_size == 0 {
            return;
        }
        if self.tabu.len() >= self.config.tabu_size {
            self.tabu.pop_front();
        }
        self.tabu.push_back((variable, value_idx));
    }
}

impl<M: Model> Debug for StandardConstruction<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardConstruction")
            .field("config", &self.config)
            .field("tabu", &self.tabu.len())
            .finish()
    }
}

impl<M: Model> NeighbourSelection<M> for StandardConstruction<M> {
    fn name(&self) -> &'static str {
        "construction"
    }

    fn init(&mut self, _solution: &Solution<M>) -> Result<()> {
        self.tabu.clear();
        Ok(())
    }

    fn select_neighbour(
        &mut self,
        solution: &mut Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Proposal<M>>> {
        let model = solution.model();
        let open: Vec<usize> = (0..model.variable_count())
            .filter(|&v| model.assignment(v).is_none() && !model.values(v).is_empty())
            .collect();
        if open.is_empty() {
            return Ok(None);
        }
        let variable = open[rng.random_range(0..open.len())];
        let values = model.values(variable);

        let all_tabu = (0..values.len()).all(|idx| self.is_tabu(variable, idx));
        let mut best: Vec<(usize, f64)> = Vec::new();
        let mut best_score = f64::INFINITY;
        for (idx, value) in values.iter().enumerate() {
            if !all_tabu && self.is_tabu(variable, idx) {
                continue;
            }
            let conflicts = model.conflict_values(variable, value).len() as f64;
            let delta = model.delta(variable, value);
            let score = conflicts * self.config.conflict_weight + delta * self.config.value_weight;
            if score < best_score {
                best_score = score;
                best.clear();
                best.push((idx, delta));
            } else if score == best_score {
                best.push((idx, delta));
            }
        }
        if best.is_empty() {
            return Ok(None);
        }

        let (idx, delta) = best[rng.random_range(0..best.len())];
        let value = values[idx].clone();
        self.remember(variable, idx);
        trace!(
            event = "construct",
            variable = variable,
            value = ?value,
            score = best_score,
        );
        Ok(Some(Proposal::Move(Box::new(SimpleNeighbour::<M>::with_delta(
            variable,
            Some(value),
            delta,
        )))))
    }
}
