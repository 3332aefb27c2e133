//! Generic move generators usable with any [`Model`].
//!
//! All of them only propose conflict-free changes: a candidate never
//! unassigns another variable. Scans start at a random offset and visit
//! every candidate at most once.

use rand::rngs::StdRng;
use rand::Rng;
use seqforge_core::{
    Candidate, LazyChangeNeighbour, Model, Neighbour, Result, SimpleNeighbour, SwapNeighbour,
};

use super::MoveSelector;
use crate::solution::Solution;

/// Moves one assigned variable to another conflict-free value.
#[derive(Debug, Clone, Default)]
pub struct ChangeMoveSelector {
    hill_climbing: bool,
}

impl ChangeMoveSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: Model> MoveSelector<M> for ChangeMoveSelector {
    fn select_neighbour(
        &mut self,
        solution: &Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        let model = solution.model();
        let n = model.variable_count();
        if n == 0 {
            return Ok(None);
        }

        let start = rng.random_range(0..n);
        for i in 0..n {
            let variable = (start + i) % n;
            let Some(current) = model.assignment(variable) else {
                continue;
            };
            let values = model.values(variable);
            if values.len() < 2 {
                continue;
            }
            let offset = rng.random_range(0..values.len());
            for j in 0..values.len() {
                let value = &values[(offset + j) % values.len()];
                if value == current || !model.conflict_values(variable, value).is_empty() {
                    continue;
                }
                let neighbour = SimpleNeighbour::new(model, variable, value.clone());
                if self.hill_climbing && neighbour.value() > 0.0 {
                    continue;
                }
                return Ok(Some(Candidate::eager(neighbour)));
            }
        }
        Ok(None)
    }

    fn set_hill_climbing_mode(&mut self, enabled: bool) {
        self.hill_climbing = enabled;
    }
}

/// Exchanges the values of two assigned variables.
#[derive(Debug, Clone, Default)]
pub struct SwapMoveSelector {
    hill_climbing: bool,
}

impl SwapMoveSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: Model> MoveSelector<M> for SwapMoveSelector {
    fn select_neighbour(
        &mut self,
        solution: &Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        let model = solution.model();
        let n = model.variable_count();
        if n < 2 {
            return Ok(None);
        }

        let start = rng.random_range(0..n);
        for i in 0..n {
            let first = (start + i) % n;
            if model.assignment(first).is_none() {
                continue;
            }
            let offset = rng.random_range(0..n);
            for j in 0..n {
                let second = (offset + j) % n;
                let Some(swap) = SwapNeighbour::new(model, first, second) else {
                    continue;
                };
                if self.hill_climbing && swap.value() > 0.0 {
                    continue;
                }
                return Ok(Some(Candidate::eager(swap)));
            }
        }
        Ok(None)
    }

    fn set_hill_climbing_mode(&mut self, enabled: bool) {
        self.hill_climbing = enabled;
    }
}

/// Like [`ChangeMoveSelector`] but leaves the delta to commit time.
#[derive(Debug, Clone, Default)]
pub struct LazyChangeMoveSelector;

impl LazyChangeMoveSelector {
    pub fn new() -> Self {
        Self
    }
}

impl<M: Model> MoveSelector<M> for LazyChangeMoveSelector {
    fn select_neighbour(
        &mut self,
        solution: &Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        let model = solution.model();
        let n = model.variable_count();
        if n == 0 {
            return Ok(None);
        }

        let start = rng.random_range(0..n);
        for i in 0..n {
            let variable = (start + i) % n;
            let Some(current) = model.assignment(variable) else {
                continue;
            };
            let values = model.values(variable);
            if values.len() < 2 {
                continue;
            }
            let offset = rng.random_range(0..values.len());
            for j in 0..values.len() {
                let value = &values[(offset + j) % values.len()];
                if value != current && model.conflict_values(variable, value).is_empty() {
                    return Ok(Some(Candidate::lazy(LazyChangeNeighbour::new(
                        variable,
                        value.clone(),
                    ))));
                }
            }
        }
        Ok(None)
    }
}
