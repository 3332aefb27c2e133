use std::fmt;

use rand::rngs::StdRng;
use rand::Rng;
use seqforge_core::{Candidate, Model, Result};

use super::{roulette, MoveSelector, NeighbourSelector};
use crate::solution::Solution;

/// A move generator that delegates to one of several children.
///
/// Children are picked by a `bonus × points` roulette, or uniformly when
/// `random` is set. With `update` set, the picked child's points are moved
/// towards the improvement its candidate promises.
pub struct SelectorPool<M: Model> {
    children: Vec<NeighbourSelector<M>>,
    random: bool,
    update: bool,
}

impl<M: Model> fmt::Debug for SelectorPool<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorPool")
            .field("children", &self.children)
            .field("random", &self.random)
            .field("update", &self.update)
            .finish()
    }
}

impl<M: Model> SelectorPool<M> {
    pub fn new(children: Vec<NeighbourSelector<M>>, random: bool, update: bool) -> Self {
        Self {
            children,
            random,
            update,
        }
    }

    pub fn children(&self) -> &[NeighbourSelector<M>] {
        &self.children
    }

    fn pick(&self, rng: &mut StdRng) -> Option<usize> {
        if self.children.is_empty() {
            return None;
        }
        if self.random {
            return Some(rng.random_range(0..self.children.len()));
        }
        let weights: Vec<f64> = self.children.iter().map(NeighbourSelector::weight).collect();
        roulette(&weights, rng)
    }
}

impl<M: Model> MoveSelector<M> for SelectorPool<M> {
    fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        for child in &mut self.children {
            child.init(solution)?;
        }
        Ok(())
    }

    fn select_neighbour(
        &mut self,
        solution: &Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        let Some(idx) = self.pick(rng) else {
            return Ok(None);
        };
        let child = &mut self.children[idx];
        let candidate = child.select_neighbour(solution, rng)?;
        if self.update {
            match candidate.as_ref().map(Candidate::value) {
                Some(Some(value)) => child.update_points(-value),
                Some(None) => {}
                None => child.update_points(0.0),
            }
        }
        Ok(candidate)
    }

    fn set_hill_climbing_mode(&mut self, enabled: bool) {
        for child in &mut self.children {
            child.set_hill_climbing_mode(enabled);
        }
    }
}
