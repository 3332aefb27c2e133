//! Helpers shared by the unit tests of this crate.

use rand::rngs::StdRng;
use rand::SeedableRng;
use seqforge_config::Properties;
use seqforge_core::{Candidate, Model, Result, SimpleNeighbour};
use seqforge_test::PenaltyModel;

use crate::selector::{MoveSelector, NeighbourSelector, SearchRegistry};
use crate::solution::Solution;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn props(pairs: &[(&str, &str)]) -> Properties {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// A solution over a fully assigned penalty model.
pub fn penalty_solution(penalties: Vec<Vec<f64>>, assigned: Vec<usize>) -> Solution<PenaltyModel> {
    let assigned = assigned.into_iter().map(Some).collect();
    Solution::new(PenaltyModel::assigned(penalties, assigned))
}

/// Selectors for a `key@bonus;...` string, built from the default registry.
pub fn selectors<M: Model>(spec: &str) -> Vec<NeighbourSelector<M>> {
    SearchRegistry::<M>::new()
        .build_selectors(spec, &Properties::new())
        .unwrap()
}

/// `n` selectors that never propose anything.
pub fn silent_selectors<M: Model>(n: usize) -> Vec<NeighbourSelector<M>> {
    (0..n)
        .map(|i| NeighbourSelector::new(format!("silent{}", i), Box::new(Silent), 1.0))
        .collect()
}

#[derive(Debug)]
pub struct Silent;

impl<M: Model> MoveSelector<M> for Silent {
    fn select_neighbour(
        &mut self,
        _solution: &Solution<M>,
        _rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        Ok(None)
    }
}

/// Always proposes `variable = value` on a penalty model, worsening or not.
#[derive(Debug)]
pub struct Fixed {
    pub variable: usize,
    pub value: usize,
}

impl MoveSelector<PenaltyModel> for Fixed {
    fn select_neighbour(
        &mut self,
        solution: &Solution<PenaltyModel>,
        _rng: &mut StdRng,
    ) -> Result<Option<Candidate<PenaltyModel>>> {
        Ok(Some(Candidate::eager(SimpleNeighbour::new(
            solution.model(),
            self.variable,
            self.value,
        ))))
    }
}

pub fn fixed(variable: usize, value: usize) -> NeighbourSelector<PenaltyModel> {
    NeighbourSelector::new("fixed", Box::new(Fixed { variable, value }), 1.0)
}
