//! Move generators and the selectors that wrap them.
//!
//! A [`MoveSelector`] inspects the model and proposes one [`Candidate`].
//! [`NeighbourSelector`] adds a name, a static bonus and adaptive points on
//! top, which is what heuristic sequences and pools choose between.
//!
//! Selectors are usually built from a specification string such as
//! `change@1;swap@0.5`: a `;`-separated list of registry keys, each with an
//! optional `@bonus` (default 1).

mod moves;
mod pool;
mod registry;

#[cfg(test)]
mod tests;

use std::fmt::{self, Debug};

use rand::rngs::StdRng;
use rand::Rng;
use seqforge_config::ConfigError;
use seqforge_core::{Candidate, Model, Result};

use crate::solution::Solution;

pub use moves::{ChangeMoveSelector, LazyChangeMoveSelector, SwapMoveSelector};
pub use pool::SelectorPool;
pub use registry::{SearchRegistry, SelectorFactory, StrategyFactory};

/// Weight of the newest observation in the points moving average.
const POINTS_DECAY: f64 = 0.1;

/// Points never drop below this, so every selector stays selectable.
const MIN_POINTS: f64 = 1e-3;

/// A low-level move generator.
///
/// Generators must bound their own work: one call scans each candidate at
/// most once and returns `None` when nothing suitable exists.
pub trait MoveSelector<M: Model>: Send + Debug {
    /// Prepares the generator for a solve.
    fn init(&mut self, _solution: &Solution<M>) -> Result<()> {
        Ok(())
    }

    /// Proposes a candidate, or `None` when there is none.
    fn select_neighbour(
        &mut self,
        solution: &Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>>;

    /// In hill climbing mode generators skip worsening candidates.
    fn set_hill_climbing_mode(&mut self, _enabled: bool) {}
}

/// Spins a roulette wheel over `weights`.
///
/// Non-positive weights are never picked; when every weight is non-positive
/// the pick is uniform. Returns `None` only for an empty wheel.
pub(crate) fn roulette(weights: &[f64], rng: &mut StdRng) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if !(total > 0.0) || !total.is_finite() {
        return Some(rng.random_range(0..weights.len()));
    }
    let mut spin = rng.random::<f64>() * total;
    let mut last = 0;
    for (idx, weight) in weights.iter().enumerate() {
        if *weight <= 0.0 {
            continue;
        }
        last = idx;
        if spin < *weight {
            return Some(idx);
        }
        spin -= weight;
    }
    Some(last)
}

/// One entry of a selector specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSpec {
    pub key: String,
    pub bonus: f64,
}

/// Parses `key[@bonus];key[@bonus];...`.
pub fn parse_selector_specs(spec: &str) -> std::result::Result<Vec<SelectorSpec>, ConfigError> {
    let specs = spec
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('@') {
            None => Ok(SelectorSpec {
                key: part.to_string(),
                bonus: 1.0,
            }),
            Some((key, bonus)) => {
                let bonus: f64 = bonus.trim().parse().map_err(|_| ConfigError::Malformed {
                    key: key.trim().to_string(),
                    value: bonus.to_string(),
                    expected: "a selector bonus",
                })?;
                if bonus < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "selector {} has a negative bonus",
                        key
                    )));
                }
                Ok(SelectorSpec {
                    key: key.trim().to_string(),
                    bonus,
                })
            }
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if specs.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "empty selector specification {:?}",
            spec
        )));
    }
    Ok(specs)
}

/// A move generator with its selection weights.
pub struct NeighbourSelector<M: Model> {
    name: String,
    selector: Box<dyn MoveSelector<M>>,
    bonus: f64,
    points: f64,
    calls: u64,
    found: u64,
}

impl<M: Model> NeighbourSelector<M> {
    pub fn new(name: impl Into<String>, selector: Box<dyn MoveSelector<M>>, bonus: f64) -> Self {
        Self {
            name: name.into(),
            selector,
            bonus,
            points: 1.0,
            calls: 0,
            found: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bonus(&self) -> f64 {
        self.bonus
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    /// Roulette weight: `bonus × points`.
    pub fn weight(&self) -> f64 {
        self.bonus * self.points
    }

    /// Calls made and candidates returned so far.
    pub fn usage(&self) -> (u64, u64) {
        (self.calls, self.found)
    }

    pub fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        self.calls = 0;
        self.found = 0;
        self.selector.init(solution)
    }

    pub fn select_neighbour(
        &mut self,
        solution: &Solution<M>,
        rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        self.calls += 1;
        let candidate = self.selector.select_neighbour(solution, rng)?;
        if candidate.is_some() {
            self.found += 1;
        }
        Ok(candidate)
    }

    pub fn set_hill_climbing_mode(&mut self, enabled: bool) {
        self.selector.set_hill_climbing_mode(enabled);
    }

    /// Folds the improvement of the last use into the points average.
    pub fn update_points(&mut self, improvement: f64) {
        let reward = improvement.max(0.0);
        self.points = ((1.0 - POINTS_DECAY) * self.points + POINTS_DECAY * reward).max(MIN_POINTS);
    }
}

impl<M: Model> Debug for NeighbourSelector<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeighbourSelector")
            .field("name", &self.name)
            .field("bonus", &self.bonus)
            .field("points", &self.points)
            .finish()
    }
}
