//! Termination assembled from the `Termination.*` keys.

use std::fmt;

use seqforge_config::{Properties, TerminationConfig};
use seqforge_core::{Model, Result};

use super::{IterationLimit, StopWhenComplete, Termination, TimeLimit};
use crate::solution::Solution;

/// Stops when any configured condition holds.
///
/// With nothing configured it never terminates; the solver then runs until
/// it is stopped or the strategy runs dry.
pub struct GeneralTermination<M: Model> {
    conditions: Vec<Box<dyn Termination<M>>>,
}

impl<M: Model> fmt::Debug for GeneralTermination<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralTermination")
            .field("conditions", &self.conditions)
            .finish()
    }
}

impl<M: Model> GeneralTermination<M> {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    pub fn from_config(config: &TerminationConfig) -> Self {
        let mut termination = Self::new();
        if config.stop_when_complete {
            termination = termination.with(StopWhenComplete);
        }
        if let Some(limit) = config.max_iters {
            termination = termination.with(IterationLimit::new(limit));
        }
        if let Some(timeout) = config.timeout {
            termination = termination.with(TimeLimit::new(timeout));
        }
        termination
    }

    pub fn from_properties(props: &Properties) -> Result<Self> {
        Ok(Self::from_config(&TerminationConfig::from_properties(props)?))
    }

    /// Adds a condition.
    pub fn with(mut self, condition: impl Termination<M> + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl<M: Model> Default for GeneralTermination<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Termination<M> for GeneralTermination<M> {
    fn is_terminated(&self, solution: &Solution<M>) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.is_terminated(solution))
    }
}
