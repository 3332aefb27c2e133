//! Neighbours: proposed atomic transitions of a [`Model`].
//!
//! Two flavours exist:
//!
//! - [`Neighbour`]: the penalty delta is known up front and the strategy
//!   decides before anything is committed.
//! - [`LazyNeighbour`]: the delta is only known once the change is applied,
//!   so the acceptance decision is passed in as a predicate at commit time
//!   and the change is undone when the predicate refuses it.
//!
//! Both are transient; generators create them and the solver consumes them
//! within a single iteration.

use std::fmt::{self, Debug};

use crate::model::Model;

/// A change with a precomputed penalty delta.
pub trait Neighbour<M: Model>: Send + Debug {
    /// Signed change of total value. Negative is an improvement.
    fn value(&self) -> f64;

    /// Commits the change into the model.
    fn assign(&self, model: &mut M, iteration: u64);
}

/// Outcome of committing a [`LazyNeighbour`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commit {
    /// The predicate accepted the change; it stays in the model.
    Applied(f64),
    /// The predicate refused the change; the model was put back.
    Rejected(f64),
}

impl Commit {
    /// The delta observed while the change was applied.
    pub fn value(&self) -> f64 {
        match self {
            Commit::Applied(value) | Commit::Rejected(value) => *value,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Commit::Applied(_))
    }
}

/// A change whose delta is computed while committing.
///
/// Constructing a lazy neighbour must not touch the model. [`LazyNeighbour::commit`]
/// applies it, measures the delta, asks `accept(model, delta)` and reverts
/// the change if the answer is `false`.
pub trait LazyNeighbour<M: Model>: Send + Debug {
    fn commit(
        &self,
        model: &mut M,
        iteration: u64,
        accept: &mut dyn FnMut(&M, f64) -> bool,
    ) -> Commit;
}

/// What a move generator hands back to a strategy.
pub enum Candidate<M: Model> {
    Eager(Box<dyn Neighbour<M>>),
    Lazy(Box<dyn LazyNeighbour<M>>),
}

impl<M: Model> Candidate<M> {
    pub fn eager(neighbour: impl Neighbour<M> + 'static) -> Self {
        Candidate::Eager(Box::new(neighbour))
    }

    pub fn lazy(neighbour: impl LazyNeighbour<M> + 'static) -> Self {
        Candidate::Lazy(Box::new(neighbour))
    }

    /// Known delta, `None` for lazy candidates.
    pub fn value(&self) -> Option<f64> {
        match self {
            Candidate::Eager(neighbour) => Some(neighbour.value()),
            Candidate::Lazy(_) => None,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Candidate::Lazy(_))
    }
}

impl<M: Model> Debug for Candidate<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Eager(neighbour) => f.debug_tuple("Eager").field(neighbour).finish(),
            Candidate::Lazy(neighbour) => f.debug_tuple("Lazy").field(neighbour).finish(),
        }
    }
}

/// Assigns one variable (or unassigns it when `value` is `None`).
pub struct SimpleNeighbour<M: Model> {
    variable: usize,
    value: Option<M::Value>,
    delta: f64,
}

impl<M: Model> SimpleNeighbour<M> {
    /// Creates the neighbour, computing its delta from the model.
    pub fn new(model: &M, variable: usize, value: M::Value) -> Self {
        let delta = model.delta(variable, &value);
        Self {
            variable,
            value: Some(value),
            delta,
        }
    }

    /// Creates the neighbour with a delta already known to the caller.
    pub fn with_delta(variable: usize, value: Option<M::Value>, delta: f64) -> Self {
        Self {
            variable,
            value,
            delta,
        }
    }

    pub fn variable(&self) -> usize {
        self.variable
    }

    pub fn target(&self) -> Option<&M::Value> {
        self.value.as_ref()
    }
}

impl<M: Model> Debug for SimpleNeighbour<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNeighbour")
            .field("variable", &self.variable)
            .field("value", &self.value)
            .field("delta", &self.delta)
            .finish()
    }
}

impl<M: Model> Neighbour<M> for SimpleNeighbour<M> {
    fn value(&self) -> f64 {
        self.delta
    }

    fn assign(&self, model: &mut M, iteration: u64) {
        match &self.value {
            Some(value) => model.assign(self.variable, value.clone(), iteration),
            None => model.unassign(self.variable, iteration),
        }
    }
}

/// Exchanges the values of two assigned variables.
pub struct SwapNeighbour<M: Model> {
    first: usize,
    second: usize,
    delta: f64,
    _model: std::marker::PhantomData<fn() -> M>,
}

impl<M: Model> SwapNeighbour<M> {
    /// Creates the swap if both variables are assigned and the model can
    /// evaluate it.
    pub fn new(model: &M, first: usize, second: usize) -> Option<Self> {
        if first == second {
            return None;
        }
        model.assignment(first)?;
        model.assignment(second)?;
        let delta = model.swap_delta(first, second)?;
        Some(Self {
            first,
            second,
            delta,
            _model: std::marker::PhantomData,
        })
    }

    pub fn variables(&self) -> (usize, usize) {
        (self.first, self.second)
    }
}

impl<M: Model> Debug for SwapNeighbour<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapNeighbour")
            .field("first", &self.first)
            .field("second", &self.second)
            .field("delta", &self.delta)
            .finish()
    }
}

impl<M: Model> Neighbour<M> for SwapNeighbour<M> {
    fn value(&self) -> f64 {
        self.delta
    }

    fn assign(&self, model: &mut M, iteration: u64) {
        let (Some(a), Some(b)) = (
            model.assignment(self.first).cloned(),
            model.assignment(self.second).cloned(),
        ) else {
            return;
        };
        model.unassign(self.first, iteration);
        model.unassign(self.second, iteration);
        model.assign(self.first, b, iteration);
        model.assign(self.second, a, iteration);
    }
}

/// Assigns one variable and measures the delta on the model itself.
pub struct LazyChangeNeighbour<M: Model> {
    variable: usize,
    value: M::Value,
}

impl<M: Model> LazyChangeNeighbour<M> {
    pub fn new(variable: usize, value: M::Value) -> Self {
        Self { variable, value }
    }
}

impl<M: Model> Debug for LazyChangeNeighbour<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyChangeNeighbour")
            .field("variable", &self.variable)
            .field("value", &self.value)
            .finish()
    }
}

impl<M: Model> LazyNeighbour<M> for LazyChangeNeighbour<M> {
    fn commit(
        &self,
        model: &mut M,
        iteration: u64,
        accept: &mut dyn FnMut(&M, f64) -> bool,
    ) -> Commit {
        let previous = model.assignment(self.variable).cloned();
        let displaced: Vec<(usize, M::Value)> = model
            .conflict_values(self.variable, &self.value)
            .into_iter()
            .filter(|&other| other != self.variable)
            .filter_map(|other| model.assignment(other).cloned().map(|v| (other, v)))
            .collect();

        let before = model.total_value();
        model.assign(self.variable, self.value.clone(), iteration);
        let delta = model.total_value() - before;

        if accept(model, delta) {
            return Commit::Applied(delta);
        }

        model.unassign(self.variable, iteration);
        for (other, value) in displaced {
            model.assign(other, value, iteration);
        }
        if let Some(value) = previous {
            model.assign(self.variable, value, iteration);
        }
        Commit::Rejected(delta)
    }
}
