//! The problem model consumed by the search engine.
//!
//! A [`Model`] owns a fixed set of variables, identified by index, each with a
//! discrete domain of candidate values. The engine never inspects values
//! beyond equality; all penalty arithmetic is delegated to the model through
//! [`Model::delta`] and [`Model::total_value`].

use std::collections::BTreeMap;
use std::fmt::Debug;

/// Opaque string-keyed diagnostics, as reported by models and solutions.
pub type Info = BTreeMap<String, String>;

/// A timetabling-style problem model with incremental penalty queries.
///
/// Lower total value is better. Assigning a value that conflicts with the
/// current assignment of other variables unassigns those variables, so a
/// model never holds a hard-infeasible assignment.
///
/// # Best state
///
/// The model keeps its own copy of the best assignment. [`Model::save_best`]
/// records it, [`Model::restore_best`] puts it back and [`Model::clear_best`]
/// forgets it. Restoring after a clear leaves every variable unassigned.
pub trait Model: Send + 'static {
    /// A candidate assignment for a variable.
    type Value: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Number of variables in the model.
    fn variable_count(&self) -> usize;

    /// The domain of the given variable.
    fn values(&self, variable: usize) -> &[Self::Value];

    /// Current assignment of the variable, `None` if unassigned.
    fn assignment(&self, variable: usize) -> Option<&Self::Value>;

    /// Assigns `value` to `variable`, unassigning any conflicting variables.
    fn assign(&mut self, variable: usize, value: Self::Value, iteration: u64);

    /// Unassigns the variable. No-op when already unassigned.
    fn unassign(&mut self, variable: usize, iteration: u64);

    /// Change of [`Model::total_value`] if `variable` were assigned `value`.
    fn delta(&self, variable: usize, value: &Self::Value) -> f64;

    /// Variables whose current assignment conflicts with `variable = value`.
    fn conflict_values(&self, variable: usize, value: &Self::Value) -> Vec<usize>;

    /// Change of total value if the values of `a` and `b` were exchanged.
    ///
    /// Returns `None` when the model cannot evaluate swaps, or when the swap
    /// is not feasible (for example, a value is outside the other domain).
    fn swap_delta(&self, _a: usize, _b: usize) -> Option<f64> {
        None
    }

    /// Number of unassigned variables.
    fn unassigned_count(&self) -> usize;

    /// Total soft penalty of the current assignment.
    fn total_value(&self) -> f64;

    /// Records the current assignment as the best one.
    fn save_best(&mut self);

    /// Restores the best assignment recorded by [`Model::save_best`].
    fn restore_best(&mut self);

    /// Forgets the best assignment.
    fn clear_best(&mut self);

    /// Number of unassigned variables in the best assignment.
    fn best_unassigned_count(&self) -> usize;

    /// Short diagnostics.
    fn info(&self) -> Info;

    /// Detailed diagnostics, defaults to [`Model::info`].
    fn extended_info(&self) -> Info {
        self.info()
    }

    /// Sum of all domain sizes.
    fn total_domain_size(&self) -> usize {
        (0..self.variable_count())
            .map(|variable| self.values(variable).len())
            .sum()
    }

    /// Whether every variable is assigned.
    fn is_complete(&self) -> bool {
        self.unassigned_count() == 0
    }
}
