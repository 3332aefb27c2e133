//! Solver extensions.
//!
//! An extension observes the search from inside the solver thread: it is
//! initialized before the first iteration and sees every committed move.
//! Some extensions keep per-variable or per-value bookkeeping; only one
//! extension may claim each of those slots.

use std::fmt::Debug;

use seqforge_core::{Model, Result};
use tracing::warn;

use crate::solution::Solution;

/// Outcome of [`ExtensionRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// Another extension already keeps per-value bookkeeping.
    ValueExtraClaimed,
    /// Another extension already keeps per-variable bookkeeping.
    VariableExtraClaimed,
}

impl Registration {
    pub fn is_registered(self) -> bool {
        self == Registration::Registered
    }
}

/// A plug-in observing the search.
pub trait Extension<M: Model>: Send + Debug {
    fn name(&self) -> &str;

    /// Whether the extension keeps per-value bookkeeping.
    fn uses_value_extra(&self) -> bool {
        false
    }

    /// Whether the extension keeps per-variable bookkeeping.
    fn uses_variable_extra(&self) -> bool {
        false
    }

    /// Called on the solver thread before the first iteration.
    fn init(&mut self, _solution: &Solution<M>) -> Result<()> {
        Ok(())
    }

    /// Called after a move with delta `value` was committed.
    fn after_assigned(&mut self, _solution: &Solution<M>, _value: f64) {}

    /// Called once the loop has ended.
    fn done(&mut self, _solution: &Solution<M>) {}
}

/// The extensions of one solver.
pub struct ExtensionRegistry<M: Model> {
    extensions: Vec<Box<dyn Extension<M>>>,
    value_extra_claimed: bool,
    variable_extra_claimed: bool,
}

impl<M: Model> ExtensionRegistry<M> {
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            value_extra_claimed: false,
            variable_extra_claimed: false,
        }
    }

    /// Adds an extension unless a bookkeeping slot it needs is taken.
    pub fn register(&mut self, extension: Box<dyn Extension<M>>) -> Registration {
        if extension.uses_value_extra() && self.value_extra_claimed {
            warn!(
                event = "extension_rejected",
                extension = extension.name(),
                reason = "value extra already claimed",
            );
            return Registration::ValueExtraClaimed;
        }
        if extension.uses_variable_extra() && self.variable_extra_claimed {
            warn!(
                event = "extension_rejected",
                extension = extension.name(),
                reason = "variable extra already claimed",
            );
            return Registration::VariableExtraClaimed;
        }
        self.value_extra_claimed |= extension.uses_value_extra();
        self.variable_extra_claimed |= extension.uses_variable_extra();
        self.extensions.push(extension);
        Registration::Registered
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    pub fn init(&mut self, solution: &Solution<M>) -> Result<()> {
        for extension in &mut self.extensions {
            extension.init(solution)?;
        }
        Ok(())
    }

    pub fn after_assigned(&mut self, solution: &Solution<M>, value: f64) {
        for extension in &mut self.extensions {
            extension.after_assigned(solution, value);
        }
    }

    pub fn done(&mut self, solution: &Solution<M>) {
        for extension in &mut self.extensions {
            extension.done(solution);
        }
    }
}

impl<M: Model> Default for ExtensionRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Debug for ExtensionRegistry<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.names())
            .field("value_extra_claimed", &self.value_extra_claimed)
            .field("variable_extra_claimed", &self.variable_extra_claimed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use seqforge_test::PenaltyModel;

    use super::*;

    #[derive(Debug)]
    struct Probe {
        name: &'static str,
        value_extra: bool,
        variable_extra: bool,
        assigned: Arc<AtomicUsize>,
    }

    impl Probe {
        fn new(name: &'static str, value_extra: bool, variable_extra: bool) -> Self {
            Self {
                name,
                value_extra,
                variable_extra,
                assigned: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Extension<PenaltyModel> for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn uses_value_extra(&self) -> bool {
            self.value_extra
        }

        fn uses_variable_extra(&self) -> bool {
            self.variable_extra
        }

        fn after_assigned(&mut self, _solution: &Solution<PenaltyModel>, _value: f64) {
            self.assigned.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_exclusive_slots() {
        let mut registry = ExtensionRegistry::<PenaltyModel>::new();

        assert_eq!(
            registry.register(Box::new(Probe::new("values", true, false))),
            Registration::Registered
        );
        assert_eq!(
            registry.register(Box::new(Probe::new("values2", true, false))),
            Registration::ValueExtraClaimed
        );
        assert_eq!(
            registry.register(Box::new(Probe::new("variables", false, true))),
            Registration::Registered
        );
        assert_eq!(
            registry.register(Box::new(Probe::new("variables2", false, true))),
            Registration::VariableExtraClaimed
        );
        assert!(registry
            .register(Box::new(Probe::new("plain", false, false)))
            .is_registered());

        assert_eq!(registry.names(), vec!["values", "variables", "plain"]);
    }

    #[test]
    fn test_after_assigned_reaches_every_extension() {
        let mut registry = ExtensionRegistry::<PenaltyModel>::new();
        let first = Probe::new("first", false, false);
        let second = Probe::new("second", false, false);
        let counters = [first.assigned.clone(), second.assigned.clone()];
        registry.register(Box::new(first));
        registry.register(Box::new(second));

        let solution = Solution::new(PenaltyModel::new(vec![vec![1.0]]));
        registry.init(&solution).unwrap();
        registry.after_assigned(&solution, -1.0);
        registry.after_assigned(&solution, 0.0);

        for counter in counters {
            assert_eq!(counter.load(Ordering::SeqCst), 2);
        }
    }
}
