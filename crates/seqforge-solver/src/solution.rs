//! The working solution: a model plus iteration bookkeeping and a best snapshot.
//!
//! [`Solution`] never decides on its own whether the current state is worth
//! keeping. Callers compare first and then call [`Solution::save_best`]; the
//! solution only records what it is told and notifies its listeners.

use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use seqforge_core::{Info, Model};

use crate::event::SolutionListener;

/// Computes the perturbation penalty of a model against some reference
/// assignment (for minimal-perturbation problems).
pub trait PerturbationCounter<M: Model>: Send + Debug {
    fn penalty(&self, model: &M) -> f64;
}

/// Everything recorded by [`Solution::save_best`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSnapshot {
    pub iteration: u64,
    pub time: f64,
    pub value: f64,
    pub complete: bool,
    pub info: Info,
    pub perturbation_penalty: f64,
}

/// A model under search.
pub struct Solution<M: Model> {
    model: M,
    iteration: u64,
    total_iterations: u64,
    time: f64,
    best: Option<BestSnapshot>,
    cleared: bool,
    listeners: Vec<Arc<dyn SolutionListener<M>>>,
    perturbations: Option<Box<dyn PerturbationCounter<M>>>,
}

impl<M: Model> Solution<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            iteration: 0,
            total_iterations: 0,
            time: 0.0,
            best: None,
            cleared: false,
            listeners: Vec::new(),
            perturbations: None,
        }
    }

    pub fn with_perturbation_counter(mut self, counter: Box<dyn PerturbationCounter<M>>) -> Self {
        self.perturbations = Some(counter);
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn SolutionListener<M>>) {
        self.listeners.push(listener);
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Number of [`Solution::update`] calls; never rewound by
    /// [`Solution::restore_best`].
    pub fn total_iterations(&self) -> u64 {
        self.total_iterations
    }

    /// Elapsed seconds at the last [`Solution::update`].
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Records the elapsed time and advances the iteration counter.
    pub fn update(&mut self, time: f64) {
        self.time = time;
        self.iteration += 1;
        self.total_iterations += 1;
        for listener in &self.listeners {
            listener.solution_updated(self);
        }
    }

    /// Records the current state of the model as the best one.
    pub fn save_best(&mut self) {
        self.model.save_best();
        let snapshot = BestSnapshot {
            iteration: self.iteration,
            time: self.time,
            value: self.model.total_value(),
            complete: self.model.is_complete(),
            info: self.info(),
            perturbation_penalty: self.perturbation_penalty(),
        };
        self.best = Some(snapshot);
        self.cleared = false;
        for listener in &self.listeners {
            listener.best_saved(self);
        }
    }

    /// Puts the model back into the best state and rewinds the counters.
    ///
    /// Does nothing when no best has been saved.
    pub fn restore_best(&mut self) {
        let Some(best) = &self.best else {
            return;
        };
        self.iteration = best.iteration;
        self.time = best.time;
        self.model.restore_best();
        for listener in &self.listeners {
            listener.best_restored(self);
        }
    }

    /// Forgets the best snapshot.
    ///
    /// Until the next save, the best iteration and time read as -1.
    pub fn clear_best(&mut self) {
        self.best = None;
        self.cleared = true;
        self.model.clear_best();
        for listener in &self.listeners {
            listener.best_cleared(self);
        }
    }

    pub fn has_best(&self) -> bool {
        self.best.is_some()
    }

    pub fn best(&self) -> Option<&BestSnapshot> {
        self.best.as_ref()
    }

    /// Iteration of the best solution.
    ///
    /// Falls back to the current iteration if nothing was ever saved, and is
    /// -1 after [`Solution::clear_best`].
    pub fn best_iteration(&self) -> i64 {
        match &self.best {
            Some(best) => best.iteration as i64,
            None if self.cleared => -1,
            None => self.iteration as i64,
        }
    }

    /// Time of the best solution, with the same fallbacks as
    /// [`Solution::best_iteration`].
    pub fn best_time(&self) -> f64 {
        match &self.best {
            Some(best) => best.time,
            None if self.cleared => -1.0,
            None => self.time,
        }
    }

    /// Total value of the best solution, 0 if none is saved.
    pub fn best_value(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |b| b.value)
    }

    pub fn is_best_complete(&self) -> bool {
        self.best.as_ref().is_some_and(|b| b.complete)
    }

    pub fn best_info(&self) -> Option<&Info> {
        self.best.as_ref().map(|b| &b.info)
    }

    /// Perturbation penalty of the best solution, -1 if none is saved.
    pub fn best_perturbation_penalty(&self) -> f64 {
        self.best.as_ref().map_or(-1.0, |b| b.perturbation_penalty)
    }

    pub fn perturbation_penalty(&self) -> f64 {
        self.perturbations
            .as_ref()
            .map_or(0.0, |counter| counter.penalty(&self.model))
    }

    /// Model info plus timing and whatever the listeners contribute.
    pub fn info(&self) -> Info {
        let mut info = self.model.info();
        self.decorate(&mut info);
        info
    }

    pub fn extended_info(&self) -> Info {
        let mut info = self.model.extended_info();
        self.decorate(&mut info);
        info
    }

    fn decorate(&self, info: &mut Info) {
        info.insert("Time".to_string(), format!("{:.2} sec", self.time));
        info.insert("Iteration".to_string(), self.iteration.to_string());
        if self.time > 0.0 {
            info.insert(
                "Speed".to_string(),
                format!("{:.2} it/s", self.iteration as f64 / self.time),
            );
        }
        if let Some(counter) = &self.perturbations {
            info.insert(
                "Perturbations".to_string(),
                format!("{}", counter.penalty(&self.model)),
            );
        }
        for listener in &self.listeners {
            listener.info(self, info);
        }
    }
}

impl<M: Model + Debug> Debug for Solution<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solution")
            .field("model", &self.model)
            .field("iteration", &self.iteration)
            .field("time", &self.time)
            .field("best", &self.best)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use seqforge_test::PenaltyModel;

    use super::*;

    #[derive(Debug, Default)]
    struct CountingListener {
        updated: AtomicUsize,
        saved: AtomicUsize,
        restored: AtomicUsize,
        cleared: AtomicUsize,
    }

    impl SolutionListener<PenaltyModel> for CountingListener {
        fn solution_updated(&self, _solution: &Solution<PenaltyModel>) {
            self.updated.fetch_add(1, Ordering::SeqCst);
        }

        fn best_saved(&self, _solution: &Solution<PenaltyModel>) {
            self.saved.fetch_add(1, Ordering::SeqCst);
        }

        fn best_restored(&self, _solution: &Solution<PenaltyModel>) {
            self.restored.fetch_add(1, Ordering::SeqCst);
        }

        fn best_cleared(&self, _solution: &Solution<PenaltyModel>) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }

        fn info(&self, _solution: &Solution<PenaltyModel>, info: &mut Info) {
            info.insert("Listener".to_string(), "yes".to_string());
        }
    }

    fn three_variables() -> Solution<PenaltyModel> {
        Solution::new(PenaltyModel::assigned(
            vec![vec![5.0, 1.0], vec![3.0, 2.0], vec![4.0, 0.0]],
            vec![Some(0), Some(0), Some(0)],
        ))
    }

    #[test]
    fn test_update_increments_iteration() {
        let mut solution = three_variables();
        let listener = Arc::new(CountingListener::default());
        solution.add_listener(listener.clone());

        for i in 1..=5 {
            solution.update(i as f64 * 0.1);
            assert_eq!(solution.iteration(), i);
        }
        assert_eq!(listener.updated.load(Ordering::SeqCst), 5);
        assert_eq!(solution.model().assignments(), 0);
    }

    #[test]
    fn test_unset_best_falls_back() {
        let mut solution = three_variables();
        solution.update(1.5);

        assert!(!solution.has_best());
        assert_eq!(solution.best_iteration(), 1);
        assert_eq!(solution.best_time(), 1.5);
        assert_eq!(solution.best_value(), 0.0);
        assert!(!solution.is_best_complete());
        assert_eq!(solution.best_perturbation_penalty(), -1.0);
    }

    #[test]
    fn test_save_best_records_snapshot() {
        let mut solution = three_variables();
        let listener = Arc::new(CountingListener::default());
        solution.add_listener(listener.clone());

        solution.update(2.0);
        solution.save_best();

        let best = solution.best().unwrap();
        assert_eq!(best.iteration, 1);
        assert_eq!(best.time, 2.0);
        assert_eq!(best.value, 12.0);
        assert!(best.complete);
        assert_eq!(best.perturbation_penalty, 0.0);
        assert_eq!(best.info.get("Listener").map(String::as_str), Some("yes"));
        assert_eq!(listener.saved.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restore_rewinds_and_is_idempotent() {
        let mut solution = three_variables();
        let listener = Arc::new(CountingListener::default());
        solution.add_listener(listener.clone());

        solution.update(1.0);
        solution.save_best();

        solution.model_mut().assign(0, 1, 2);
        solution.update(2.0);
        solution.update(3.0);
        assert_eq!(solution.model().total_value(), 8.0);

        solution.restore_best();
        let first_best = solution.best().cloned();
        let first_assignments: Vec<_> = (0..3)
            .map(|v| solution.model().assignment(v).copied())
            .collect();
        assert_eq!(solution.iteration(), 1);
        assert_eq!(solution.total_iterations(), 3);
        assert_eq!(solution.time(), 1.0);
        assert_eq!(solution.model().total_value(), 12.0);

        solution.restore_best();
        let second_assignments: Vec<_> = (0..3)
            .map(|v| solution.model().assignment(v).copied())
            .collect();
        assert_eq!(first_assignments, second_assignments);
        assert_eq!(solution.best().cloned(), first_best);
        assert_eq!(listener.restored.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_restore_without_best_is_noop() {
        let mut solution = three_variables();
        solution.update(1.0);
        solution.restore_best();
        assert_eq!(solution.iteration(), 1);
        assert_eq!(solution.model().unassigned_count(), 0);
    }

    #[test]
    fn test_clear_best() {
        let mut solution = three_variables();
        let listener = Arc::new(CountingListener::default());
        solution.add_listener(listener.clone());

        solution.save_best();
        solution.clear_best();

        assert!(!solution.has_best());
        assert_eq!(solution.best_value(), 0.0);
        assert_eq!(solution.best_iteration(), -1);
        assert_eq!(solution.best_time(), -1.0);
        assert!(!solution.is_best_complete());
        assert_eq!(solution.best_perturbation_penalty(), -1.0);
        assert_eq!(listener.cleared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_gated_saves_are_monotone() {
        let mut solution = three_variables();
        let moves = [(0, 1), (1, 1), (2, 1), (0, 0)];
        let mut best_values = Vec::new();

        solution.save_best();
        best_values.push(solution.best_value());
        for (iteration, (variable, option)) in moves.into_iter().enumerate() {
            solution.model_mut().assign(variable, option, iteration as u64);
            solution.update(iteration as f64);
            if solution.model().total_value() < solution.best_value() {
                solution.save_best();
            }
            best_values.push(solution.best_value());
        }

        assert!(best_values.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(solution.best_value(), 3.0);
    }

    #[derive(Debug)]
    struct Fixed(f64);

    impl PerturbationCounter<PenaltyModel> for Fixed {
        fn penalty(&self, _model: &PenaltyModel) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_perturbation_penalty() {
        let mut solution = three_variables().with_perturbation_counter(Box::new(Fixed(7.0)));
        solution.save_best();
        assert_eq!(solution.best_perturbation_penalty(), 7.0);
        assert!(solution.info().contains_key("Perturbations"));
    }
}
