//! Independent-penalty test fixtures.
//!
//! Every variable picks one option from its own penalty table. There are no
//! conflicts, so the total value is simply the sum of the chosen penalties.
//!
//! # Example
//!
//! ```
//! use seqforge_core::Model;
//! use seqforge_test::penalty::PenaltyModel;
//!
//! // One variable: option 0 costs 10, option 1 costs 4. Starts on option 0.
//! let model = PenaltyModel::assigned(vec![vec![10.0, 4.0]], vec![Some(0)]);
//! assert_eq!(model.total_value(), 10.0);
//! assert_eq!(model.delta(0, &1), -6.0);
//! ```

use seqforge_core::{Info, Model};

/// A model with independent per-variable option penalties.
#[derive(Clone, Debug)]
pub struct PenaltyModel {
    penalties: Vec<Vec<f64>>,
    domains: Vec<Vec<usize>>,
    assigned: Vec<Option<usize>>,
    best: Option<Vec<Option<usize>>>,
    assignments: u64,
}

impl PenaltyModel {
    /// Creates the model with every variable unassigned.
    pub fn new(penalties: Vec<Vec<f64>>) -> Self {
        let n = penalties.len();
        Self::assigned(penalties, vec![None; n])
    }

    /// Creates the model with an initial assignment.
    pub fn assigned(penalties: Vec<Vec<f64>>, assigned: Vec<Option<usize>>) -> Self {
        assert_eq!(penalties.len(), assigned.len());
        let domains = penalties.iter().map(|p| (0..p.len()).collect()).collect();
        Self {
            penalties,
            domains,
            assigned,
            best: None,
            assignments: 0,
        }
    }

    /// Number of `assign` calls so far.
    pub fn assignments(&self) -> u64 {
        self.assignments
    }

    fn penalty_of(&self, variable: usize, option: Option<usize>) -> f64 {
        option.map_or(0.0, |o| self.penalties[variable][o])
    }
}

impl Model for PenaltyModel {
    type Value = usize;

    fn variable_count(&self) -> usize {
        self.assigned.len()
    }

    fn values(&self, variable: usize) -> &[usize] {
        &self.domains[variable]
    }

    fn assignment(&self, variable: usize) -> Option<&usize> {
        self.assigned[variable].as_ref()
    }

    fn assign(&mut self, variable: usize, value: usize, _iteration: u64) {
        self.assignments += 1;
        self.assigned[variable] = Some(value);
    }

    fn unassign(&mut self, variable: usize, _iteration: u64) {
        self.assigned[variable] = None;
    }

    fn delta(&self, variable: usize, value: &usize) -> f64 {
        self.penalties[variable][*value] - self.penalty_of(variable, self.assigned[variable])
    }

    fn conflict_values(&self, _variable: usize, _value: &usize) -> Vec<usize> {
        Vec::new()
    }

    fn swap_delta(&self, a: usize, b: usize) -> Option<f64> {
        let va = self.assigned[a]?;
        let vb = self.assigned[b]?;
        let after_a = *self.penalties[a].get(vb)?;
        let after_b = *self.penalties[b].get(va)?;
        Some(after_a + after_b - self.penalties[a][va] - self.penalties[b][vb])
    }

    fn unassigned_count(&self) -> usize {
        self.assigned.iter().filter(|a| a.is_none()).count()
    }

    fn total_value(&self) -> f64 {
        (0..self.assigned.len())
            .map(|v| self.penalty_of(v, self.assigned[v]))
            .sum()
    }

    fn save_best(&mut self) {
        self.best = Some(self.assigned.clone());
    }

    fn restore_best(&mut self) {
        self.assigned = match &self.best {
            Some(best) => best.clone(),
            None => vec![None; self.assigned.len()],
        };
    }

    fn clear_best(&mut self) {
        self.best = None;
    }

    fn best_unassigned_count(&self) -> usize {
        match &self.best {
            Some(best) => best.iter().filter(|a| a.is_none()).count(),
            None => self.assigned.len(),
        }
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert("Total value".to_string(), format!("{}", self.total_value()));
        info.insert(
            "Assigned variables".to_string(),
            format!(
                "{}/{}",
                self.variable_count() - self.unassigned_count(),
                self.variable_count()
            ),
        );
        info
    }
}
