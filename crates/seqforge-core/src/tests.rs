//! Tests for neighbour commit semantics.

use super::*;

/// Variables take exclusive slots; each (variable, slot) has a penalty.
#[derive(Debug)]
struct SlotModel {
    slots: Vec<u32>,
    penalty: Vec<Vec<f64>>,
    assigned: Vec<Option<u32>>,
    best: Vec<Option<u32>>,
}

impl SlotModel {
    fn new(penalty: Vec<Vec<f64>>) -> Self {
        let n = penalty.len();
        let slots = (0..penalty[0].len() as u32).collect();
        Self {
            slots,
            penalty,
            assigned: vec![None; n],
            best: vec![None; n],
        }
    }
}

impl Model for SlotModel {
    type Value = u32;

    fn variable_count(&self) -> usize {
        self.assigned.len()
    }

    fn values(&self, _variable: usize) -> &[u32] {
        &self.slots
    }

    fn assignment(&self, variable: usize) -> Option<&u32> {
        self.assigned[variable].as_ref()
    }

    fn assign(&mut self, variable: usize, value: u32, iteration: u64) {
        for other in self.conflict_values(variable, &value) {
            self.unassign(other, iteration);
        }
        self.assigned[variable] = Some(value);
    }

    fn unassign(&mut self, variable: usize, _iteration: u64) {
        self.assigned[variable] = None;
    }

    fn delta(&self, variable: usize, value: &u32) -> f64 {
        let old = self.assigned[variable].map_or(0.0, |v| self.penalty[variable][v as usize]);
        let displaced: f64 = self
            .conflict_values(variable, value)
            .into_iter()
            .filter_map(|o| self.assigned[o].map(|v| self.penalty[o][v as usize]))
            .sum();
        self.penalty[variable][*value as usize] - old - displaced
    }

    fn conflict_values(&self, variable: usize, value: &u32) -> Vec<usize> {
        (0..self.assigned.len())
            .filter(|&o| o != variable && self.assigned[o] == Some(*value))
            .collect()
    }

    fn swap_delta(&self, a: usize, b: usize) -> Option<f64> {
        let va = self.assigned[a]? as usize;
        let vb = self.assigned[b]? as usize;
        Some(self.penalty[a][vb] + self.penalty[b][va] - self.penalty[a][va] - self.penalty[b][vb])
    }

    fn unassigned_count(&self) -> usize {
        self.assigned.iter().filter(|a| a.is_none()).count()
    }

    fn total_value(&self) -> f64 {
        self.assigned
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.map(|v| self.penalty[i][v as usize]))
            .sum()
    }

    fn save_best(&mut self) {
        self.best = self.assigned.clone();
    }

    fn restore_best(&mut self) {
        self.assigned = self.best.clone();
    }

    fn clear_best(&mut self) {
        self.best = vec![None; self.assigned.len()];
    }

    fn best_unassigned_count(&self) -> usize {
        self.best.iter().filter(|a| a.is_none()).count()
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert("Total".to_string(), format!("{}", self.total_value()));
        info
    }
}

fn two_by_two() -> SlotModel {
    SlotModel::new(vec![vec![1.0, 5.0], vec![3.0, 2.0]])
}

#[test]
fn test_simple_neighbour_delta_and_assign() {
    let mut model = two_by_two();
    model.assign(0, 1, 0);

    let neighbour = SimpleNeighbour::new(&model, 0, 0);
    assert_eq!(neighbour.value(), -4.0);

    neighbour.assign(&mut model, 1);
    assert_eq!(model.assignment(0), Some(&0));
    assert_eq!(model.total_value(), 1.0);
}

#[test]
fn test_simple_neighbour_unassign() {
    let mut model = two_by_two();
    model.assign(1, 0, 0);

    let neighbour = SimpleNeighbour::<SlotModel>::with_delta(1, None, -3.0);
    neighbour.assign(&mut model, 1);
    assert_eq!(model.unassigned_count(), 2);
}

#[test]
fn test_swap_neighbour() {
    let mut model = two_by_two();
    model.assign(0, 1, 0);
    model.assign(1, 0, 0);
    assert_eq!(model.total_value(), 8.0);

    let swap = SwapNeighbour::new(&model, 0, 1).expect("swap should be feasible");
    assert_eq!(swap.value(), -5.0);
    swap.assign(&mut model, 1);

    assert_eq!(model.assignment(0), Some(&0));
    assert_eq!(model.assignment(1), Some(&1));
    assert_eq!(model.total_value(), 3.0);
}

#[test]
fn test_swap_requires_assigned_variables() {
    let mut model = two_by_two();
    model.assign(0, 0, 0);
    assert!(SwapNeighbour::new(&model, 0, 1).is_none());
    assert!(SwapNeighbour::new(&model, 0, 0).is_none());
}

#[test]
fn test_lazy_commit_applied() {
    let mut model = two_by_two();
    model.assign(0, 1, 0);

    let lazy = LazyChangeNeighbour::new(0, 0);
    let commit = lazy.commit(&mut model, 1, &mut |_, delta| delta <= 0.0);

    assert_eq!(commit, Commit::Applied(-4.0));
    assert_eq!(model.assignment(0), Some(&0));
}

#[test]
fn test_lazy_commit_rejected_restores_displaced() {
    let mut model = two_by_two();
    model.assign(0, 0, 0);
    model.assign(1, 1, 0);

    // Moving variable 0 onto slot 1 displaces variable 1.
    let lazy = LazyChangeNeighbour::new(0, 1);
    let mut seen = None;
    let commit = lazy.commit(&mut model, 1, &mut |m: &SlotModel, delta| {
        seen = Some(m.unassigned_count());
        delta < -100.0
    });

    assert!(!commit.is_applied());
    assert_eq!(seen, Some(1));
    assert_eq!(model.assignment(0), Some(&0));
    assert_eq!(model.assignment(1), Some(&1));
    assert_eq!(model.total_value(), 3.0);
}

#[test]
fn test_candidate_value() {
    let model = two_by_two();
    let eager: Candidate<SlotModel> = Candidate::eager(SimpleNeighbour::new(&model, 0, 0));
    let lazy: Candidate<SlotModel> = Candidate::lazy(LazyChangeNeighbour::new(0, 0));

    assert_eq!(eager.value(), Some(1.0));
    assert!(!eager.is_lazy());
    assert_eq!(lazy.value(), None);
    assert!(lazy.is_lazy());
}

#[test]
fn test_total_domain_size() {
    let model = two_by_two();
    assert_eq!(model.total_domain_size(), 4);
    assert!(!model.is_complete());
}
