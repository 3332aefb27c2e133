//! Decides whether the current solution should replace the best one.

use std::fmt::Debug;

use seqforge_core::Model;

use crate::solution::Solution;

/// Judges the current state of a solution against its best snapshot.
pub trait SolutionComparator<M: Model>: Send + Debug {
    /// Returns true if the current state is strictly better than the best.
    fn is_better_than_best(&self, solution: &Solution<M>) -> bool;
}

/// Fewer unassigned variables first, then lower total value.
///
/// Without a saved best, the current state always wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralComparator;

impl<M: Model> SolutionComparator<M> for GeneralComparator {
    fn is_better_than_best(&self, solution: &Solution<M>) -> bool {
        if !solution.has_best() {
            return true;
        }
        let model = solution.model();
        let unassigned = model.unassigned_count();
        let best_unassigned = model.best_unassigned_count();
        if unassigned != best_unassigned {
            return unassigned < best_unassigned;
        }
        model.total_value() < solution.best_value()
    }
}

#[cfg(test)]
mod tests {
    use seqforge_core::Model;
    use seqforge_test::PenaltyModel;

    use super::*;

    #[test]
    fn test_without_best_current_wins() {
        let solution = Solution::new(PenaltyModel::new(vec![vec![3.0]]));
        assert!(GeneralComparator.is_better_than_best(&solution));
    }

    #[test]
    fn test_fewer_unassigned_wins_over_value() {
        let mut solution = Solution::new(PenaltyModel::new(vec![vec![1.0], vec![50.0]]));
        solution.model_mut().assign(0, 0, 0);
        solution.save_best();

        solution.model_mut().assign(1, 0, 1);
        assert!(solution.model().total_value() > solution.best_value());
        assert!(GeneralComparator.is_better_than_best(&solution));

        solution.save_best();
        solution.model_mut().unassign(1, 2);
        assert!(solution.model().total_value() < solution.best_value());
        assert!(!GeneralComparator.is_better_than_best(&solution));
    }

    #[test]
    fn test_lower_value_must_be_strict() {
        let mut solution = Solution::new(PenaltyModel::assigned(
            vec![vec![4.0, 4.0, 2.0]],
            vec![Some(0)],
        ));
        solution.save_best();

        solution.model_mut().assign(0, 1, 1);
        assert!(!GeneralComparator.is_better_than_best(&solution));

        solution.model_mut().assign(0, 2, 2);
        assert!(GeneralComparator.is_better_than_best(&solution));
    }
}
