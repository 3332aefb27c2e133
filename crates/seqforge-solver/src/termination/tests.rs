//! Tests for termination conditions.

use std::time::Duration;

use seqforge_config::TerminationConfig;
use seqforge_test::PenaltyModel;

use super::*;
use crate::test_utils::{penalty_solution, props};

#[test]
fn test_iteration_limit() {
    let mut solution = penalty_solution(vec![vec![1.0, 2.0]], vec![0]);
    let term = IterationLimit::new(3);

    assert!(!term.is_terminated(&solution));
    solution.update(0.1);
    solution.update(0.2);
    assert!(!term.is_terminated(&solution));
    solution.update(0.3);
    assert!(term.is_terminated(&solution));
}

#[test]
fn test_iteration_limit_ignores_restore() {
    let mut solution = penalty_solution(vec![vec![1.0, 2.0]], vec![0]);
    let term = IterationLimit::new(3);

    solution.update(0.1);
    solution.save_best();
    solution.update(0.2);
    solution.update(0.3);
    solution.restore_best();

    assert_eq!(solution.iteration(), 1);
    assert!(term.is_terminated(&solution));
}

#[test]
fn test_time_limit() {
    let mut solution = penalty_solution(vec![vec![1.0]], vec![0]);
    let term = TimeLimit::millis(1500);

    solution.update(1.0);
    assert!(!term.is_terminated(&solution));
    solution.update(1.5);
    assert!(term.is_terminated(&solution));
}

#[test]
fn test_stop_when_complete_uses_best() {
    let mut solution = Solution::new(PenaltyModel::new(vec![vec![1.0], vec![2.0]]));
    let term = StopWhenComplete;

    solution.save_best();
    assert!(!term.is_terminated(&solution));

    solution.model_mut().assign(0, 0, 1);
    solution.model_mut().assign(1, 0, 1);
    assert!(!term.is_terminated(&solution));

    solution.save_best();
    assert!(term.is_terminated(&solution));
}

#[test]
fn test_general_termination_empty_never_stops() {
    let mut solution = penalty_solution(vec![vec![1.0]], vec![0]);
    let term = GeneralTermination::<PenaltyModel>::from_config(&TerminationConfig::default());

    assert!(term.is_empty());
    for i in 0..100 {
        solution.update(i as f64);
    }
    solution.save_best();
    assert!(!term.is_terminated(&solution));
}

#[test]
fn test_general_termination_from_properties() {
    let term = GeneralTermination::<PenaltyModel>::from_properties(&props(&[
        ("Termination.StopWhenComplete", "true"),
        ("Termination.MaxIters", "10"),
        ("Termination.TimeOut", "2.5"),
    ]))
    .unwrap();
    assert_eq!(term.len(), 3);

    let mut solution = Solution::new(PenaltyModel::new(vec![vec![1.0]]));
    solution.update(2.5);
    assert!(term.is_terminated(&solution));
}

#[test]
fn test_general_termination_any_condition() {
    let term = GeneralTermination::<PenaltyModel>::new()
        .with(IterationLimit::new(5))
        .with(TimeLimit::new(Duration::from_secs(60)));

    let mut solution = penalty_solution(vec![vec![1.0]], vec![0]);
    for i in 0..4 {
        solution.update(i as f64);
    }
    assert!(!term.is_terminated(&solution));
    solution.update(4.0);
    assert!(term.is_terminated(&solution));
}

#[test]
fn test_malformed_termination_key() {
    let result =
        GeneralTermination::<PenaltyModel>::from_properties(&props(&[("Termination.MaxIters", "many")]));
    assert!(result.is_err());
}
