use seqforge_config::keys;
use seqforge_core::{Commit, Model, SeqForgeError};
use seqforge_test::PenaltyModel;

use super::*;
use crate::test_utils::{fixed, penalty_solution, props, rng, selectors, Fixed};

#[test]
fn test_parse_selector_specs() {
    let specs = parse_selector_specs(" change@1; swap@0.5;;pool ").unwrap();
    assert_eq!(
        specs,
        vec![
            SelectorSpec {
                key: "change".to_string(),
                bonus: 1.0
            },
            SelectorSpec {
                key: "swap".to_string(),
                bonus: 0.5
            },
            SelectorSpec {
                key: "pool".to_string(),
                bonus: 1.0
            },
        ]
    );
}

#[test]
fn test_parse_selector_specs_rejects_garbage() {
    assert!(matches!(
        parse_selector_specs("change@x"),
        Err(ConfigError::Malformed { .. })
    ));
    assert!(matches!(
        parse_selector_specs("change@-1"),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        parse_selector_specs(" ; "),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_unknown_selector_is_config_error() {
    let registry = SearchRegistry::<PenaltyModel>::new();
    let err = registry
        .build_selectors("change;teleport", &props(&[]))
        .unwrap_err();
    match err {
        SeqForgeError::Config(msg) => assert!(msg.contains("teleport")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unknown_strategy_is_config_error() {
    let registry = SearchRegistry::<PenaltyModel>::new();
    let result = registry.build_strategy(&props(&[
        (keys::SEARCH_STRATEGY, "tabu"),
        (keys::HILL_CLIMBER_NEIGHBOURS, "change"),
    ]));
    assert!(matches!(result, Err(SeqForgeError::Config(_))));
}

#[test]
fn test_registry_builtins_and_custom_keys() {
    let mut registry = SearchRegistry::<PenaltyModel>::new();
    for key in ["change", "swap", "lazy_change", "pool"] {
        assert!(registry.has_selector(key), "{key}");
    }
    for key in [
        "orchestrator",
        "group",
        "hill_climbing",
        "great_deluge",
        "simulated_annealing",
    ] {
        assert!(registry.has_strategy(key), "{key}");
    }

    registry.register_selector("pin", |_, _| {
        Ok(Box::new(Fixed {
            variable: 0,
            value: 1,
        }))
    });
    let built = registry.build_selectors("pin@3", &props(&[])).unwrap();
    assert_eq!(built.len(), 1);
    assert_eq!(built[0].name(), "pin");
    assert_eq!(built[0].bonus(), 3.0);
    assert_eq!(built[0].weight(), 3.0);
}

#[test]
fn test_change_selector_finds_improvement() {
    let solution = penalty_solution(vec![vec![10.0, 4.0]], vec![0]);
    let mut selector = ChangeMoveSelector::new();
    let candidate = MoveSelector::<PenaltyModel>::select_neighbour(
        &mut selector,
        &solution,
        &mut rng(1),
    )
    .unwrap()
    .unwrap();
    assert_eq!(candidate.value(), Some(-6.0));
}

#[test]
fn test_change_selector_skips_unassigned_and_singletons() {
    let solution = Solution::new(PenaltyModel::assigned(
        vec![vec![1.0, 2.0], vec![3.0]],
        vec![None, Some(0)],
    ));
    let mut selector = ChangeMoveSelector::new();
    let candidate =
        MoveSelector::<PenaltyModel>::select_neighbour(&mut selector, &solution, &mut rng(2))
            .unwrap();
    assert!(candidate.is_none());
}

#[test]
fn test_hill_climbing_mode_skips_worsening() {
    let solution = penalty_solution(vec![vec![4.0, 10.0]], vec![0]);
    let mut selector = ChangeMoveSelector::new();

    let candidate =
        MoveSelector::<PenaltyModel>::select_neighbour(&mut selector, &solution, &mut rng(3))
            .unwrap();
    assert_eq!(candidate.and_then(|c| c.value()), Some(6.0));

    MoveSelector::<PenaltyModel>::set_hill_climbing_mode(&mut selector, true);
    let candidate =
        MoveSelector::<PenaltyModel>::select_neighbour(&mut selector, &solution, &mut rng(3))
            .unwrap();
    assert!(candidate.is_none());
}

#[test]
fn test_swap_selector() {
    let solution = penalty_solution(vec![vec![1.0, 5.0], vec![5.0, 1.0]], vec![0, 1]);
    let mut selector = SwapMoveSelector::new();

    let candidate =
        MoveSelector::<PenaltyModel>::select_neighbour(&mut selector, &solution, &mut rng(4))
            .unwrap()
            .unwrap();
    assert_eq!(candidate.value(), Some(8.0));

    MoveSelector::<PenaltyModel>::set_hill_climbing_mode(&mut selector, true);
    let candidate =
        MoveSelector::<PenaltyModel>::select_neighbour(&mut selector, &solution, &mut rng(4))
            .unwrap();
    assert!(candidate.is_none());
}

#[test]
fn test_lazy_change_commit() {
    let mut solution = penalty_solution(vec![vec![10.0, 4.0]], vec![0]);
    let mut selector = LazyChangeMoveSelector::new();
    let mut propose = |solution: &Solution<PenaltyModel>| {
        match MoveSelector::<PenaltyModel>::select_neighbour(&mut selector, solution, &mut rng(5))
            .unwrap()
        {
            Some(Candidate::Lazy(neighbour)) => neighbour,
            other => panic!("expected a lazy candidate, got {other:?}"),
        }
    };

    let neighbour = propose(&solution);
    let commit = neighbour.commit(solution.model_mut(), 1, &mut |_, _| false);
    assert_eq!(commit, Commit::Rejected(-6.0));
    assert_eq!(solution.model().assignment(0), Some(&0));

    let neighbour = propose(&solution);
    let commit = neighbour.commit(solution.model_mut(), 2, &mut |_, delta| delta <= 0.0);
    assert_eq!(commit, Commit::Applied(-6.0));
    assert_eq!(solution.model().total_value(), 4.0);
}

#[test]
fn test_pool_updates_child_points() {
    let solution = penalty_solution(vec![vec![10.0, 4.0]], vec![0]);
    let mut pool = SelectorPool::new(vec![fixed(0, 1)], false, true);

    let candidate = pool.select_neighbour(&solution, &mut rng(6)).unwrap().unwrap();
    assert_eq!(candidate.value(), Some(-6.0));
    assert!((pool.children()[0].points() - 1.5).abs() < 1e-12);
}

#[test]
fn test_pool_without_update_keeps_points() {
    let solution = penalty_solution(vec![vec![10.0, 4.0]], vec![0]);
    let mut pool = SelectorPool::new(vec![fixed(0, 1), fixed(0, 0)], true, false);
    for seed in 0..10 {
        pool.select_neighbour(&solution, &mut rng(seed)).unwrap();
    }
    assert!(pool.children().iter().all(|c| c.points() == 1.0));
}

#[test]
fn test_pool_from_registry() {
    let registry = SearchRegistry::<PenaltyModel>::new();

    let missing = registry.build_selectors("pool", &props(&[]));
    assert!(missing.is_err());

    let nested = registry.build_selectors("pool", &props(&[(keys::POOL_NEIGHBOURS, "change;pool")]));
    assert!(nested.is_err());

    let built = registry
        .build_selectors("pool@2", &props(&[(keys::POOL_NEIGHBOURS, "change;swap")]))
        .unwrap();
    assert_eq!(built[0].name(), "pool");
}

#[test]
fn test_roulette() {
    let mut r = rng(7);
    assert_eq!(roulette(&[], &mut r), None);
    for _ in 0..100 {
        assert_eq!(roulette(&[0.0, 2.0, 0.0], &mut r), Some(1));
    }
    let picks: Vec<usize> = (0..100)
        .filter_map(|_| roulette(&[0.0, 0.0, 0.0], &mut r))
        .collect();
    assert_eq!(picks.len(), 100);
    assert!(picks.iter().all(|&p| p < 3));
}

#[test]
fn test_points_floor_and_usage() {
    let solution = penalty_solution(vec![vec![10.0, 4.0]], vec![0]);
    let mut selector = fixed(0, 1);
    for _ in 0..500 {
        selector.update_points(0.0);
    }
    assert!(selector.points() > 0.0);

    selector.init(&solution).unwrap();
    selector.select_neighbour(&solution, &mut rng(8)).unwrap();
    selector.select_neighbour(&solution, &mut rng(9)).unwrap();
    assert_eq!(selector.usage(), (2, 2));
}

#[test]
fn test_selectors_helper_builds_in_order() {
    let built = selectors::<PenaltyModel>("swap@0.5;change");
    let names: Vec<&str> = built.iter().map(NeighbourSelector::name).collect();
    assert_eq!(names, vec!["swap", "change"]);
}
