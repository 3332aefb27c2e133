//! Tests for property loading and typed configuration.

use super::*;

#[test]
fn test_toml_flattening() {
    let toml = r#"
        [General]
        Seed = 42

        [Sequence]
        LearningMethod = 0
        HC = 2

        [HillClimber]
        Neighbours = ["change@1", "swap@0.5"]

        [Search.NextHeuristicsOnReheat]
        AlterBound = true
    "#;

    let props = Properties::from_toml_str(toml).unwrap();
    assert_eq!(props.get("General.Seed"), Some("42"));
    assert_eq!(props.get("Sequence.LearningMethod"), Some("0"));
    assert_eq!(props.get("HillClimber.Neighbours"), Some("change@1;swap@0.5"));
    assert_eq!(
        props.get("Search.NextHeuristicsOnReheat.AlterBound"),
        Some("true")
    );
}

#[test]
fn test_yaml_flattening() {
    let yaml = r#"
        GreatDeluge:
          CoolRate: 0.99
          LowerBoundRate: 0.9
        Termination:
          MaxIters: 1000
    "#;

    let props = Properties::from_yaml_str(yaml).unwrap();
    assert_eq!(props.get_f64("GreatDeluge.CoolRate", 0.0).unwrap(), 0.99);
    assert_eq!(props.get_i64("Termination.MaxIters", -1).unwrap(), 1000);
}

#[test]
fn test_properties_text() {
    let text = "
        # comment
        Sequence.Sequence = false
        HillClimber.MaxIdle: 500
        ! another comment
    ";

    let props = Properties::from_properties_str(text).unwrap();
    assert_eq!(props.len(), 2);
    assert!(!props.get_bool("Sequence.Sequence", true).unwrap());
    assert_eq!(props.get_u64("HillClimber.MaxIdle", 0).unwrap(), 500);
}

#[test]
fn test_properties_text_rejects_garbage() {
    let result = Properties::from_properties_str("just words");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_malformed_value_fails() {
    let props = Properties::new().with(keys::GREAT_DELUGE_COOL_RATE, "fast");
    let err = GreatDelugeConfig::from_properties(&props).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { .. }));
}

#[test]
fn test_require_missing() {
    let props = Properties::new();
    assert!(matches!(
        props.require(keys::HILL_CLIMBER_NEIGHBOURS),
        Err(ConfigError::Missing(_))
    ));
}

#[test]
fn test_defaults() {
    let config = SolverConfig::from_properties(&Properties::new()).unwrap();

    assert_eq!(config.general.seed, None);
    assert_eq!(config.general.save_best_unassigned, 0);
    assert!(config.sequence.sequence);
    assert_eq!(config.sequence.selection_type, SelectionType::Unrestricted);
    assert_eq!(config.sequence.learning_method, LearningMethod::Delta);
    assert_eq!(config.sequence.reset_interval(), 1);
    assert_eq!(config.hill_climber.max_idle, 100_000);
    assert_eq!(config.great_deluge.cool_rate, 0.999_999_5);
    assert_eq!(config.simulated_annealing.initial_temperature, 1.5);
    assert_eq!(config.search.hc_rank, 0);
    assert_eq!(config.search.gd_rank, 1);
    assert_eq!(config.search.sa_rank, -1);
    assert_eq!(config.search.restart_limit, 200);
    assert_eq!(config.termination.max_iters, None);
}

#[test]
fn test_cool_rate_inverse() {
    let props = Properties::new().with(keys::GREAT_DELUGE_COOL_RATE_INV, 1000);
    let gd = GreatDelugeConfig::from_properties(&props).unwrap();
    assert!((gd.cool_rate - 0.999).abs() < 1e-12);
}

#[test]
fn test_great_deluge_rejects_bad_rates() {
    let props = Properties::new()
        .with(keys::GREAT_DELUGE_LOWER_BOUND_RATE, 1.2)
        .with(keys::GREAT_DELUGE_UPPER_BOUND_RATE, 1.05);
    assert!(GreatDelugeConfig::from_properties(&props).is_err());

    let props = Properties::new().with(keys::GREAT_DELUGE_COOL_RATE, 1.5);
    assert!(GreatDelugeConfig::from_properties(&props).is_err());
}

#[test]
fn test_neighbours_fall_back_to_hill_climber() {
    let props = Properties::new().with(keys::HILL_CLIMBER_NEIGHBOURS, "change@1");
    let gd = GreatDelugeConfig::from_properties(&props).unwrap();
    let sa = SimulatedAnnealingConfig::from_properties(&props).unwrap();
    assert_eq!(gd.neighbours.as_deref(), Some("change@1"));
    assert_eq!(sa.neighbours.as_deref(), Some("change@1"));
}

#[test]
fn test_simulated_annealing_derived_rates() {
    let sa = SimulatedAnnealingConfig::default();
    let expected = (1.0 / 0.95f64).powf(17.0);
    assert!((sa.effective_reheat_rate() - expected).abs() < 1e-9);
    assert_eq!(sa.effective_restore_best_length_coef(), 100.0);

    let props = Properties::new()
        .with(keys::SA_REHEAT_RATE, -1)
        .with(keys::SA_RESTORE_BEST_LENGTH_COEF, 3);
    let sa = SimulatedAnnealingConfig::from_properties(&props).unwrap();
    assert_eq!(sa.reheat_rate, None);
    assert_eq!(sa.effective_restore_best_length_coef(), 3.0);
}

#[test]
fn test_learning_method_out_of_range() {
    let props = Properties::new().with(keys::SEQUENCE_LEARNING_METHOD, 7);
    assert!(SequenceConfig::from_properties(&props).is_err());
}

#[test]
fn test_selection_type_codes() {
    assert!(SelectionType::from_code(0).uses_roulette());
    assert!(SelectionType::from_code(1).allows_repeats());
    let other = SelectionType::from_code(5);
    assert!(!other.allows_repeats());
    assert!(!other.uses_roulette());
}

#[test]
fn test_search_ranks_validated() {
    let props = Properties::new()
        .with(keys::SEQUENCE_HC, -1)
        .with(keys::SEQUENCE_GD, -1);
    assert!(SearchConfig::from_properties(&props).is_err());

    let props = Properties::new()
        .with(keys::SEQUENCE_HC, 1)
        .with(keys::SEQUENCE_GD, 1);
    assert!(SearchConfig::from_properties(&props).is_err());
}

#[test]
fn test_save_best_budget() {
    let mut general = GeneralConfig::default();
    assert!(general.allows_best(0));
    assert!(!general.allows_best(1));

    general.save_best_unassigned = -1;
    assert!(general.allows_best(50));
}

#[test]
fn test_termination() {
    let props = Properties::new()
        .with(keys::TERMINATION_MAX_ITERS, 10)
        .with(keys::TERMINATION_TIME_OUT, 1.5);
    let t = TerminationConfig::from_properties(&props).unwrap();
    assert_eq!(t.max_iters, Some(10));
    assert_eq!(t.timeout, Some(std::time::Duration::from_millis(1500)));
}

#[test]
fn test_merge() {
    let mut base = Properties::new().with("A", 1).with("B", 2);
    base.merge(&Properties::new().with("B", 3));
    assert_eq!(base.get("A"), Some("1"));
    assert_eq!(base.get("B"), Some("3"));
}
