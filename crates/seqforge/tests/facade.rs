use std::io::Write;

use seqforge::prelude::*;
use seqforge_test::{PenaltyModel, TimetableModel};

#[test]
fn test_solve_timetable() {
    let props = Properties::new()
        .with(keys::HILL_CLIMBER_NEIGHBOURS, "change@2;swap@1")
        .with(keys::TERMINATION_STOP_WHEN_COMPLETE, true)
        .with(keys::TERMINATION_MAX_ITERS, 50_000)
        .with(keys::CONSTRUCTION_CONFLICT_WEIGHT, 100)
        .with(keys::GENERAL_SEED, 5);
    let solution = seqforge::solve(TimetableModel::generate(6, 5, 2, 2, 3), &props).unwrap();
    assert!(solution.is_best_complete());
}

#[test]
fn test_solve_rejects_bad_config() {
    let props = Properties::new()
        .with(keys::HILL_CLIMBER_NEIGHBOURS, "teleport")
        .with(keys::TERMINATION_MAX_ITERS, 10);
    let err = seqforge::solve(PenaltyModel::new(vec![vec![1.0]]), &props).unwrap_err();
    assert!(matches!(err, SeqForgeError::Config(_)));
}

#[test]
fn test_solve_file() {
    let path = std::env::temp_dir().join(format!("seqforge-facade-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "[HillClimber]\nNeighbours = \"change\"\n\n[Termination]\nMaxIters = 100\n\n[General]\nSeed = 2"
    )
    .unwrap();

    let solution =
        seqforge::solve_file(PenaltyModel::new(vec![vec![4.0, 2.0, 3.0]]), &path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(solution.best_value(), 2.0);
    assert_eq!(solution.total_iterations(), 100);
}
