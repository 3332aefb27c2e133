//! End-to-end solves on the timetabling fixture.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use seqforge_config::{keys, Properties};
use seqforge_core::{Candidate, Model, Result, SeqForgeError};
use seqforge_solver::{
    Extension, MoveSelector, Proposal, SearchEngine, SearchRegistry, Solution, Solver,
    SolverLifecycle, SolverListener, SolverState,
};
use seqforge_test::{PenaltyModel, TimetableModel};

fn timetable() -> TimetableModel {
    TimetableModel::generate(8, 6, 3, 2, 11)
}

fn props(pairs: &[(&str, &str)]) -> Properties {
    let mut props = Properties::new()
        .with(keys::HILL_CLIMBER_NEIGHBOURS, "change@1;swap@1")
        .with(keys::CONSTRUCTION_CONFLICT_WEIGHT, 100)
        .with(keys::GENERAL_SEED, 3);
    for (key, value) in pairs {
        props.set(*key, value);
    }
    props
}

fn solver<M: Model>(model: M, props: &Properties) -> Solver<M> {
    Solver::from_properties(model, props, &SearchRegistry::new()).unwrap()
}

#[derive(Debug, Default)]
struct Recorder {
    starts: AtomicUsize,
    assigned: AtomicUsize,
    stops: AtomicUsize,
    finishes: AtomicUsize,
    failures: AtomicUsize,
}

impl<M: Model> SolverLifecycle<M> for Recorder {
    fn on_start(&self, _solution: &Solution<M>) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_assigned(&self, _solution: &Solution<M>, _value: f64) {
        self.assigned.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stop(&self, _solution: &Solution<M>) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn on_finish(&self, _solution: &Solution<M>) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failure(&self, _solution: &Solution<M>, _error: &SeqForgeError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[test]
fn test_orchestrator_finds_complete_timetable() {
    let props = props(&[(keys::TERMINATION_MAX_ITERS, "2000")]);
    let mut solver = solver(timetable(), &props);

    assert_eq!(solver.solve().unwrap(), SolverState::Done);
    assert!(solver.best_info().is_some());

    let solution = solver.into_solution().unwrap();
    assert!(solution.is_best_complete());
    assert_eq!(solution.total_iterations(), 2000);
    assert!(solution.best_iteration() >= 0);
}

#[test]
fn test_stop_when_complete() {
    let props = props(&[
        (keys::TERMINATION_STOP_WHEN_COMPLETE, "true"),
        (keys::TERMINATION_MAX_ITERS, "100000"),
    ]);
    let mut solver = solver(timetable(), &props);

    assert_eq!(solver.solve().unwrap(), SolverState::Done);
    solver.with_solution(|solution| {
        assert!(solution.is_best_complete());
        assert!(solution.total_iterations() < 100_000);
    });
}

#[test]
fn test_every_strategy_keeps_a_best_no_worse_than_the_start() {
    for strategy in [
        "orchestrator",
        "group",
        "hill_climbing",
        "great_deluge",
        "simulated_annealing",
    ] {
        let mut model = timetable();
        model.assign_first_fit();
        let start = model.total_value();
        let props = props(&[
            (keys::SEARCH_STRATEGY, strategy),
            (keys::SEQUENCE_SA, "2"),
            (keys::TERMINATION_MAX_ITERS, "300"),
        ]);
        let mut solver = solver(model, &props);

        assert_eq!(solver.solve().unwrap(), SolverState::Done, "{strategy}");
        assert!(solver.best_value() <= start, "{strategy}");
        solver.with_solution(|solution| {
            assert!(solution.is_best_complete(), "{strategy}");
        });
    }
}

#[test]
fn test_same_seed_same_result() {
    let props = props(&[(keys::TERMINATION_MAX_ITERS, "500")]);
    let run = || {
        let mut solver = solver(timetable(), &props);
        solver.solve().unwrap();
        solver.with_solution(|solution| (solution.best_value(), solution.best_iteration()))
    };
    assert_eq!(run(), run());
}

#[test]
fn test_stop_running_solver() {
    let recorder = Arc::new(Recorder::default());
    let engine = SearchEngine::from_properties(&props(&[]), &SearchRegistry::new())
        .unwrap()
        .with_lifecycle(recorder.clone());
    let mut solver = Solver::new(Solution::new(timetable()), engine);

    solver.start().unwrap();
    assert!(solver.start().is_err());
    thread::sleep(Duration::from_millis(50));
    assert!(solver.with_solution_mut(|_| ()).is_err());

    assert_eq!(solver.stop(true).unwrap(), SolverState::Stopped);
    assert!(!solver.is_running());
    assert!(solver.engine().is_some());
    assert_eq!(count(&recorder.starts), 1);
    assert_eq!(count(&recorder.stops), 1);
    assert_eq!(count(&recorder.finishes), 0);
    assert!(count(&recorder.assigned) > 0);
    solver.with_solution(|solution| assert!(solution.has_best()));
}

#[test]
fn test_nothing_to_solve() {
    let recorder = Arc::new(Recorder::default());
    let engine = SearchEngine::from_properties(&props(&[]), &SearchRegistry::new())
        .unwrap()
        .with_lifecycle(recorder.clone());
    let mut solver = Solver::new(Solution::new(PenaltyModel::new(Vec::new())), engine);

    assert_eq!(solver.solve().unwrap(), SolverState::Stopped);
    assert_eq!(count(&recorder.stops), 1);
    assert_eq!(solver.best_value(), 0.0);
}

#[derive(Debug)]
struct Veto;

impl<M: Model> SolverListener<M> for Veto {
    fn neighbour_selected(&self, _iteration: u64, _proposal: &Proposal<M>) -> bool {
        false
    }
}

#[test]
fn test_vetoed_proposals_are_never_committed() {
    let recorder = Arc::new(Recorder::default());
    let props = props(&[(keys::TERMINATION_MAX_ITERS, "50")]);
    let engine = SearchEngine::from_properties(&props, &SearchRegistry::new())
        .unwrap()
        .with_solver_listener(Arc::new(Veto))
        .with_lifecycle(recorder.clone());
    let mut solver = Solver::new(Solution::new(timetable()), engine);

    assert_eq!(solver.solve().unwrap(), SolverState::Done);
    assert_eq!(count(&recorder.assigned), 0);
    assert_eq!(count(&recorder.finishes), 1);
    solver.with_solution(|solution| {
        assert_eq!(solution.model().unassigned_count(), 8);
        assert_eq!(solution.total_iterations(), 50);
    });
}

#[derive(Debug)]
struct Failing {
    panic: bool,
}

impl<M: Model> MoveSelector<M> for Failing {
    fn select_neighbour(
        &mut self,
        _solution: &Solution<M>,
        _rng: &mut StdRng,
    ) -> Result<Option<Candidate<M>>> {
        if self.panic {
            panic!("generator exploded");
        }
        Err(SeqForgeError::Internal("generator failed".to_string()))
    }
}

#[test]
fn test_failure_keeps_best_queryable() {
    for panic in [false, true] {
        let mut registry = SearchRegistry::<TimetableModel>::new();
        registry.register_selector("failing", move |_, _| Ok(Box::new(Failing { panic })));
        let props = props(&[
            (keys::HILL_CLIMBER_NEIGHBOURS, "failing"),
            (keys::SEQUENCE_GD, "-1"),
            (keys::TERMINATION_MAX_ITERS, "1000"),
        ]);
        let recorder = Arc::new(Recorder::default());
        let engine = SearchEngine::from_properties(&props, &registry)
            .unwrap()
            .with_lifecycle(recorder.clone());
        let mut solver = Solver::new(Solution::new(timetable()), engine);

        assert_eq!(solver.solve().unwrap(), SolverState::Failed);
        assert_eq!(count(&recorder.failures), 1);
        // Construction completed before the generator was first asked.
        solver.with_solution(|solution| {
            assert!(solution.is_best_complete());
            assert!(solution.best_info().is_some());
        });
    }
}

#[derive(Debug)]
struct Counting {
    assigned: Arc<AtomicUsize>,
    done: Arc<AtomicUsize>,
}

impl<M: Model> Extension<M> for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn uses_variable_extra(&self) -> bool {
        true
    }

    fn after_assigned(&mut self, _solution: &Solution<M>, _value: f64) {
        self.assigned.fetch_add(1, Ordering::SeqCst);
    }

    fn done(&mut self, _solution: &Solution<M>) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_extensions_see_every_commit() {
    let assigned = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicUsize::new(0));
    let recorder = Arc::new(Recorder::default());
    let props = props(&[(keys::TERMINATION_MAX_ITERS, "300")]);
    let mut engine = SearchEngine::from_properties(&props, &SearchRegistry::new())
        .unwrap()
        .with_lifecycle(recorder.clone());

    let counting = |assigned: &Arc<AtomicUsize>, done: &Arc<AtomicUsize>| {
        Box::new(Counting {
            assigned: Arc::clone(assigned),
            done: Arc::clone(done),
        })
    };
    assert!(engine
        .register_extension(counting(&assigned, &done))
        .is_registered());
    assert!(!engine
        .register_extension(counting(&assigned, &done))
        .is_registered());

    let mut solver = Solver::new(Solution::new(timetable()), engine);
    assert_eq!(solver.solve().unwrap(), SolverState::Done);
    assert_eq!(count(&assigned), count(&recorder.assigned));
    assert_eq!(count(&done), 1);
    assert_eq!(solver.engine().unwrap().extensions().len(), 1);
}

#[test]
fn test_great_deluge_terminates_at_zero_penalty() {
    let model = PenaltyModel::assigned(
        vec![vec![0.0, 5.0], vec![0.0, 3.0]],
        vec![Some(0), Some(0)],
    );
    let props = props(&[
        (keys::SEARCH_STRATEGY, "great_deluge"),
        (keys::HILL_CLIMBER_NEIGHBOURS, "change"),
        (keys::TERMINATION_MAX_ITERS, "20"),
    ]);
    let mut solver = solver(model, &props);

    assert_eq!(solver.solve().unwrap(), SolverState::Done);
    assert_eq!(solver.best_value(), 0.0);
    solver.with_solution(|solution| {
        assert_eq!(solution.total_iterations(), 20);
        assert_eq!(solution.model().total_value(), 0.0);
    });
}
