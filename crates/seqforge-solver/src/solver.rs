//! The solver: a search thread driving one [`Solution`].
//!
//! [`SearchEngine`] holds everything the loop needs (strategy, termination,
//! comparator, listeners, extensions, random generator). [`Solver`] owns the
//! shared solution and moves the engine onto a worker thread for the
//! duration of a solve.
//!
//! Every iteration runs under the solution lock: selection, commit, update
//! and the conditional best save form one unit. Readers such as
//! [`Solver::best_value`] take the same lock and therefore always see a
//! consistent state between two iterations.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use seqforge_config::{GeneralConfig, Properties};
use seqforge_core::{Commit, Info, Model, Result, SeqForgeError};
use tracing::{debug, error, info, trace, warn};

use crate::comparator::{GeneralComparator, SolutionComparator};
use crate::event::{SolverEventSupport, SolverLifecycle, SolverListener};
use crate::extension::{Extension, ExtensionRegistry, Registration};
use crate::selector::SearchRegistry;
use crate::solution::Solution;
use crate::strategy::NeighbourSelection;
use crate::termination::{GeneralTermination, Termination};

/// Lifecycle state of a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverState {
    /// Never started.
    Idle,
    /// The search thread is running.
    Running,
    /// Stopped on request, or there was nothing to solve.
    Stopped,
    /// The termination condition was met.
    Done,
    /// A move generator, strategy or listener failed.
    Failed,
}

impl SolverState {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverState::Idle => "IDLE",
            SolverState::Running => "RUNNING",
            SolverState::Stopped => "STOPPED",
            SolverState::Done => "DONE",
            SolverState::Failed => "FAILED",
        }
    }

    /// Whether a solve has ended in this state.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            SolverState::Stopped | SolverState::Done | SolverState::Failed
        )
    }
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Shared<M: Model> {
    solution: Mutex<Solution<M>>,
    state: Mutex<SolverState>,
    stop: AtomicBool,
}

impl<M: Model> Shared<M> {
    fn solution(&self) -> MutexGuard<'_, Solution<M>> {
        self.solution.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> SolverState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SolverState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Interval between two progress events.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// How the loop ended.
enum Outcome {
    Stopped,
    Done,
}

/// Everything the search loop runs with, apart from the solution.
pub struct SearchEngine<M: Model> {
    selection: Box<dyn NeighbourSelection<M>>,
    termination: Box<dyn Termination<M>>,
    comparator: Box<dyn SolutionComparator<M>>,
    events: SolverEventSupport<M>,
    extensions: ExtensionRegistry<M>,
    rng: StdRng,
    save_best_unassigned: i64,
}

impl<M: Model> SearchEngine<M> {
    /// An engine around `selection` that never terminates on its own, uses
    /// [`GeneralComparator`] and an entropy-seeded generator.
    pub fn new(selection: Box<dyn NeighbourSelection<M>>) -> Self {
        Self {
            selection,
            termination: Box::new(GeneralTermination::new()),
            comparator: Box::new(GeneralComparator),
            events: SolverEventSupport::new(),
            extensions: ExtensionRegistry::new(),
            rng: StdRng::from_os_rng(),
            save_best_unassigned: GeneralConfig::default().save_best_unassigned,
        }
    }

    /// Builds the strategy named by `Search.Strategy` and reads the
    /// `General.*` and `Termination.*` keys.
    pub fn from_properties(props: &Properties, registry: &SearchRegistry<M>) -> Result<Self> {
        let general = GeneralConfig::from_properties(props)?;
        let mut engine = Self::new(registry.build_strategy(props)?)
            .with_termination(GeneralTermination::from_properties(props)?)
            .with_save_best_unassigned(general.save_best_unassigned);
        if let Some(seed) = general.seed {
            engine = engine.with_seed(seed);
        }
        Ok(engine)
    }

    pub fn with_termination(mut self, termination: impl Termination<M> + 'static) -> Self {
        self.termination = Box::new(termination);
        self
    }

    pub fn with_comparator(mut self, comparator: impl SolutionComparator<M> + 'static) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Most unassigned variables a best solution may have; negative means
    /// no limit.
    pub fn with_save_best_unassigned(mut self, limit: i64) -> Self {
        self.save_best_unassigned = limit;
        self
    }

    pub fn with_solver_listener(mut self, listener: Arc<dyn SolverListener<M>>) -> Self {
        self.events.add_solver_listener(listener);
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn SolverLifecycle<M>>) -> Self {
        self.events.add_lifecycle(lifecycle);
        self
    }

    pub fn register_extension(&mut self, extension: Box<dyn Extension<M>>) -> Registration {
        self.extensions.register(extension)
    }

    pub fn selection(&self) -> &dyn NeighbourSelection<M> {
        self.selection.as_ref()
    }

    pub fn extensions(&self) -> &ExtensionRegistry<M> {
        &self.extensions
    }

    fn allows_best(&self, solution: &Solution<M>) -> bool {
        self.save_best_unassigned < 0
            || self.save_best_unassigned as u64 >= solution.model().unassigned_count() as u64
    }

    fn maybe_save_best(&mut self, solution: &mut Solution<M>) {
        if !self.allows_best(solution) || !self.comparator.is_better_than_best(solution) {
            return;
        }
        let first_complete = solution.model().is_complete() && !solution.is_best_complete();
        solution.save_best();
        self.selection.best_saved(solution);
        if first_complete {
            info!(
                event = "complete_solution",
                iteration = solution.iteration(),
                time = solution.time(),
                total_value = solution.model().total_value(),
            );
        }
        debug!(
            event = "best_saved",
            iteration = solution.iteration(),
            total_value = solution.model().total_value(),
            unassigned = solution.model().unassigned_count(),
        );
    }

    /// Runs one solve on the calling thread and returns its final state.
    fn run(&mut self, shared: &Shared<M>) -> SolverState {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.search(shared, started)));
        let error = match result {
            Ok(Ok(outcome)) => {
                let solution = shared.solution();
                self.extensions.done(&solution);
                let state = match outcome {
                    Outcome::Stopped => {
                        self.events.fire_stop(&solution);
                        SolverState::Stopped
                    }
                    Outcome::Done => {
                        self.events.fire_finish(&solution);
                        SolverState::Done
                    }
                };
                info!(
                    event = "solve_end",
                    state = %state,
                    iterations = solution.total_iterations(),
                    time = started.elapsed().as_secs_f64(),
                    best_value = solution.best_value(),
                    best_iteration = solution.best_iteration(),
                );
                return state;
            }
            Ok(Err(err)) => err,
            Err(payload) => SeqForgeError::Internal(panic_message(payload.as_ref())),
        };
        let solution = shared.solution();
        error!(event = "solve_failed", error = %error, iteration = solution.iteration());
        self.events.fire_failure(&solution, &error);
        SolverState::Failed
    }

    fn search(&mut self, shared: &Shared<M>, started: Instant) -> Result<Outcome> {
        {
            let mut solution = shared.solution();
            self.selection.init(&solution)?;
            self.extensions.init(&solution)?;
            info!(
                event = "solve_start",
                strategy = self.selection.name(),
                variables = solution.model().variable_count(),
                unassigned = solution.model().unassigned_count(),
                total_value = solution.model().total_value(),
            );
            self.events.fire_start(&solution);
            self.maybe_save_best(&mut solution);
            if solution.model().variable_count() == 0 {
                warn!(event = "nothing_to_solve");
                shared.stop.store(true, Ordering::SeqCst);
            }
        }

        let mut last_progress = started;
        loop {
            if shared.stop.load(Ordering::SeqCst) {
                return Ok(Outcome::Stopped);
            }
            let mut solution = shared.solution();
            if self.termination.is_terminated(&solution) {
                return Ok(Outcome::Done);
            }
            if last_progress.elapsed() >= PROGRESS_INTERVAL {
                last_progress = Instant::now();
                let elapsed = started.elapsed().as_secs_f64();
                debug!(
                    event = "progress",
                    iterations = solution.total_iterations(),
                    speed = (solution.total_iterations() as f64 / elapsed) as u64,
                    total_value = solution.model().total_value(),
                    unassigned = solution.model().unassigned_count(),
                    best_value = solution.best_value(),
                );
            }

            let proposal = self
                .selection
                .select_neighbour(&mut solution, &mut self.rng)?
                .filter(|p| self.events.fire_neighbour_selected(solution.iteration(), p));

            let Some(proposal) = proposal else {
                trace!(event = "no_neighbour", iteration = solution.iteration());
                solution.update(started.elapsed().as_secs_f64());
                continue;
            };

            let iteration = solution.iteration();
            let commit = proposal.commit(solution.model_mut(), iteration);
            solution.update(started.elapsed().as_secs_f64());
            match commit {
                Commit::Applied(value) => {
                    trace!(event = "step", iteration = iteration, value = value);
                    self.events.fire_assigned(&solution, value);
                    self.extensions.after_assigned(&solution, value);
                    self.maybe_save_best(&mut solution);
                }
                Commit::Rejected(value) => {
                    trace!(event = "lazy_rejected", iteration = iteration, value = value);
                }
            }
        }
    }
}

impl<M: Model> fmt::Debug for SearchEngine<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("selection", &self.selection)
            .field("termination", &self.termination)
            .field("comparator", &self.comparator)
            .field("events", &self.events)
            .field("extensions", &self.extensions)
            .field("save_best_unassigned", &self.save_best_unassigned)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("search panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("search panicked: {}", msg)
    } else {
        "search panicked".to_string()
    }
}

/// Runs a [`SearchEngine`] over a [`Solution`] on a dedicated thread.
///
/// # Example
///
/// ```
/// use seqforge_config::Properties;
/// use seqforge_solver::{SearchRegistry, Solver, SolverState};
/// use seqforge_test::PenaltyModel;
///
/// let props = Properties::from_properties_str(
///     "HillClimber.Neighbours=change@1\nTermination.MaxIters=200\nGeneral.Seed=7",
/// )
/// .unwrap();
/// let model = PenaltyModel::new(vec![vec![5.0, 1.0], vec![2.0, 3.0]]);
///
/// let mut solver = Solver::from_properties(model, &props, &SearchRegistry::new()).unwrap();
/// assert_eq!(solver.solve().unwrap(), SolverState::Done);
/// assert_eq!(solver.best_value(), 3.0);
/// ```
pub struct Solver<M: Model> {
    shared: Arc<Shared<M>>,
    engine: Option<SearchEngine<M>>,
    handle: Option<JoinHandle<SearchEngine<M>>>,
}

impl<M: Model> Solver<M> {
    pub fn new(solution: Solution<M>, engine: SearchEngine<M>) -> Self {
        Self {
            shared: Arc::new(Shared {
                solution: Mutex::new(solution),
                state: Mutex::new(SolverState::Idle),
                stop: AtomicBool::new(false),
            }),
            engine: Some(engine),
            handle: None,
        }
    }

    /// A solver over a fresh solution of `model`, configured from `props`.
    pub fn from_properties(
        model: M,
        props: &Properties,
        registry: &SearchRegistry<M>,
    ) -> Result<Self> {
        let engine = SearchEngine::from_properties(props, registry)?;
        Ok(Self::new(Solution::new(model), engine))
    }

    pub fn state(&self) -> SolverState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == SolverState::Running
    }

    /// Starts the search thread.
    ///
    /// Fails if a search is already running.
    pub fn start(&mut self) -> Result<()> {
        let mut engine = self.engine.take().ok_or_else(|| {
            SeqForgeError::InvalidState("the solver is already running".to_string())
        })?;
        self.shared.stop.store(false, Ordering::SeqCst);
        self.shared.set_state(SolverState::Running);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("seqforge-solver".to_string())
            .spawn(move || {
                let state = engine.run(&shared);
                shared.set_state(state);
                engine
            });
        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.shared.set_state(SolverState::Failed);
                Err(SeqForgeError::Internal(format!(
                    "cannot spawn the solver thread: {}",
                    err
                )))
            }
        }
    }

    /// Asks the search thread to stop after its current iteration, and
    /// optionally waits for it.
    pub fn stop(&mut self, join: bool) -> Result<SolverState> {
        self.shared.stop.store(true, Ordering::SeqCst);
        if join {
            self.join()
        } else {
            Ok(self.state())
        }
    }

    /// Waits for the search thread and returns the final state.
    ///
    /// Returns the current state immediately when nothing is running.
    pub fn join(&mut self) -> Result<SolverState> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(engine) => self.engine = Some(engine),
                Err(payload) => {
                    self.shared.set_state(SolverState::Failed);
                    return Err(SeqForgeError::Internal(panic_message(payload.as_ref())));
                }
            }
        }
        Ok(self.state())
    }

    /// Starts the search and waits for it to end.
    pub fn solve(&mut self) -> Result<SolverState> {
        self.start()?;
        self.join()
    }

    /// Best value so far, 0 if nothing was saved.
    pub fn best_value(&self) -> f64 {
        self.shared.solution().best_value()
    }

    pub fn best_info(&self) -> Option<Info> {
        self.shared.solution().best_info().cloned()
    }

    /// Runs `f` with the solution locked.
    pub fn with_solution<R>(&self, f: impl FnOnce(&Solution<M>) -> R) -> R {
        f(&self.shared.solution())
    }

    /// Runs `f` with the solution locked for writing.
    ///
    /// Fails while the search is running.
    pub fn with_solution_mut<R>(&self, f: impl FnOnce(&mut Solution<M>) -> R) -> Result<R> {
        if self.is_running() {
            return Err(SeqForgeError::InvalidState(
                "the solution cannot be modified while solving".to_string(),
            ));
        }
        Ok(f(&mut self.shared.solution()))
    }

    /// The engine, available while no search is running.
    pub fn engine(&self) -> Option<&SearchEngine<M>> {
        self.engine.as_ref()
    }

    /// Waits for the search and hands back the solution.
    pub fn into_solution(mut self) -> Result<Solution<M>> {
        self.join()?;
        let shared = Arc::clone(&self.shared);
        drop(self);
        let shared = Arc::try_unwrap(shared).map_err(|_| {
            SeqForgeError::InvalidState("the solution is still shared".to_string())
        })?;
        Ok(shared
            .solution
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner))
    }
}

impl<M: Model> fmt::Debug for Solver<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("state", &self.state())
            .field("engine", &self.engine)
            .finish()
    }
}

impl<M: Model> Drop for Solver<M> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.shared.stop.store(true, Ordering::SeqCst);
            let _ = handle.join();
        }
    }
}
