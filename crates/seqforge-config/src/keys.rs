//! Documented property keys.

pub const GENERAL_SEED: &str = "General.Seed";
pub const GENERAL_SAVE_BEST_UNASSIGNED: &str = "General.SaveBestUnassigned";
pub const GENERAL_COOL_IN_ACCEPT: &str = "General.CoolInAccept";

pub const SEQUENCE_SEQUENCE: &str = "Sequence.Sequence";
pub const SEQUENCE_SELECTION_TYPE: &str = "Sequence.SelectionType";
pub const SEQUENCE_LEARNING_METHOD: &str = "Sequence.LearningMethod";
pub const SEQUENCE_MAX_RESET_ITER: &str = "Sequence.MaxSequenceResetIter";
pub const SEQUENCE_HC: &str = "Sequence.HC";
pub const SEQUENCE_GD: &str = "Sequence.GD";
pub const SEQUENCE_SA: &str = "Sequence.SA";

pub const HILL_CLIMBER_MAX_IDLE: &str = "HillClimber.MaxIdle";
pub const HILL_CLIMBER_NEIGHBOURS: &str = "HillClimber.Neighbours";
pub const HILL_CLIMBER_RANDOM: &str = "HillClimber.Random";
pub const HILL_CLIMBER_UPDATE: &str = "HillClimber.Update";

pub const POOL_NEIGHBOURS: &str = "Pool.Neighbours";

pub const GREAT_DELUGE_COOL_RATE: &str = "GreatDeluge.CoolRate";
pub const GREAT_DELUGE_COOL_RATE_INV: &str = "GreatDeluge.CoolRateInv";
pub const GREAT_DELUGE_UPPER_BOUND_RATE: &str = "GreatDeluge.UpperBoundRate";
pub const GREAT_DELUGE_LOWER_BOUND_RATE: &str = "GreatDeluge.LowerBoundRate";
pub const GREAT_DELUGE_NEIGHBOURS: &str = "GreatDeluge.Neighbours";

pub const SA_INITIAL_TEMPERATURE: &str = "SimulatedAnnealing.InitialTemperature";
pub const SA_COOLING_RATE: &str = "SimulatedAnnealing.CoolingRate";
pub const SA_REHEAT_RATE: &str = "SimulatedAnnealing.ReheatRate";
pub const SA_TEMP_LENGTH_COEF: &str = "SimulatedAnnealing.TempLengthCoef";
pub const SA_REHEAT_LENGTH_COEF: &str = "SimulatedAnnealing.ReheatLengthCoef";
pub const SA_RESTORE_BEST_LENGTH_COEF: &str = "SimulatedAnnealing.RestoreBestLengthCoef";
pub const SA_STOCHASTIC_HC: &str = "SimulatedAnnealing.StochasticHC";
pub const SA_RELATIVE_ACCEPTANCE: &str = "SimulatedAnnealing.RelativeAcceptance";
pub const SA_NEIGHBOURS: &str = "SimulatedAnnealing.Neighbours";

pub const SEARCH_STRATEGY: &str = "Search.Strategy";
pub const SEARCH_RESTART_LIMIT: &str = "Search.RestartLimit";
pub const SEARCH_NEXT_ON_REHEAT: &str = "Search.NextHeuristicsOnReheat";
pub const SEARCH_NEXT_ON_REHEAT_ALTER_BOUND: &str = "Search.NextHeuristicsOnReheat.AlterBound";

pub const CONSTRUCTION_TABU_SIZE: &str = "Construction.TabuSize";
pub const CONSTRUCTION_CONFLICT_WEIGHT: &str = "Construction.ConflictWeight";
pub const CONSTRUCTION_VALUE_WEIGHT: &str = "Construction.ValueWeight";

pub const TERMINATION_STOP_WHEN_COMPLETE: &str = "Termination.StopWhenComplete";
pub const TERMINATION_MAX_ITERS: &str = "Termination.MaxIters";
pub const TERMINATION_TIME_OUT: &str = "Termination.TimeOut";
