//! Typed views over [`Properties`] for every part of the search.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::keys;
use crate::{ConfigError, Properties};

/// Settings shared by the whole solve.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GeneralConfig {
    /// Random seed; entropy-seeded when absent.
    pub seed: Option<u64>,

    /// A solution is only saved as best when it has at most this many
    /// unassigned variables. Negative disables the limit.
    pub save_best_unassigned: i64,

    /// Great deluge cools only on accepted improving moves.
    pub cool_in_accept: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: None,
            save_best_unassigned: 0,
            cool_in_accept: false,
        }
    }
}

impl GeneralConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            seed: props.get_opt_u64(keys::GENERAL_SEED)?,
            save_best_unassigned: props
                .get_i64(keys::GENERAL_SAVE_BEST_UNASSIGNED, defaults.save_best_unassigned)?,
            cool_in_accept: props.get_bool(keys::GENERAL_COOL_IN_ACCEPT, defaults.cool_in_accept)?,
        })
    }

    /// Whether a solution with `unassigned` open variables may become best.
    pub fn allows_best(&self, unassigned: usize) -> bool {
        self.save_best_unassigned < 0 || self.save_best_unassigned as u64 >= unassigned as u64
    }
}

/// How the heuristic sequence picks the next selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    /// Code 0: roulette wheel over selectors not yet in the chain.
    RestrictedRoulette,
    /// Code 1: tournament over all selectors.
    Unrestricted,
    /// Any other code: tournament over selectors not yet in the chain.
    RestrictedTournament,
}

impl SelectionType {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => SelectionType::RestrictedRoulette,
            1 => SelectionType::Unrestricted,
            _ => SelectionType::RestrictedTournament,
        }
    }

    /// Whether selectors already in the chain stay admissible.
    pub fn allows_repeats(self) -> bool {
        self == SelectionType::Unrestricted
    }

    pub fn uses_roulette(self) -> bool {
        self == SelectionType::RestrictedRoulette
    }
}

/// Score learning rule applied after an accepted non-worsening move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMethod {
    /// Code 0: every update adds 1.
    Count,
    /// Code 1: updates add `floor(exp(elapsed / 30))`.
    TimeWeighted,
    /// Code 2: updates add the improvement achieved.
    Delta,
}

impl LearningMethod {
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(LearningMethod::Count),
            1 => Ok(LearningMethod::TimeWeighted),
            2 => Ok(LearningMethod::Delta),
            other => Err(ConfigError::Invalid(format!(
                "{} must be 0, 1 or 2, got {}",
                keys::SEQUENCE_LEARNING_METHOD,
                other
            ))),
        }
    }
}

/// Heuristic sequence settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SequenceConfig {
    /// When false, every selection ends the chain.
    pub sequence: bool,
    pub selection_type: SelectionType,
    pub learning_method: LearningMethod,
    /// Consecutive null or rejected candidates before the chain is dropped.
    /// Values below 1 drop it after every failure.
    pub max_sequence_reset_iter: i64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            sequence: true,
            selection_type: SelectionType::Unrestricted,
            learning_method: LearningMethod::Delta,
            max_sequence_reset_iter: -1,
        }
    }
}

impl SequenceConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            sequence: props.get_bool(keys::SEQUENCE_SEQUENCE, defaults.sequence)?,
            selection_type: SelectionType::from_code(
                props.get_i64(keys::SEQUENCE_SELECTION_TYPE, 1)?,
            ),
            learning_method: LearningMethod::from_code(
                props.get_i64(keys::SEQUENCE_LEARNING_METHOD, 2)?,
            )?,
            max_sequence_reset_iter: props
                .get_i64(keys::SEQUENCE_MAX_RESET_ITER, defaults.max_sequence_reset_iter)?,
        })
    }

    /// Number of consecutive failures after which the chain is reset.
    pub fn reset_interval(&self) -> u64 {
        self.max_sequence_reset_iter.max(1) as u64
    }
}

/// Hill climbing settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HillClimberConfig {
    /// Iterations without a new best before the strategy gives up.
    pub max_idle: u64,
    /// Neighbour selector specification, e.g. `change@1;swap@0.5`.
    pub neighbours: Option<String>,
    /// Pick pooled selectors uniformly instead of by points.
    pub random: bool,
    /// Update selector points after each use.
    pub update: bool,
}

impl Default for HillClimberConfig {
    fn default() -> Self {
        Self {
            max_idle: 100_000,
            neighbours: None,
            random: false,
            update: false,
        }
    }
}

impl HillClimberConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_idle: props.get_u64(keys::HILL_CLIMBER_MAX_IDLE, defaults.max_idle)?,
            neighbours: props.get(keys::HILL_CLIMBER_NEIGHBOURS).map(str::to_string),
            random: props.get_bool(keys::HILL_CLIMBER_RANDOM, defaults.random)?,
            update: props.get_bool(keys::HILL_CLIMBER_UPDATE, defaults.update)?,
        })
    }
}

/// Great deluge settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GreatDelugeConfig {
    pub cool_rate: f64,
    pub upper_bound_rate: f64,
    pub lower_bound_rate: f64,
    /// Falls back to the hill climber's selectors when absent.
    pub neighbours: Option<String>,
}

impl Default for GreatDelugeConfig {
    fn default() -> Self {
        Self {
            cool_rate: 0.999_999_5,
            upper_bound_rate: 1.05,
            lower_bound_rate: 0.97,
            neighbours: None,
        }
    }
}

impl GreatDelugeConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cool_rate = match props.get_opt_f64(keys::GREAT_DELUGE_COOL_RATE_INV)? {
            Some(inv) if inv >= 1.0 => 1.0 - 1.0 / inv,
            Some(inv) => {
                return Err(ConfigError::Invalid(format!(
                    "{} must be at least 1, got {}",
                    keys::GREAT_DELUGE_COOL_RATE_INV,
                    inv
                )))
            }
            None => props.get_f64(keys::GREAT_DELUGE_COOL_RATE, defaults.cool_rate)?,
        };
        let config = Self {
            cool_rate,
            upper_bound_rate: props
                .get_f64(keys::GREAT_DELUGE_UPPER_BOUND_RATE, defaults.upper_bound_rate)?,
            lower_bound_rate: props
                .get_f64(keys::GREAT_DELUGE_LOWER_BOUND_RATE, defaults.lower_bound_rate)?,
            neighbours: props
                .get(keys::GREAT_DELUGE_NEIGHBOURS)
                .or_else(|| props.get(keys::HILL_CLIMBER_NEIGHBOURS))
                .map(str::to_string),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cool_rate > 0.0 && self.cool_rate <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "{} must be in (0, 1], got {}",
                keys::GREAT_DELUGE_COOL_RATE,
                self.cool_rate
            )));
        }
        if !(self.lower_bound_rate > 0.0 && self.upper_bound_rate >= self.lower_bound_rate) {
            return Err(ConfigError::Invalid(format!(
                "bound rates must satisfy 0 < lower <= upper, got lower {} upper {}",
                self.lower_bound_rate, self.upper_bound_rate
            )));
        }
        Ok(())
    }
}

/// Simulated annealing settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SimulatedAnnealingConfig {
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    /// Derived from the cooling rate when absent.
    pub reheat_rate: Option<f64>,
    pub temp_length_coef: f64,
    pub reheat_length_coef: f64,
    /// Derived from the reheat coefficient when absent.
    pub restore_best_length_coef: Option<f64>,
    /// Use `1 / (1 + exp(delta / T))` instead of `exp(-delta / T)`.
    pub stochastic_hc: bool,
    /// Judge the move delta rather than the distance to the best value.
    pub relative_acceptance: bool,
    pub neighbours: Option<String>,
}

impl Default for SimulatedAnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1.5,
            cooling_rate: 0.95,
            reheat_rate: None,
            temp_length_coef: 10.0,
            reheat_length_coef: 10.0,
            restore_best_length_coef: None,
            stochastic_hc: false,
            relative_acceptance: true,
            neighbours: None,
        }
    }
}

impl SimulatedAnnealingConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        // Negative rates and coefficients mean "derive".
        let positive = |v: Option<f64>| v.filter(|v| *v >= 0.0);
        let config = Self {
            initial_temperature: props
                .get_f64(keys::SA_INITIAL_TEMPERATURE, defaults.initial_temperature)?,
            cooling_rate: props.get_f64(keys::SA_COOLING_RATE, defaults.cooling_rate)?,
            reheat_rate: positive(props.get_opt_f64(keys::SA_REHEAT_RATE)?),
            temp_length_coef: props.get_f64(keys::SA_TEMP_LENGTH_COEF, defaults.temp_length_coef)?,
            reheat_length_coef: props
                .get_f64(keys::SA_REHEAT_LENGTH_COEF, defaults.reheat_length_coef)?,
            restore_best_length_coef: positive(
                props.get_opt_f64(keys::SA_RESTORE_BEST_LENGTH_COEF)?,
            ),
            stochastic_hc: props.get_bool(keys::SA_STOCHASTIC_HC, defaults.stochastic_hc)?,
            relative_acceptance: props
                .get_bool(keys::SA_RELATIVE_ACCEPTANCE, defaults.relative_acceptance)?,
            neighbours: props
                .get(keys::SA_NEIGHBOURS)
                .or_else(|| props.get(keys::HILL_CLIMBER_NEIGHBOURS))
                .map(str::to_string),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_temperature > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "{} must be positive, got {}",
                keys::SA_INITIAL_TEMPERATURE,
                self.initial_temperature
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "{} must be in (0, 1), got {}",
                keys::SA_COOLING_RATE,
                self.cooling_rate
            )));
        }
        if self.temp_length_coef < 0.0 || self.reheat_length_coef < 0.0 {
            return Err(ConfigError::Invalid(
                "simulated annealing length coefficients must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// `(1 / cooling_rate) ^ (reheat_length_coef * 1.7)` unless configured.
    pub fn effective_reheat_rate(&self) -> f64 {
        self.reheat_rate
            .unwrap_or_else(|| (1.0 / self.cooling_rate).powf(self.reheat_length_coef * 1.7))
    }

    /// `reheat_length_coef ^ 2` unless configured.
    pub fn effective_restore_best_length_coef(&self) -> f64 {
        self.restore_best_length_coef
            .unwrap_or(self.reheat_length_coef * self.reheat_length_coef)
    }
}

/// Top-level search settings: strategy choice and phase ordering.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SearchConfig {
    /// Registry key of the top-level neighbour selection.
    pub strategy: String,
    /// Rank of hill climbing in the rotation; negative disables it.
    pub hc_rank: i64,
    pub gd_rank: i64,
    pub sa_rank: i64,
    /// Construction iterations without progress before a restart.
    pub restart_limit: u64,
    /// Great deluge and simulated annealing yield to the orchestrator on reheat.
    pub next_heuristics_on_reheat: bool,
    /// After such a yield, great deluge recomputes its bound.
    pub alter_bound_on_reheat: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: "orchestrator".to_string(),
            hc_rank: 0,
            gd_rank: 1,
            sa_rank: -1,
            restart_limit: 200,
            next_heuristics_on_reheat: false,
            alter_bound_on_reheat: false,
        }
    }
}

impl SearchConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            strategy: props.get_string(keys::SEARCH_STRATEGY, &defaults.strategy),
            hc_rank: props.get_i64(keys::SEQUENCE_HC, defaults.hc_rank)?,
            gd_rank: props.get_i64(keys::SEQUENCE_GD, defaults.gd_rank)?,
            sa_rank: props.get_i64(keys::SEQUENCE_SA, defaults.sa_rank)?,
            restart_limit: props.get_u64(keys::SEARCH_RESTART_LIMIT, defaults.restart_limit)?,
            next_heuristics_on_reheat: props
                .get_bool(keys::SEARCH_NEXT_ON_REHEAT, defaults.next_heuristics_on_reheat)?,
            alter_bound_on_reheat: props.get_bool(
                keys::SEARCH_NEXT_ON_REHEAT_ALTER_BOUND,
                defaults.alter_bound_on_reheat,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let enabled: Vec<i64> = [self.hc_rank, self.gd_rank, self.sa_rank]
            .into_iter()
            .filter(|rank| *rank >= 0)
            .collect();
        if enabled.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "at least one of {}, {}, {} must be non-negative",
                keys::SEQUENCE_HC,
                keys::SEQUENCE_GD,
                keys::SEQUENCE_SA
            )));
        }
        for (i, rank) in enabled.iter().enumerate() {
            if enabled[i + 1..].contains(rank) {
                return Err(ConfigError::Invalid(format!(
                    "acceptance strategies share rank {}",
                    rank
                )));
            }
        }
        if self.restart_limit == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be positive",
                keys::SEARCH_RESTART_LIMIT
            )));
        }
        Ok(())
    }
}

/// Construction phase settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConstructionConfig {
    /// Length of the tabu list of recent (variable, value) pairs.
    pub tabu_size: usize,
    /// Weight of each displaced variable.
    pub conflict_weight: f64,
    /// Weight of the penalty delta.
    pub value_weight: f64,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            tabu_size: 20,
            conflict_weight: 1.0,
            value_weight: 1.0,
        }
    }
}

impl ConstructionConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            tabu_size: props.get_u64(keys::CONSTRUCTION_TABU_SIZE, defaults.tabu_size as u64)?
                as usize,
            conflict_weight: props
                .get_f64(keys::CONSTRUCTION_CONFLICT_WEIGHT, defaults.conflict_weight)?,
            value_weight: props.get_f64(keys::CONSTRUCTION_VALUE_WEIGHT, defaults.value_weight)?,
        })
    }
}

/// Termination settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TerminationConfig {
    /// Stop as soon as the best solution is complete.
    pub stop_when_complete: bool,
    pub max_iters: Option<u64>,
    pub timeout: Option<Duration>,
}

impl TerminationConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let max_iters = props.get_i64(keys::TERMINATION_MAX_ITERS, -1)?;
        let timeout = props.get_f64(keys::TERMINATION_TIME_OUT, -1.0)?;
        Ok(Self {
            stop_when_complete: props.get_bool(keys::TERMINATION_STOP_WHEN_COMPLETE, false)?,
            max_iters: (max_iters >= 0).then_some(max_iters as u64),
            timeout: (timeout >= 0.0).then(|| Duration::from_secs_f64(timeout)),
        })
    }
}

/// All typed sections, read from one property set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SolverConfig {
    pub general: GeneralConfig,
    pub sequence: SequenceConfig,
    pub hill_climber: HillClimberConfig,
    pub great_deluge: GreatDelugeConfig,
    pub simulated_annealing: SimulatedAnnealingConfig,
    pub search: SearchConfig,
    pub construction: ConstructionConfig,
    pub termination: TerminationConfig,
}

impl SolverConfig {
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        Ok(Self {
            general: GeneralConfig::from_properties(props)?,
            sequence: SequenceConfig::from_properties(props)?,
            hill_climber: HillClimberConfig::from_properties(props)?,
            great_deluge: GreatDelugeConfig::from_properties(props)?,
            simulated_annealing: SimulatedAnnealingConfig::from_properties(props)?,
            search: SearchConfig::from_properties(props)?,
            construction: ConstructionConfig::from_properties(props)?,
            termination: TerminationConfig::from_properties(props)?,
        })
    }
}
