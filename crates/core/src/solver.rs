//! Strategy selection, termination reasons, and configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rearrangement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Exhaustive pruned search over box-to-cell assignments.
    #[default]
    BranchBound,
    /// Stochastic population search over cell permutations.
    Genetic,
    /// Assignment-type mathematical program solved by an external backend.
    LinearProgram,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BranchBound => write!(f, "bb"),
            Self::Genetic => write!(f, "ga"),
            Self::LinearProgram => write!(f, "lp"),
        }
    }
}

/// Mathematical-programming backend for the linear program strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Engine {
    /// COIN-OR CBC.
    #[default]
    Cbc,
    /// HiGHS.
    Highs,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cbc => write!(f, "cbc"),
            Self::Highs => write!(f, "highs"),
        }
    }
}

/// Why a solver stopped.
///
/// `BudgetExhausted` is a normal outcome carrying the best-effort result,
/// not an error: a solver always returns some arrangement once invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Termination {
    /// The search space was exhausted; the result is provably the best
    /// reachable one.
    Optimal,
    /// A fitness at or below `min_objective` was found.
    TargetReached,
    /// The deadline, call limit, generation limit, or plateau limit was
    /// hit first; the result is best-effort.
    BudgetExhausted,
    /// The configured backend was missing or failed; the result is the
    /// fallback strategy's (or the unmodified input when no fallback is
    /// configured).
    SolverUnavailable,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::TargetReached => write!(f, "target-reached"),
            Self::BudgetExhausted => write!(f, "budget-exhausted"),
            Self::SolverUnavailable => write!(f, "solver-unavailable"),
        }
    }
}

/// Full configuration for one rearrangement invocation.
///
/// Parameter range validation is the configuration loader's concern; the
/// builders below clamp rates into [0, 1] but the engine otherwise assumes
/// validated input.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Which solver to dispatch. Exactly one runs per invocation.
    pub strategy: Strategy,

    /// Seed for the random source. `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Wall-clock limit for the whole invocation (`None` = unlimited).
    pub timeout: Option<Duration>,

    /// Emit per-iteration progress diagnostics. Observational only.
    pub verbose: bool,

    /// Best acceptable fitness; search may stop early once reached.
    pub min_objective: f64,

    /// Worst tolerable fitness; partial assignments bounded above this
    /// are rejected outright.
    pub max_objective: f64,

    // Branch & bound parameters
    /// Maximal number of node expansions per starting permutation.
    pub call_limit: u64,

    /// Unconstrained coordinate domain (trades pruning for freedom).
    pub organic: bool,

    // Genetic algorithm parameters
    /// Number of individuals to evolve.
    pub population_size: usize,

    /// Crossover rate (0.0 - 1.0).
    pub crossover_rate: f64,

    /// Mutation rate (0.0 - 1.0).
    pub mutation_rate: f64,

    /// Sample size in tournament selection.
    pub sample_size: usize,

    /// Maximal number of generations.
    pub max_generations: u32,

    /// Maximal number of consecutive generations without improvement.
    pub plateau: u32,

    // Linear program parameters
    /// Backend for the linear program strategy.
    pub engine: Engine,

    /// Fall back to branch & bound when the backend is unavailable.
    /// Off by default: substituting a strategy silently would change the
    /// requested semantics.
    pub lp_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            seed: None,
            timeout: None,
            verbose: false,
            min_objective: 0.0,
            max_objective: 15.0,
            call_limit: 10_000,
            organic: false,
            population_size: 1000,
            crossover_rate: 0.9,
            mutation_rate: 0.06,
            sample_size: 7,
            max_generations: 300,
            plateau: 30,
            engine: Engine::default(),
            lp_fallback: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rearrangement strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables per-iteration progress diagnostics.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the best acceptable fitness.
    pub fn with_min_objective(mut self, objective: f64) -> Self {
        self.min_objective = objective.max(0.0);
        self
    }

    /// Sets the worst tolerable fitness.
    pub fn with_max_objective(mut self, objective: f64) -> Self {
        self.max_objective = objective.max(0.0);
        self
    }

    /// Sets the expansion limit per starting permutation.
    pub fn with_call_limit(mut self, limit: u64) -> Self {
        self.call_limit = limit.max(1);
        self
    }

    /// Enables the unconstrained coordinate domain.
    pub fn with_organic(mut self, organic: bool) -> Self {
        self.organic = organic;
        self
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament sample size.
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size.max(1);
        self
    }

    /// Sets the generation limit.
    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the plateau limit.
    pub fn with_plateau(mut self, plateau: u32) -> Self {
        self.plateau = plateau.max(1);
        self
    }

    /// Sets the mathematical-programming backend.
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Enables the branch & bound fallback for an unavailable backend.
    pub fn with_lp_fallback(mut self, fallback: bool) -> Self {
        self.lp_fallback = fallback;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.strategy, Strategy::BranchBound);
        assert_eq!(config.call_limit, 10_000);
        assert_eq!(config.min_objective, 0.0);
        assert_eq!(config.max_objective, 15.0);
        assert_eq!(config.population_size, 1000);
        assert_eq!(config.crossover_rate, 0.9);
        assert_eq!(config.mutation_rate, 0.06);
        assert_eq!(config.sample_size, 7);
        assert_eq!(config.max_generations, 300);
        assert_eq!(config.plateau, 30);
        assert_eq!(config.engine, Engine::Cbc);
        assert!(!config.organic);
        assert!(!config.lp_fallback);
        assert!(config.seed.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_config_builder_clamps() {
        let config = Config::new()
            .with_crossover_rate(1.4)
            .with_mutation_rate(-0.1)
            .with_population_size(1)
            .with_sample_size(0)
            .with_call_limit(0);

        assert_eq!(config.crossover_rate, 1.0);
        assert_eq!(config.mutation_rate, 0.0);
        assert_eq!(config.population_size, 2);
        assert_eq!(config.sample_size, 1);
        assert_eq!(config.call_limit, 1);
    }

    #[test]
    fn test_termination_display() {
        assert_eq!(Termination::Optimal.to_string(), "optimal");
        assert_eq!(Termination::TargetReached.to_string(), "target-reached");
        assert_eq!(Termination::BudgetExhausted.to_string(), "budget-exhausted");
        assert_eq!(
            Termination::SolverUnavailable.to_string(),
            "solver-unavailable"
        );
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::BranchBound.to_string(), "bb");
        assert_eq!(Strategy::Genetic.to_string(), "ga");
        assert_eq!(Strategy::LinearProgram.to_string(), "lp");
    }
}
