//! Rearrangement orchestrator.
//!
//! Builds the budget and the random source, dispatches to exactly one
//! solver per invocation, and hands the best arrangement back together
//! with its fitness and the termination reason.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use er_arrange_core::{Config, Error, Result, SearchBudget, Strategy, Termination};

use crate::bb::run_branch_bound;
use crate::ga_grid::run_genetic;
use crate::lp::run_linear_program;
use crate::model::{Arrangement, Fitness, LayoutModel};

/// Outcome of one rearrangement invocation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArrangeResult {
    /// The best arrangement found, never worse than the input.
    pub arrangement: Arrangement,
    /// Fitness of that arrangement.
    pub fitness: Fitness,
    /// Why the solver stopped.
    pub termination: Termination,
    /// Generations completed (genetic algorithm only).
    pub generations: Option<u32>,
    /// Node expansions consumed (branch & bound only).
    pub nodes_explored: Option<u64>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Dispatches one rearrangement invocation to the configured solver.
///
/// Invocations are independent: each owns its model reference, random
/// source, and budget, so separate diagrams may be rearranged from
/// parallel threads with no shared state.
#[derive(Debug, Clone)]
pub struct Arranger {
    config: Config,
}

impl Arranger {
    /// Creates an arranger with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Creates an arranger with the default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rearranges `initial` against `model`.
    ///
    /// The initial arrangement must be structurally valid (one cell per
    /// box, no cell shared); anything else is a programming error in the
    /// caller and fails fast. Once dispatched, the invocation always
    /// produces an arrangement; under time or iteration pressure it
    /// degrades to best-effort, reported through the termination reason.
    pub fn arrange(&self, model: &LayoutModel, initial: &Arrangement) -> Result<ArrangeResult> {
        model.validate(initial)?;

        let budget = SearchBudget::new(self.config.timeout);
        let initial_fitness = model.evaluate(initial);
        if self.config.verbose {
            log::info!(
                "arrange: strategy {} over {} boxes, {} legs, initial score {:.3}",
                self.config.strategy,
                model.n_boxes(),
                model.legs().len(),
                initial_fitness.score
            );
        }

        let mut result = match self.config.strategy {
            Strategy::BranchBound => run_branch_bound(model, initial, &self.config, &budget),
            Strategy::Genetic => {
                let mut rng = self.rng();
                run_genetic(model, &self.config, &budget, &mut rng)
            }
            Strategy::LinearProgram => {
                match run_linear_program(model, initial, &self.config, &budget) {
                    Ok(result) => result,
                    Err(Error::SolverUnavailable(reason)) if self.config.lp_fallback => {
                        log::warn!("lp: {}; falling back to branch & bound", reason);
                        let mut fallback = run_branch_bound(model, initial, &self.config, &budget);
                        fallback.termination = Termination::SolverUnavailable;
                        fallback
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        // A solver never hands back less than it was given.
        if initial_fitness.score < result.fitness.score {
            result.arrangement = initial.clone();
            result.fitness = initial_fitness;
        }
        result.elapsed = budget.elapsed();

        log::debug!(
            "arrange: {} -> score {:.3} ({}) in {:?}",
            self.config.strategy,
            result.fitness.score,
            result.termination,
            result.elapsed
        );
        Ok(result)
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoxSpec, Cell, LegSpec};

    fn crossed_diamond() -> (LayoutModel, Arrangement) {
        let boxes = vec![
            BoxSpec::association("A1", 40.0, 20.0),
            BoxSpec::association("A2", 40.0, 20.0),
            BoxSpec::entity("E1", 40.0, 20.0),
            BoxSpec::entity("E2", 40.0, 20.0),
        ];
        let legs = vec![LegSpec::new("A1", "E1"), LegSpec::new("A2", "E2")];
        let model = LayoutModel::new(boxes, &legs).unwrap();
        let initial = Arrangement::new(vec![
            Cell::new(0, 0),
            Cell::new(0, 1),
            Cell::new(1, 1),
            Cell::new(1, 0),
        ]);
        (model, initial)
    }

    #[test]
    fn test_arrange_rejects_invalid_initial() {
        let (model, mut initial) = crossed_diamond();
        initial.set(1, initial.cell(0));

        let arranger = Arranger::default_config();
        assert!(matches!(
            arranger.arrange(&model, &initial),
            Err(Error::InvalidArrangement(_))
        ));
    }

    #[test]
    fn test_arrange_branch_bound_untangles() {
        let (model, initial) = crossed_diamond();
        let arranger = Arranger::new(Config::default().with_strategy(Strategy::BranchBound));

        let result = arranger.arrange(&model, &initial).unwrap();
        assert_eq!(result.fitness.score, 0.0);
        assert_eq!(result.termination, Termination::TargetReached);
        assert!(result.nodes_explored.is_some());
    }

    #[test]
    fn test_arrange_genetic_never_worse_than_input() {
        let (model, initial) = crossed_diamond();
        let arranger = Arranger::new(
            Config::default()
                .with_strategy(Strategy::Genetic)
                .with_seed(5)
                .with_population_size(30)
                .with_max_generations(40),
        );

        let result = arranger.arrange(&model, &initial).unwrap();
        assert!(result.fitness.score <= model.evaluate(&initial).score);
        assert!(model.validate(&result.arrangement).is_ok());
        assert!(result.generations.is_some());
    }

    #[cfg(not(any(feature = "lp-cbc", feature = "lp-highs")))]
    #[test]
    fn test_arrange_lp_without_backend_errors() {
        let (model, initial) = crossed_diamond();
        let arranger = Arranger::new(Config::default().with_strategy(Strategy::LinearProgram));

        assert!(matches!(
            arranger.arrange(&model, &initial),
            Err(Error::SolverUnavailable(_))
        ));
    }

    #[cfg(not(any(feature = "lp-cbc", feature = "lp-highs")))]
    #[test]
    fn test_arrange_lp_fallback_runs_branch_bound() {
        let (model, initial) = crossed_diamond();
        let arranger = Arranger::new(
            Config::default()
                .with_strategy(Strategy::LinearProgram)
                .with_lp_fallback(true),
        );

        let result = arranger.arrange(&model, &initial).unwrap();
        assert_eq!(result.termination, Termination::SolverUnavailable);
        assert_eq!(result.fitness.score, 0.0);
    }
}
