//! Genetic algorithm framework.
//!
//! Strategy-agnostic evolutionary loop: tournament selection, rate-gated
//! crossover and mutation, single-elite retention, plateau detection. The
//! domain crate supplies the chromosome ([`Individual`]) and the decoding
//! plus fitness evaluation ([`GaProblem`]).
//!
//! Fitness is minimized: lower is better, zero is the ideal. The random
//! source is an explicitly passed `&mut R: Rng` threaded through every
//! stochastic operation, so two runs with the same seed, configuration,
//! and problem produce identical outcomes.

use rand::Rng;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::budget::SearchBudget;
use crate::solver::Termination;

/// Configuration for the genetic algorithm loop.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaConfig {
    /// Population size.
    pub population_size: usize,
    /// Maximum number of generations.
    pub max_generations: u32,
    /// Crossover rate (0.0 - 1.0).
    pub crossover_rate: f64,
    /// Mutation rate (0.0 - 1.0).
    pub mutation_rate: f64,
    /// Sample size in tournament selection.
    pub sample_size: usize,
    /// Consecutive non-improving generations before early stop.
    pub plateau: Option<u32>,
    /// Fitness at or below which the search stops early.
    pub target: Option<f64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            max_generations: 300,
            crossover_rate: 0.9,
            mutation_rate: 0.06,
            sample_size: 7,
            plateau: Some(30),
            target: None,
        }
    }
}

impl GaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the maximum generations.
    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = generations;
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

    /// Sets the plateau limit.
    pub fn with_plateau(mut self, plateau: u32) -> Self {
        self.plateau = Some(plateau.max(1));
        self
    }

    /// Sets the target fitness.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }
}

/// An individual of the evolving population.
pub trait Individual: Clone + Send + Sync {
    /// Cached fitness of this individual. Lower is better.
    fn fitness(&self) -> f64;

    /// Recombines this individual with another into one offspring,
    /// preserving the domain invariants of the representation.
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;

    /// Mutates this individual in place.
    fn mutate<R: Rng>(&mut self, rng: &mut R);
}

/// Problem-specific operations for the genetic algorithm.
pub trait GaProblem: Send + Sync {
    /// The individual type for this problem.
    type Individual: Individual;

    /// Evaluates one individual, caching its fitness.
    fn evaluate(&self, individual: &mut Self::Individual);

    /// Evaluates a batch of individuals. Evaluation is pure per
    /// individual, so the default implementation parallelizes with rayon.
    fn evaluate_batch(&self, individuals: &mut [Self::Individual]) {
        individuals.par_iter_mut().for_each(|individual| {
            self.evaluate(individual);
        });
    }

    /// Creates the initial population.
    fn initial_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual>;

    /// Called after each generation with the best individual so far.
    fn on_generation(&self, _generation: u32, _best: &Self::Individual) {}
}

/// Result of a genetic algorithm run.
#[derive(Debug, Clone)]
pub struct GaOutcome<I: Individual> {
    /// The best individual ever observed across all generations.
    pub best: I,
    /// Number of generations completed.
    pub generations: u32,
    /// Why the loop stopped.
    pub termination: Termination,
    /// Best fitness after the initial evaluation and each generation.
    pub history: Vec<f64>,
}

/// Genetic algorithm runner.
pub struct GaRunner<P: GaProblem> {
    config: GaConfig,
    problem: P,
}

impl<P: GaProblem> GaRunner<P> {
    /// Creates a new runner.
    pub fn new(config: GaConfig, problem: P) -> Self {
        Self { config, problem }
    }

    /// Gives back the wrapped problem.
    pub fn into_problem(self) -> P {
        self.problem
    }

    /// Runs the evolutionary loop until the target fitness, the
    /// generation limit, the plateau limit, or the budget stops it.
    ///
    /// The budget is sampled once per generation; an in-flight generation
    /// always completes.
    pub fn run<R: Rng>(&self, rng: &mut R, budget: &SearchBudget) -> GaOutcome<P::Individual> {
        let mut population = self
            .problem
            .initial_population(self.config.population_size, rng);
        assert!(!population.is_empty(), "empty initial population");

        self.problem.evaluate_batch(&mut population);
        population.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));

        let mut best = population[0].clone();
        let mut best_fitness = best.fitness();
        let mut history = vec![best_fitness];
        let mut stagnant = 0u32;
        let mut generation = 0u32;
        let mut termination = Termination::BudgetExhausted;

        loop {
            if self
                .config
                .target
                .is_some_and(|target| best_fitness <= target)
            {
                termination = Termination::TargetReached;
                break;
            }
            if generation >= self.config.max_generations || budget.expired() {
                break;
            }
            if self.config.plateau.is_some_and(|limit| stagnant >= limit) {
                break;
            }

            // Elitism: the best individual survives unconditionally.
            let mut offspring = Vec::with_capacity(self.config.population_size - 1);
            while offspring.len() < self.config.population_size - 1 {
                let parent1 = self.tournament(&population, rng);
                let parent2 = self.tournament(&population, rng);

                let mut child = if rng.gen::<f64>() < self.config.crossover_rate {
                    parent1.crossover(parent2, rng)
                } else {
                    parent1.clone()
                };
                if rng.gen::<f64>() < self.config.mutation_rate {
                    child.mutate(rng);
                }
                offspring.push(child);
            }

            self.problem.evaluate_batch(&mut offspring);

            let mut next = Vec::with_capacity(self.config.population_size);
            next.push(best.clone());
            next.extend(offspring);
            next.sort_by(|a, b| a.fitness().total_cmp(&b.fitness()));

            if next[0].fitness() < best_fitness {
                best = next[0].clone();
                best_fitness = best.fitness();
                stagnant = 0;
            } else {
                stagnant += 1;
            }

            population = next;
            generation += 1;
            history.push(best_fitness);
            self.problem.on_generation(generation, &best);
        }

        GaOutcome {
            best,
            generations: generation,
            termination,
            history,
        }
    }

    /// Tournament selection: `sample_size` individuals drawn uniformly
    /// with replacement, fittest kept.
    fn tournament<'a, R: Rng>(
        &self,
        population: &'a [P::Individual],
        rng: &mut R,
    ) -> &'a P::Individual {
        let mut best_idx = rng.gen_range(0..population.len());
        for _ in 1..self.config.sample_size {
            let idx = rng.gen_range(0..population.len());
            if population[idx].fitness() < population[best_idx].fitness() {
                best_idx = idx;
            }
        }
        &population[best_idx]
    }
}
