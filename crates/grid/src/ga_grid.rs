//! Genetic algorithm over grid arrangements.
//!
//! An individual is a permutation of the compact grid's cells; box `i`
//! lands on the cell its gene points at. Order crossover and swap
//! mutation both permute whole cells, so injectivity survives every
//! operation by construction.

use rand::prelude::*;
use std::time::Duration;

use er_arrange_core::{Config, GaConfig, GaProblem, GaRunner, Individual, SearchBudget};

use crate::arranger::ArrangeResult;
use crate::model::{Arrangement, Cell, LayoutModel};

/// Permutation chromosome over grid cells.
///
/// `genes` is a permutation of `0..cells`; the first `boxes` positions
/// are the placements, the tail holds the spare cells of the grid.
#[derive(Debug, Clone)]
pub struct GridChromosome {
    genes: Vec<usize>,
    boxes: usize,
    fitness: f64,
}

impl GridChromosome {
    /// Creates a random chromosome for `cells` grid cells and `boxes`
    /// placed boxes.
    pub fn random<R: Rng>(cells: usize, boxes: usize, rng: &mut R) -> Self {
        let mut genes: Vec<usize> = (0..cells).collect();
        genes.shuffle(rng);
        Self {
            genes,
            boxes,
            fitness: f64::INFINITY,
        }
    }

    /// Cell index assigned to a box.
    pub fn gene(&self, box_ix: usize) -> usize {
        self.genes[box_ix]
    }

    /// Order crossover (OX): keep a segment of this parent, fill the
    /// rest in the other parent's order. The child is again a
    /// permutation of `0..cells`.
    fn order_crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        let n = self.genes.len();
        if n < 2 {
            return self.clone();
        }

        let (mut p1, mut p2) = (rng.gen_range(0..n), rng.gen_range(0..n));
        if p1 > p2 {
            std::mem::swap(&mut p1, &mut p2);
        }

        let mut child_genes = vec![usize::MAX; n];
        let mut used = vec![false; n];

        for i in p1..=p2 {
            child_genes[i] = self.genes[i];
            used[self.genes[i]] = true;
        }

        let mut j = (p2 + 1) % n;
        for i in 0..n {
            let idx = (p2 + 1 + i) % n;
            if child_genes[idx] == usize::MAX {
                while used[other.genes[j]] {
                    j = (j + 1) % n;
                }
                child_genes[idx] = other.genes[j];
                used[other.genes[j]] = true;
                j = (j + 1) % n;
            }
        }

        Self {
            genes: child_genes,
            boxes: self.boxes,
            fitness: f64::INFINITY,
        }
    }

    /// Swaps the cells of two randomly chosen boxes.
    fn swap_mutate<R: Rng>(&mut self, rng: &mut R) {
        if self.boxes < 2 {
            return;
        }
        let i = rng.gen_range(0..self.boxes);
        let j = rng.gen_range(0..self.boxes);
        self.genes.swap(i, j);
        self.fitness = f64::INFINITY;
    }
}

impl Individual for GridChromosome {
    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        self.order_crossover(other, rng)
    }

    fn mutate<R: Rng>(&mut self, rng: &mut R) {
        self.swap_mutate(rng);
    }
}

/// Grid arrangement problem for the GA framework.
pub struct GridProblem<'a> {
    model: &'a LayoutModel,
    cells: Vec<Cell>,
    verbose: bool,
}

impl<'a> GridProblem<'a> {
    /// Creates the problem over the model's compact grid.
    pub fn new(model: &'a LayoutModel, verbose: bool) -> Self {
        Self {
            model,
            cells: model.grid().cells(),
            verbose,
        }
    }

    /// Decodes a chromosome into an arrangement.
    pub fn decode(&self, chromosome: &GridChromosome) -> Arrangement {
        Arrangement::new(
            (0..self.model.n_boxes())
                .map(|box_ix| self.cells[chromosome.gene(box_ix)])
                .collect(),
        )
    }
}

impl GaProblem for GridProblem<'_> {
    type Individual = GridChromosome;

    fn evaluate(&self, individual: &mut GridChromosome) {
        let arrangement = self.decode(individual);
        individual.fitness = self.model.evaluate(&arrangement).score;
    }

    fn initial_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<GridChromosome> {
        (0..size)
            .map(|_| GridChromosome::random(self.cells.len(), self.model.n_boxes(), rng))
            .collect()
    }

    fn on_generation(&self, generation: u32, best: &GridChromosome) {
        if self.verbose {
            log::info!("ga: generation {}, best score {:.3}", generation, best.fitness());
        }
    }
}

/// Runs the genetic algorithm strategy.
pub fn run_genetic<R: Rng>(
    model: &LayoutModel,
    config: &Config,
    budget: &SearchBudget,
    rng: &mut R,
) -> ArrangeResult {
    let ga_config = GaConfig::new()
        .with_population_size(config.population_size)
        .with_max_generations(config.max_generations)
        .with_crossover_rate(config.crossover_rate)
        .with_mutation_rate(config.mutation_rate)
        .with_sample_size(config.sample_size)
        .with_plateau(config.plateau)
        .with_target(config.min_objective);

    let runner = GaRunner::new(ga_config, GridProblem::new(model, config.verbose));
    let outcome = runner.run(rng, budget);

    let problem = runner.into_problem();
    let arrangement = problem.decode(&outcome.best);
    let fitness = model.evaluate(&arrangement);
    log::debug!(
        "ga: finished with score {:.3} ({}) after {} generations",
        fitness.score,
        outcome.termination,
        outcome.generations
    );

    ArrangeResult {
        arrangement,
        fitness,
        termination: outcome.termination,
        generations: Some(outcome.generations),
        nodes_explored: None,
        elapsed: Duration::ZERO,
    }
}
