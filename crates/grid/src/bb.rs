//! Branch & bound rearrangement.
//!
//! Exhaustive, pruned search over box-to-cell assignments. The outer loop
//! walks a precomputed deterministic sequence of starting permutations
//! (rotations of the fixed box order: descending leg degree, ties broken
//! by identifier); the inner depth-first expansion tries candidate cells
//! in row-major order. A partial assignment is pruned as soon as the cost
//! of its determined legs can no longer beat the incumbent, or exceeds
//! `max_objective`.

use std::collections::HashSet;
use std::time::Duration;

use er_arrange_core::{Config, SearchBudget, Termination};

use crate::arranger::ArrangeResult;
use crate::model::{Arrangement, Cell, Fitness, LayoutModel};

/// Control signal propagated out of the depth-first expansion.
enum Walk {
    /// Subtree fully explored (or pruned).
    Done,
    /// Call limit for the current start consumed.
    Truncated,
    /// Wall-clock budget expired.
    Expired,
    /// An arrangement at or below `min_objective` was found.
    Target,
}

struct Search<'a> {
    model: &'a LayoutModel,
    config: &'a Config,
    budget: &'a SearchBudget,
    grid_cells: Vec<Cell>,
    order: Vec<usize>,
    slots: Vec<Option<Cell>>,
    used: HashSet<Cell>,
    best: Arrangement,
    best_fitness: Fitness,
    /// Expansions consumed by the current start.
    calls: u64,
    /// Expansions consumed by all starts together.
    nodes: u64,
}

impl<'a> Search<'a> {
    fn begin_start(&mut self, order: Vec<usize>) {
        self.order = order;
        self.slots = vec![None; self.model.n_boxes()];
        self.used.clear();
        self.calls = 0;
    }

    fn expand(&mut self, depth: usize) -> Walk {
        if depth == self.order.len() {
            let cells: Vec<Cell> = self.slots.iter().filter_map(|slot| *slot).collect();
            debug_assert_eq!(cells.len(), self.order.len());
            let arrangement = Arrangement::new(cells);
            let fitness = self.model.evaluate(&arrangement);
            if fitness.score < self.best_fitness.score {
                if self.config.verbose {
                    log::info!(
                        "bb: improved to {:.3} after {} expansions",
                        fitness.score,
                        self.nodes
                    );
                }
                self.best = arrangement;
                self.best_fitness = fitness;
            }
            if self.best_fitness.score <= self.config.min_objective {
                return Walk::Target;
            }
            return Walk::Done;
        }

        if self.calls >= self.config.call_limit {
            return Walk::Truncated;
        }
        self.calls += 1;
        self.nodes += 1;
        if self.budget.expired() {
            return Walk::Expired;
        }

        let box_ix = self.order[depth];
        for cell in self.candidates() {
            self.slots[box_ix] = Some(cell);
            self.used.insert(cell);

            let bound = self.model.partial_score(&self.slots);
            let walk = if bound >= self.best_fitness.score || bound > self.config.max_objective {
                Walk::Done
            } else {
                self.expand(depth + 1)
            };

            self.slots[box_ix] = None;
            self.used.remove(&cell);

            match walk {
                Walk::Done => {}
                other => return other,
            }
        }
        Walk::Done
    }

    /// Free candidate cells for the next box, in row-major order.
    ///
    /// Constrained search offers the free cells of the compact grid.
    /// Organic search grows the placed region instead: the first box
    /// anchors the origin, every later box may take any free cell
    /// 8-adjacent to an occupied one.
    fn candidates(&self) -> Vec<Cell> {
        if !self.config.organic {
            return self
                .grid_cells
                .iter()
                .copied()
                .filter(|cell| !self.used.contains(cell))
                .collect();
        }

        if self.used.is_empty() {
            return vec![Cell::new(0, 0)];
        }
        let mut frontier: Vec<Cell> = self
            .used
            .iter()
            .flat_map(|cell| {
                let center = *cell;
                (-1..=1).flat_map(move |dr| {
                    (-1..=1).map(move |dc| Cell::new(center.row + dr, center.col + dc))
                })
            })
            .filter(|cell| !self.used.contains(cell))
            .collect();
        frontier.sort();
        frontier.dedup();
        frontier
    }
}

/// Runs the branch & bound strategy.
///
/// Always returns an arrangement at least as good as `initial`. The
/// termination reason distinguishes a provably exhausted search
/// (`Optimal`) from a call-limited or deadline-limited best effort.
pub fn run_branch_bound(
    model: &LayoutModel,
    initial: &Arrangement,
    config: &Config,
    budget: &SearchBudget,
) -> ArrangeResult {
    let n = model.n_boxes();
    let initial_fitness = model.evaluate(initial);

    let mut result = ArrangeResult {
        arrangement: initial.clone(),
        fitness: initial_fitness,
        termination: Termination::BudgetExhausted,
        generations: None,
        nodes_explored: Some(0),
        elapsed: Duration::ZERO,
    };

    if initial_fitness.score <= config.min_objective {
        result.termination = Termination::TargetReached;
        return result;
    }
    if n == 0 {
        result.termination = Termination::Optimal;
        return result;
    }

    // Fixed assignment order: descending leg degree, ties by identifier.
    let mut base: Vec<usize> = (0..n).collect();
    base.sort_by(|&a, &b| {
        model
            .degree(b)
            .cmp(&model.degree(a))
            .then_with(|| model.boxes()[a].id.cmp(&model.boxes()[b].id))
    });

    let mut search = Search {
        model,
        config,
        budget,
        grid_cells: model.grid().cells(),
        order: Vec::new(),
        slots: Vec::new(),
        used: HashSet::with_capacity(n),
        best: initial.clone(),
        best_fitness: initial_fitness,
        calls: 0,
        nodes: 0,
    };

    let mut proven = false;
    let mut target = false;

    for start in 0..n {
        if budget.expired() {
            break;
        }
        let mut order = base.clone();
        order.rotate_left(start);
        if config.verbose {
            log::info!(
                "bb: restart {}/{} from {:?}, best score {:.3}",
                start + 1,
                n,
                model.boxes()[order[0]].id,
                search.best_fitness.score
            );
        }
        search.begin_start(order);
        match search.expand(0) {
            Walk::Target => {
                target = true;
                break;
            }
            // One un-truncated start explores the whole space; further
            // restarts cannot find anything better.
            Walk::Done => {
                proven = true;
                break;
            }
            Walk::Truncated => continue,
            Walk::Expired => break,
        }
    }

    result.arrangement = search.best;
    result.fitness = search.best_fitness;
    result.nodes_explored = Some(search.nodes);
    result.termination = if target {
        Termination::TargetReached
    } else if proven {
        Termination::Optimal
    } else {
        Termination::BudgetExhausted
    };
    log::debug!(
        "bb: finished with score {:.3} ({}) after {} expansions",
        result.fitness.score,
        result.termination,
        search.nodes
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoxSpec, LegSpec};

    fn chain() -> (LayoutModel, Arrangement) {
        // A1 links E1 and E2; an elbow placement scores zero. The
        // initial placement stretches the A1-E1 leg diagonally.
        let boxes = vec![
            BoxSpec::association("A1", 40.0, 20.0),
            BoxSpec::entity("E1", 40.0, 20.0),
            BoxSpec::entity("E2", 40.0, 20.0),
        ];
        let legs = vec![LegSpec::new("A1", "E1"), LegSpec::new("A1", "E2")];
        let model = LayoutModel::new(boxes, &legs).unwrap();
        let initial = Arrangement::new(vec![Cell::new(0, 0), Cell::new(1, 1), Cell::new(0, 1)]);
        (model, initial)
    }

    fn crossed_diamond() -> (LayoutModel, Arrangement) {
        // Two independent legs arranged as an X on the 2x2 grid.
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
    fn test_bb_finds_flat_optimum() {
        let (model, initial) = chain();
        assert!(model.evaluate(&initial).score > 0.0);

        let config = Config::default();
        let result = run_branch_bound(&model, &initial, &config, &SearchBudget::unlimited());

        assert_eq!(result.fitness.score, 0.0);
        assert_eq!(result.fitness.crossings, 0);
        assert!(model.validate(&result.arrangement).is_ok());
        assert_eq!(result.termination, Termination::TargetReached);
    }

    #[test]
    fn test_bb_zero_legs_returns_immediately() {
        let boxes = vec![
            BoxSpec::entity("E1", 40.0, 20.0),
            BoxSpec::entity("E2", 40.0, 20.0),
        ];
        let model = LayoutModel::new(boxes, &[]).unwrap();
        let initial = Arrangement::row_major(model.grid(), model.n_boxes());

        let config = Config::default();
        let result = run_branch_bound(&model, &initial, &config, &SearchBudget::unlimited());

        assert_eq!(result.fitness.score, 0.0);
        assert_eq!(result.termination, Termination::TargetReached);
        assert_eq!(result.nodes_explored, Some(0));
        assert_eq!(result.arrangement, initial);
    }

    #[test]
    fn test_bb_call_limit_bounds_expansions_per_start() {
        let (model, initial) = crossed_diamond();
        let config = Config::default().with_call_limit(1);
        let result = run_branch_bound(&model, &initial, &config, &SearchBudget::unlimited());

        // Exactly one expansion per start, four starts, none of which
        // reaches a leaf.
        assert_eq!(result.nodes_explored, Some(4));
        assert_eq!(result.termination, Termination::BudgetExhausted);
        assert_eq!(result.arrangement, initial);
        assert!(model.validate(&result.arrangement).is_ok());
    }

    #[test]
    fn test_bb_zero_budget_returns_initial() {
        let (model, initial) = chain();
        let config = Config::default();
        let budget = SearchBudget::new(Some(Duration::ZERO));
        let result = run_branch_bound(&model, &initial, &config, &budget);

        assert_eq!(result.termination, Termination::BudgetExhausted);
        assert_eq!(result.arrangement, initial);
        assert_eq!(result.nodes_explored, Some(0));
    }

    #[test]
    fn test_bb_organic_reaches_flat_optimum() {
        let (model, initial) = crossed_diamond();
        let config = Config::default().with_organic(true);
        let result = run_branch_bound(&model, &initial, &config, &SearchBudget::unlimited());

        assert!(model.validate(&result.arrangement).is_ok());
        assert_eq!(result.fitness.score, 0.0);
        assert_eq!(result.termination, Termination::TargetReached);
    }

    #[test]
    fn test_bb_constrained_untangles_crossing() {
        let (model, initial) = crossed_diamond();
        assert_eq!(model.evaluate(&initial).crossings, 1);

        let config = Config::default();
        let result = run_branch_bound(&model, &initial, &config, &SearchBudget::unlimited());

        assert_eq!(result.fitness.crossings, 0);
        assert_eq!(result.fitness.score, 0.0);
        assert_eq!(result.termination, Termination::TargetReached);
    }
}
