//! Linear program rearrangement.
//!
//! Formulates placement as an assignment program (binary `place[b][c]`
//! variables, each box on exactly one cell, each cell holding at most one
//! box) with linearized quadratic-assignment terms for leg lengths:
//! `link[l][c1][c2] >= place[a][c1] + place[e][c2] - 1` puts the length
//! cost of a leg on the objective exactly when both endpoints land on the
//! pair of cells. The numeric solve is delegated to the `good_lp` backend
//! selected by the `engine` parameter.
//!
//! Crossing terms are not linearized (they would need four-way products
//! of placement variables); the distance objective stands in for them and
//! the returned arrangement is re-scored by the authoritative model
//! evaluation, so the reported fitness stays comparable across
//! strategies. The `Optimal` termination is therefore relative to the
//! length relaxation.

use std::time::Duration;

use er_arrange_core::{Config, Engine, Error, Result, SearchBudget, Termination};

use crate::arranger::ArrangeResult;
use crate::model::{Arrangement, LayoutModel};

#[cfg(any(feature = "lp-cbc", feature = "lp-highs"))]
use good_lp::{
    constraint, variable, Constraint, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};

#[cfg(any(feature = "lp-cbc", feature = "lp-highs"))]
use crate::geometry;

/// True if the given backend was compiled in.
pub fn is_engine_available(engine: Engine) -> bool {
    match engine {
        Engine::Cbc => cfg!(feature = "lp-cbc"),
        Engine::Highs => cfg!(feature = "lp-highs"),
    }
}

#[cfg(any(feature = "lp-cbc", feature = "lp-highs"))]
struct AssignmentProgram {
    vars: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    place: Vec<Vec<Variable>>,
}

#[cfg(any(feature = "lp-cbc", feature = "lp-highs"))]
fn build_program(model: &LayoutModel) -> AssignmentProgram {
    let cells = model.grid().cells();
    let boxes = model.n_boxes();
    let mut vars = ProblemVariables::new();

    let place: Vec<Vec<Variable>> = (0..boxes)
        .map(|b| {
            (0..cells.len())
                .map(|c| vars.add(variable().binary().name(format!("place_{}_{}", b, c))))
                .collect()
        })
        .collect();

    let mut constraints = Vec::new();

    // Each box occupies exactly one cell.
    for row in &place {
        let occupancy: Expression = row.iter().map(|&v| Expression::from(v)).sum();
        constraints.push(constraint!(occupancy == 1.0));
    }

    // Each cell holds at most one box.
    for c in 0..cells.len() {
        let load: Expression = place.iter().map(|row| Expression::from(row[c])).sum();
        constraints.push(constraint!(load <= 1.0));
    }

    // Linearized leg lengths. Zero-cost pairs (adjacent cells) need no
    // variable: the link is only ever pushed up, never down.
    let length_weight = model.weights().length;
    let mut objective = Expression::from(0.0);
    for (l, leg) in model.legs().iter().enumerate() {
        for (c1, cell_a) in cells.iter().enumerate() {
            for (c2, cell_e) in cells.iter().enumerate() {
                if c1 == c2 {
                    continue;
                }
                let span = geometry::distance(
                    (cell_a.row as i64, cell_a.col as i64),
                    (cell_e.row as i64, cell_e.col as i64),
                );
                let cost = length_weight * (span - 1.0).max(0.0);
                if cost <= 0.0 {
                    continue;
                }
                let link = vars.add(
                    variable()
                        .min(0.0)
                        .max(1.0)
                        .name(format!("link_{}_{}_{}", l, c1, c2)),
                );
                constraints.push(constraint!(
                    link >= place[leg.association][c1] + place[leg.entity][c2] - 1.0
                ));
                objective += cost * link;
            }
        }
    }

    AssignmentProgram {
        vars,
        objective,
        constraints,
        place,
    }
}

#[cfg(feature = "lp-cbc")]
fn solve_cbc(program: AssignmentProgram) -> Result<Vec<Vec<f64>>> {
    let AssignmentProgram {
        vars,
        objective,
        constraints,
        place,
    } = program;
    let mut problem = vars.minimise(objective).using(good_lp::coin_cbc);
    for constraint in constraints {
        problem = problem.with(constraint);
    }
    let solution = problem
        .solve()
        .map_err(|e| Error::SolverUnavailable(format!("cbc backend failed: {:?}", e)))?;
    Ok(place
        .iter()
        .map(|row| row.iter().map(|&v| solution.value(v)).collect())
        .collect())
}

#[cfg(feature = "lp-highs")]
fn solve_highs(program: AssignmentProgram) -> Result<Vec<Vec<f64>>> {
    let AssignmentProgram {
        vars,
        objective,
        constraints,
        place,
    } = program;
    let mut problem = vars.minimise(objective).using(good_lp::highs);
    for constraint in constraints {
        problem = problem.with(constraint);
    }
    let solution = problem
        .solve()
        .map_err(|e| Error::SolverUnavailable(format!("highs backend failed: {:?}", e)))?;
    Ok(place
        .iter()
        .map(|row| row.iter().map(|&v| solution.value(v)).collect())
        .collect())
}

#[cfg(any(feature = "lp-cbc", feature = "lp-highs"))]
fn decode_placement(model: &LayoutModel, values: &[Vec<f64>]) -> Result<Arrangement> {
    let cells = model.grid().cells();
    let mut placed = Vec::with_capacity(model.n_boxes());
    for (b, row) in values.iter().enumerate() {
        let c = row.iter().position(|&v| v > 0.5).ok_or_else(|| {
            Error::SolverUnavailable(format!(
                "backend returned no cell for box {:?}",
                model.boxes()[b].id
            ))
        })?;
        placed.push(cells[c]);
    }
    Ok(Arrangement::new(placed))
}

/// Runs the linear program strategy.
///
/// A missing or failing backend is fatal for this solver only; the
/// orchestrator decides whether to fall back.
pub fn run_linear_program(
    model: &LayoutModel,
    initial: &Arrangement,
    config: &Config,
    budget: &SearchBudget,
) -> Result<ArrangeResult> {
    if budget.expired() {
        return Ok(ArrangeResult {
            arrangement: initial.clone(),
            fitness: model.evaluate(initial),
            termination: Termination::BudgetExhausted,
            generations: None,
            nodes_explored: None,
            elapsed: Duration::ZERO,
        });
    }

    let arrangement = match config.engine {
        #[cfg(feature = "lp-cbc")]
        Engine::Cbc => {
            log::debug!("lp: solving assignment program with cbc");
            let values = solve_cbc(build_program(model))?;
            decode_placement(model, &values)?
        }
        #[cfg(not(feature = "lp-cbc"))]
        Engine::Cbc => {
            return Err(Error::SolverUnavailable(
                "cbc backend not compiled in (enable the lp-cbc feature)".to_string(),
            ))
        }
        #[cfg(feature = "lp-highs")]
        Engine::Highs => {
            log::debug!("lp: solving assignment program with highs");
            let values = solve_highs(build_program(model))?;
            decode_placement(model, &values)?
        }
        #[cfg(not(feature = "lp-highs"))]
        Engine::Highs => {
            return Err(Error::SolverUnavailable(
                "highs backend not compiled in (enable the lp-highs feature)".to_string(),
            ))
        }
    };

    let fitness = model.evaluate(&arrangement);
    log::debug!("lp: finished with score {:.3}", fitness.score);
    Ok(ArrangeResult {
        arrangement,
        fitness,
        termination: Termination::Optimal,
        generations: None,
        nodes_explored: None,
        elapsed: Duration::ZERO,
    })
}
