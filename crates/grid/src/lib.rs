//! # er-arrange Grid
//!
//! Layout rearrangement engine for entity-relationship diagrams: given an
//! initial placement of diagram boxes on an abstract grid, find a
//! placement that minimizes leg crossings, leg length, and bounding-box
//! sprawl under a time/effort budget.
//!
//! ## Components
//!
//! - **Model**: [`LayoutModel`], [`Arrangement`], [`Fitness`]: pure data
//!   plus pure evaluation
//! - **Branch & Bound**: exhaustive pruned search with deterministic
//!   restarts ([`bb`])
//! - **Genetic Algorithm**: population search over cell permutations
//!   ([`ga_grid`])
//! - **Linear Program**: assignment formulation delegated to an external
//!   backend ([`lp`])
//! - **Orchestrator**: [`Arranger`]: dispatches one strategy per
//!   invocation and reports the [`Termination`] reason
//!
//! ## Example
//!
//! ```rust
//! use er_arrange_grid::{
//!     Arranger, Arrangement, BoxSpec, Config, LayoutModel, LegSpec, Strategy,
//! };
//!
//! let boxes = vec![
//!     BoxSpec::association("Books", 56.0, 24.0),
//!     BoxSpec::entity("Author", 48.0, 40.0),
//!     BoxSpec::entity("Title", 48.0, 40.0),
//! ];
//! let legs = vec![LegSpec::new("Books", "Author"), LegSpec::new("Books", "Title")];
//! let model = LayoutModel::new(boxes, &legs).unwrap();
//!
//! let initial = Arrangement::row_major(model.grid(), model.n_boxes());
//! let arranger = Arranger::new(Config::new().with_strategy(Strategy::BranchBound).with_seed(1));
//! let result = arranger.arrange(&model, &initial).unwrap();
//! assert!(result.fitness.score <= model.evaluate(&initial).score);
//! ```
//!
//! ## Feature Flags
//!
//! - `lp-cbc` / `lp-highs`: compile the COIN-OR CBC / HiGHS backends for
//!   the linear program strategy
//! - `serde`: enable serialization/deserialization support

pub mod arranger;
pub mod bb;
pub mod ga_grid;
pub mod geometry;
pub mod lp;
pub mod model;

// Re-exports
pub use arranger::{ArrangeResult, Arranger};
pub use bb::run_branch_bound;
pub use ga_grid::{run_genetic, GridChromosome, GridProblem};
pub use lp::{is_engine_available, run_linear_program};
pub use model::{
    Arrangement, BoxKind, BoxSpec, Cell, Fitness, FitnessWeights, Grid, LayoutModel, Leg, LegSpec,
};

// The strategy-agnostic layer, re-exported for callers.
pub use er_arrange_core::{
    Config, Engine, Error, GaConfig, Result, SearchBudget, Strategy, Termination,
};
