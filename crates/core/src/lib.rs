//! # er-arrange Core
//!
//! Strategy-agnostic infrastructure for the er-arrange layout
//! rearrangement engine.
//!
//! This crate provides the types shared by every rearrangement strategy:
//!
//! - **Errors**: [`Error`], [`Result`]
//! - **Budget**: [`SearchBudget`], the cooperative wall-clock deadline
//! - **Configuration**: [`Config`], [`Strategy`], [`Engine`],
//!   [`Termination`]
//! - **GA framework**: [`GaRunner`], [`GaProblem`], [`Individual`], the
//!   generic minimizing evolutionary loop
//!
//! The grid-placement domain (arrangement model, branch & bound, linear
//! program, orchestrator) lives in the `er-arrange-grid` crate.
//!
//! ## Feature Flags
//!
//! - `serde`: enable serialization/deserialization of configurations and
//!   outcomes

pub mod budget;
pub mod error;
pub mod ga;
pub mod solver;

// Re-exports
pub use budget::SearchBudget;
pub use error::{Error, Result};
pub use ga::{GaConfig, GaOutcome, GaProblem, GaRunner, Individual};
pub use solver::{Config, Engine, Strategy, Termination};
