//! Error types for the arrangement engine.

use thiserror::Error;

/// Errors surfaced by the arrangement engine.
#[derive(Debug, Error)]
pub enum Error {
    /// An arrangement violated a structural invariant (duplicate cell,
    /// missing box, leg referencing an unknown box). This is a programming
    /// error in the caller, never an expected runtime condition.
    #[error("invalid arrangement: {0}")]
    InvalidArrangement(String),

    /// The requested mathematical-programming backend is not compiled in
    /// or failed to produce a feasible solution. Fatal for the linear
    /// program solver only.
    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, Error>;
