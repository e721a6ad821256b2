//! Shared wall-clock budget for one rearrangement invocation.
//!
//! Every solver samples [`SearchBudget::expired`] cooperatively at its own
//! well-defined points (after each branch-and-bound expansion, after each
//! genetic-algorithm generation) rather than being preempted. The in-flight
//! node or generation always completes, so a caller never observes a
//! half-mutated arrangement.
//!
//! Iteration ceilings (`call_limit`, `max_generations`, `plateau`) live in
//! the solver configuration and are enforced by the solver that owns them;
//! this type only carries the deadline.

use std::time::{Duration, Instant};

/// Wall-clock deadline for a single rearrangement invocation.
///
/// Created at invocation start from the configured timeout, consulted at
/// every solver iteration, discarded at invocation end.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    start: Instant,
    limit: Option<Duration>,
}

impl SearchBudget {
    /// Creates a budget expiring `limit` after now. `None` never expires.
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    /// Creates a budget that never expires.
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Returns true once the deadline has passed.
    pub fn expired(&self) -> bool {
        match self.limit {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }

    /// Time elapsed since the budget was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// The configured deadline, if any.
    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
