//! Structured error types for gridsync.
//!
//! Everything fallible in the kernel returns [`GridResult`]. Local problems
//! (a single malformed statement) are recorded and skipped by the program;
//! only [`GridError::ReducerFault`] aborts a run midway.

use thiserror::Error;

/// Raised by a [`Reducer`](crate::traits::Reducer) that cannot apply a
/// committed event to its context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ReducerFault(pub String);

impl ReducerFault {
    pub fn new(reason: impl Into<String>) -> Self {
        ReducerFault(reason.into())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// A numeric setting was non-positive or not finite.
    #[error("invalid configuration: `{field}` must be positive and finite, got {value}")]
    Configuration { field: &'static str, value: f64 },

    /// A statement had an unusable shape or value. The offending process
    /// stops taking part; the run continues.
    #[error("malformed statement from `{thread}`: {reason}")]
    MalformedStatement { thread: String, reason: String },

    /// Nothing is selectable, the horizon is not reached, and requests are
    /// still outstanding.
    #[error("no progress possible at t={elapsed}: {count} pending request(s)")]
    DeadlockNoProgress {
        elapsed: f64,
        count: usize,
        pending: Vec<String>,
    },

    /// The context reducer failed; the context keeps its last good value.
    ///
    /// The event was already selected, so the strategy's clock stands at
    /// `time` while the history ends at the previous commit.
    #[error("reducer failed on event `{event}` at t={time}: {source}")]
    ReducerFault {
        event: String,
        time: f64,
        #[source]
        source: ReducerFault,
    },

    /// A scenario description could not be turned into a program.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

impl GridError {
    /// `true` for the states that end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GridError::DeadlockNoProgress { .. } | GridError::ReducerFault { .. }
        )
    }
}

pub type GridResult<T> = Result<T, GridError>;
