//! Error types for the hyper-heuristic core.

use thiserror::Error;

/// Errors raised by the core itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HyperError {
    /// A configuration value is out of range or inconsistent.
    ///
    /// Reported before a run starts. Never corrected automatically.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An operation was called in a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Errors surfaced by a [`SearchLoop`](crate::search::SearchLoop).
///
/// `E` is the error type of the external evaluation / move-generation
/// functions. It is passed through untouched.
#[derive(Debug, Error)]
pub enum SearchError<E> {
    /// Configuration or state error raised by the core.
    #[error(transparent)]
    Core(#[from] HyperError),

    /// Error returned by the problem's `evaluate` or `apply_heuristic`.
    #[error(transparent)]
    Problem(E),
}

impl<E> SearchError<E> {
    /// Returns the external error, if this is one.
    pub fn into_problem(self) -> Option<E> {
        match self {
            SearchError::Problem(e) => Some(e),
            SearchError::Core(_) => None,
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, HyperError>;
