//! Core trait for hyper-heuristic problems.

use crate::selection::HeuristicId;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Category of a low-level heuristic.
///
/// Used to group heuristics for reporting, or for a caller-side policy
/// that restricts selection to one family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeuristicKind {
    /// Random perturbation of the current solution.
    Mutation,
    /// Recombination of solutions.
    Crossover,
    /// Destroy part of the solution and rebuild it.
    RuinRecreate,
    /// Move to a better neighbour.
    LocalSearch,
    /// Anything else.
    #[default]
    Other,
}

/// Defines a problem for the hyper-heuristic search loop.
///
/// The user supplies evaluation and a set of low-level heuristics
/// (identified by `0..heuristic_count()`). The search loop handles
/// heuristic selection, move classification, and acceptance.
///
/// # Minimization
///
/// Lower quality values are better. For maximization, negate the value.
///
/// # Errors
///
/// Both functions may fail. A failure aborts the run and is returned to
/// the caller unchanged as [`SearchError::Problem`](crate::error::SearchError::Problem).
/// Use [`std::convert::Infallible`] when neither can fail.
///
/// # Examples
///
/// ```ignore
/// struct OneMax { n: usize }
///
/// impl HyperProblem for OneMax {
///     type Solution = Vec<bool>;
///     type Error = std::convert::Infallible;
///
///     fn heuristic_count(&self) -> usize { 2 }
///
///     fn evaluate(&self, bits: &Vec<bool>) -> Result<f64, Self::Error> {
///         Ok(-(bits.iter().filter(|&&b| b).count() as f64))
///     }
///
///     fn apply_heuristic<R: Rng + ?Sized>(
///         &self,
///         id: HeuristicId,
///         bits: &Vec<bool>,
///         rng: &mut R,
///     ) -> Result<Vec<bool>, Self::Error> {
///         let mut next = bits.clone();
///         let i = rng.random_range(0..self.n);
///         next[i] = id == 0 || !next[i];
///         Ok(next)
///     }
/// }
/// ```
pub trait HyperProblem {
    /// The solution representation type.
    type Solution: Clone;

    /// Error raised by evaluation or heuristic application.
    type Error: std::error::Error + 'static;

    /// Number of registered low-level heuristics.
    fn heuristic_count(&self) -> usize;

    /// Computes the quality of a solution. Lower is better.
    fn evaluate(&self, solution: &Self::Solution) -> Result<f64, Self::Error>;

    /// Applies low-level heuristic `id` to `solution`, producing a candidate.
    fn apply_heuristic<R: Rng + ?Sized>(
        &self,
        id: HeuristicId,
        solution: &Self::Solution,
        rng: &mut R,
    ) -> Result<Self::Solution, Self::Error>;

    /// Category of heuristic `id`. Defaults to [`HeuristicKind::Other`].
    fn heuristic_kind(&self, _id: HeuristicId) -> HeuristicKind {
        HeuristicKind::Other
    }
}

impl<P: HyperProblem + ?Sized> HyperProblem for &P {
    type Solution = P::Solution;
    type Error = P::Error;

    fn heuristic_count(&self) -> usize {
        (**self).heuristic_count()
    }

    fn evaluate(&self, solution: &Self::Solution) -> Result<f64, Self::Error> {
        (**self).evaluate(solution)
    }

    fn apply_heuristic<R: Rng + ?Sized>(
        &self,
        id: HeuristicId,
        solution: &Self::Solution,
        rng: &mut R,
    ) -> Result<Self::Solution, Self::Error> {
        (**self).apply_heuristic(id, solution, rng)
    }

    fn heuristic_kind(&self, id: HeuristicId) -> HeuristicKind {
        (**self).heuristic_kind(id)
    }
}
