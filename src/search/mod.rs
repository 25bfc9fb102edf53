//! Hyper-heuristic search loop.
//!
//! Each iteration selects a low-level heuristic from adaptive profiles,
//! applies it to the current solution, classifies the quality change,
//! and lets an acceptance criterion decide whether the candidate replaces
//! the current solution.
//!
//! # References
//!
//! - Misir et al. (2012), "An Intelligent Hyper-heuristic Framework for
//!   CHeSC 2011"
//! - Burke et al. (2013), "Hyper-heuristics: a survey of the state of the art"

mod config;
mod runner;
mod types;

pub use config::SearchConfig;
pub use runner::{SearchLoop, SearchResult, SearchState, StepReport, StopReason};
pub use types::{HeuristicKind, HyperProblem};
