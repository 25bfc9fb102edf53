//! Domain-agnostic hyper-heuristic core.
//!
//! A hyper-heuristic searches over low-level heuristics instead of over
//! solutions directly. This crate provides the problem-independent part:
//!
//! - **Classification**: maps each move's quality delta onto a class tag
//!   (improving, equal, worsening, much worse).
//! - **Profiles**: per-heuristic counters and a decay-weighted reward score.
//! - **Acceptance**: pluggable criteria (strict improving, improving-or-equal,
//!   bounded worsening, annealing, baselines) with a cooling temperature.
//! - **Selection**: uniform, roulette wheel, or epsilon-greedy choice of the
//!   next heuristic.
//! - **Search loop**: a single-threaded state machine tying the above
//!   together, stepping or running to a stop condition.
//!
//! # Architecture
//!
//! This crate sits at Layer 2 (Algorithms) in the U-Engine ecosystem. It
//! contains no domain-specific concepts. Solution encoding, evaluation and
//! the low-level heuristics are supplied by consumers through
//! [`search::HyperProblem`].

pub mod acceptance;
pub mod class;
pub mod error;
pub mod profile;
pub mod search;
pub mod selection;

pub use error::{HyperError, SearchError};
