//! Move-quality classification.
//!
//! Every application of a low-level heuristic yields a [`MoveOutcome`]:
//! the change in objective value between the candidate and the current
//! solution. The [`Classifier`] maps that delta onto one of four
//! mutually exclusive [`HeuristicClassTag`]s.
//!
//! All quantities follow the **minimization** convention: a negative delta
//! is an improvement.
//!
//! # Composite tag
//!
//! [`HeuristicClassTag::ImprovingMoreOrEqual`] is the union of
//! `OnlyImproving` and `OnlyEqual`. [`Classifier::classify`] never returns
//! it. Use [`HeuristicClassTag::belongs_to`] to test membership, or
//! [`HeuristicProfile::behaviour`](crate::profile::HeuristicProfile::behaviour)
//! to summarize a heuristic whose history contains both.

use crate::error::{HyperError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Classification of a move (or of a heuristic's observed behaviour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeuristicClassTag {
    /// Strictly better than the current solution, beyond the tie tolerance.
    OnlyImproving,

    /// Union of `OnlyImproving` and `OnlyEqual`. Composite, never a move tag.
    ImprovingMoreOrEqual,

    /// Worse than the current solution by more than the worsening threshold.
    WorseningMore,

    /// Worse than the current solution, within the worsening threshold.
    OnlyWorsening,

    /// Equal to the current solution within the tie tolerance.
    OnlyEqual,
}

impl HeuristicClassTag {
    /// All five tags, in declaration order.
    pub const ALL: [HeuristicClassTag; 5] = [
        HeuristicClassTag::OnlyImproving,
        HeuristicClassTag::ImprovingMoreOrEqual,
        HeuristicClassTag::WorseningMore,
        HeuristicClassTag::OnlyWorsening,
        HeuristicClassTag::OnlyEqual,
    ];

    /// The four tags [`Classifier::classify`] can produce.
    pub const PRIMITIVE: [HeuristicClassTag; 4] = [
        HeuristicClassTag::OnlyImproving,
        HeuristicClassTag::OnlyEqual,
        HeuristicClassTag::OnlyWorsening,
        HeuristicClassTag::WorseningMore,
    ];

    /// Stable slot index in `0..5`, used for per-class counters.
    pub fn index(self) -> usize {
        match self {
            HeuristicClassTag::OnlyImproving => 0,
            HeuristicClassTag::ImprovingMoreOrEqual => 1,
            HeuristicClassTag::WorseningMore => 2,
            HeuristicClassTag::OnlyWorsening => 3,
            HeuristicClassTag::OnlyEqual => 4,
        }
    }

    /// Returns `true` for the four mutually exclusive move tags.
    pub fn is_primitive(self) -> bool {
        !matches!(self, HeuristicClassTag::ImprovingMoreOrEqual)
    }

    /// Returns `true` for `WorseningMore` and `OnlyWorsening`.
    pub fn is_worsening(self) -> bool {
        matches!(
            self,
            HeuristicClassTag::WorseningMore | HeuristicClassTag::OnlyWorsening
        )
    }

    /// Tests whether `self` falls inside `class`.
    ///
    /// Every tag belongs to itself. `OnlyImproving` and `OnlyEqual` also
    /// belong to `ImprovingMoreOrEqual`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_hyperheur::class::HeuristicClassTag::*;
    ///
    /// assert!(OnlyEqual.belongs_to(ImprovingMoreOrEqual));
    /// assert!(!OnlyWorsening.belongs_to(ImprovingMoreOrEqual));
    /// assert!(!ImprovingMoreOrEqual.belongs_to(OnlyImproving));
    /// ```
    pub fn belongs_to(self, class: HeuristicClassTag) -> bool {
        if self == class {
            return true;
        }
        class == HeuristicClassTag::ImprovingMoreOrEqual
            && matches!(
                self,
                HeuristicClassTag::OnlyImproving | HeuristicClassTag::OnlyEqual
            )
    }
}

/// Quality change produced by one heuristic application.
///
/// `delta = candidate_quality - current_quality`; negative is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    delta: f64,
}

impl MoveOutcome {
    /// Builds an outcome from the current and candidate qualities.
    pub fn new(current_quality: f64, candidate_quality: f64) -> Self {
        Self {
            delta: candidate_quality - current_quality,
        }
    }

    /// Builds an outcome from a precomputed delta.
    pub fn from_delta(delta: f64) -> Self {
        Self { delta }
    }

    /// Signed quality delta (candidate minus current).
    pub fn delta(&self) -> f64 {
        self.delta
    }
}

/// Maps quality deltas onto primitive class tags.
///
/// With tie tolerance `ε` and worsening threshold `θ > ε`:
///
/// | delta            | tag             |
/// |------------------|-----------------|
/// | `< -ε`           | `OnlyImproving` |
/// | `[-ε, ε]`        | `OnlyEqual`     |
/// | `(ε, θ]`         | `OnlyWorsening` |
/// | `> θ` (or NaN)   | `WorseningMore` |
///
/// # Examples
///
/// ```
/// use u_hyperheur::class::{Classifier, HeuristicClassTag};
///
/// let classifier = Classifier::new(0.01, 5.0).unwrap();
/// assert_eq!(classifier.classify(-1.0), HeuristicClassTag::OnlyImproving);
/// assert_eq!(classifier.classify(0.0), HeuristicClassTag::OnlyEqual);
/// assert_eq!(classifier.classify(2.0), HeuristicClassTag::OnlyWorsening);
/// assert_eq!(classifier.classify(7.5), HeuristicClassTag::WorseningMore);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Classifier {
    tie_tolerance: f64,
    worsening_threshold: f64,
}

impl Classifier {
    /// Creates a classifier, rejecting `ε < 0`, `θ <= ε` and non-finite values.
    pub fn new(tie_tolerance: f64, worsening_threshold: f64) -> Result<Self> {
        validate_thresholds(tie_tolerance, worsening_threshold)?;
        Ok(Self {
            tie_tolerance,
            worsening_threshold,
        })
    }

    /// Tie tolerance `ε`.
    pub fn tie_tolerance(&self) -> f64 {
        self.tie_tolerance
    }

    /// Worsening threshold `θ`.
    pub fn worsening_threshold(&self) -> f64 {
        self.worsening_threshold
    }

    /// Classifies a quality delta. Total over `f64`, NaN included.
    pub fn classify(&self, delta: f64) -> HeuristicClassTag {
        if delta < -self.tie_tolerance {
            HeuristicClassTag::OnlyImproving
        } else if delta <= self.tie_tolerance {
            HeuristicClassTag::OnlyEqual
        } else if delta <= self.worsening_threshold {
            HeuristicClassTag::OnlyWorsening
        } else {
            // NaN fails every comparison above and lands here.
            HeuristicClassTag::WorseningMore
        }
    }

    /// Classifies a [`MoveOutcome`].
    pub fn classify_outcome(&self, outcome: &MoveOutcome) -> HeuristicClassTag {
        self.classify(outcome.delta())
    }
}

pub(crate) fn validate_thresholds(tie_tolerance: f64, worsening_threshold: f64) -> Result<()> {
    if !tie_tolerance.is_finite() || tie_tolerance < 0.0 {
        return Err(HyperError::InvalidConfiguration(format!(
            "tie_tolerance must be finite and >= 0, got {tie_tolerance}"
        )));
    }
    if !worsening_threshold.is_finite() {
        return Err(HyperError::InvalidConfiguration(format!(
            "worsening_threshold must be finite, got {worsening_threshold}"
        )));
    }
    if worsening_threshold <= tie_tolerance {
        return Err(HyperError::InvalidConfiguration(format!(
            "worsening_threshold ({worsening_threshold}) must exceed tie_tolerance ({tie_tolerance})"
        )));
    }
    Ok(())
}
