//! Move acceptance criteria.
//!
//! An [`AcceptanceCriterion`] decides whether a candidate replaces the
//! current solution, given the candidate's [`MoveOutcome`] and its class
//! tag. Criteria never mutate anything: adaptive parameters such as the
//! temperature live in [`AcceptanceState`], which the search loop advances
//! once per iteration. The only side effect of [`decide`] is drawing from
//! the supplied random number generator, so every criterion is
//! reproducible under a fixed seed.
//!
//! [`AcceptanceVariant`] selects a built-in criterion from configuration.
//!
//! [`decide`]: AcceptanceCriterion::decide

mod criteria;
mod state;

pub use criteria::{
    AlwaysAccept, Annealing, BoundedWorsening, ImprovingOrEqual, NeverAcceptWorsening,
    StrictImproving,
};
pub use state::{AcceptanceState, CoolingSchedule};

use crate::class::{HeuristicClassTag, MoveOutcome};
use crate::error::Result;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decides whether a candidate solution is accepted.
pub trait AcceptanceCriterion {
    /// Returns a human-readable name for this criterion.
    fn name(&self) -> &str;

    /// Returns `true` to accept the candidate.
    ///
    /// # Arguments
    /// * `outcome` - Quality delta of the candidate
    /// * `tag` - Class tag of `outcome`
    /// * `state` - Adaptive parameters for the current iteration
    /// * `rng` - Random number generator, the only thing consumed
    fn decide<R: Rng + ?Sized>(
        &self,
        outcome: &MoveOutcome,
        tag: HeuristicClassTag,
        state: &AcceptanceState,
        rng: &mut R,
    ) -> bool;
}

/// Built-in criteria, selectable from configuration.
///
/// # Examples
///
/// ```
/// use u_hyperheur::acceptance::{AcceptanceVariant, BoundedWorsening};
///
/// let variant = AcceptanceVariant::BoundedWorsening(BoundedWorsening::new(0.2, 0.0));
/// assert!(variant.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AcceptanceVariant {
    StrictImproving,
    #[default]
    ImprovingOrEqual,
    BoundedWorsening(BoundedWorsening),
    Annealing,
    AlwaysAccept,
    NeverAcceptWorsening,
}

impl AcceptanceVariant {
    /// Validates variant parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            AcceptanceVariant::BoundedWorsening(b) => b.validate(),
            _ => Ok(()),
        }
    }
}

impl AcceptanceCriterion for AcceptanceVariant {
    fn name(&self) -> &str {
        match self {
            AcceptanceVariant::StrictImproving => "strict-improving",
            AcceptanceVariant::ImprovingOrEqual => "improving-or-equal",
            AcceptanceVariant::BoundedWorsening(_) => "bounded-worsening",
            AcceptanceVariant::Annealing => "annealing",
            AcceptanceVariant::AlwaysAccept => "always-accept",
            AcceptanceVariant::NeverAcceptWorsening => "never-accept-worsening",
        }
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        outcome: &MoveOutcome,
        tag: HeuristicClassTag,
        state: &AcceptanceState,
        rng: &mut R,
    ) -> bool {
        match self {
            AcceptanceVariant::StrictImproving => StrictImproving.decide(outcome, tag, state, rng),
            AcceptanceVariant::ImprovingOrEqual => {
                ImprovingOrEqual.decide(outcome, tag, state, rng)
            }
            AcceptanceVariant::BoundedWorsening(b) => b.decide(outcome, tag, state, rng),
            AcceptanceVariant::Annealing => Annealing.decide(outcome, tag, state, rng),
            AcceptanceVariant::AlwaysAccept => AlwaysAccept.decide(outcome, tag, state, rng),
            AcceptanceVariant::NeverAcceptWorsening => {
                NeverAcceptWorsening.decide(outcome, tag, state, rng)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_variant_dispatch_matches_struct() {
        let state = AcceptanceState::new(1.0, 0.1, CoolingSchedule::Constant, 0);
        let outcome = MoveOutcome::from_delta(0.0);
        let tag = HeuristicClassTag::OnlyEqual;
        let mut rng = StdRng::seed_from_u64(0);

        assert!(!AcceptanceVariant::StrictImproving.decide(&outcome, tag, &state, &mut rng));
        assert!(AcceptanceVariant::ImprovingOrEqual.decide(&outcome, tag, &state, &mut rng));
        assert!(AcceptanceVariant::AlwaysAccept.decide(&outcome, tag, &state, &mut rng));
        assert!(AcceptanceVariant::NeverAcceptWorsening.decide(&outcome, tag, &state, &mut rng));
        assert!(AcceptanceVariant::Annealing.decide(&outcome, tag, &state, &mut rng));
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(AcceptanceVariant::default().name(), "improving-or-equal");
        assert_eq!(
            AcceptanceVariant::BoundedWorsening(BoundedWorsening::default()).name(),
            "bounded-worsening"
        );
    }

    #[test]
    fn test_variant_validate() {
        assert!(AcceptanceVariant::Annealing.validate().is_ok());
        let bad = AcceptanceVariant::BoundedWorsening(BoundedWorsening::new(2.0, 0.0));
        assert!(bad.validate().is_err());
    }
}
