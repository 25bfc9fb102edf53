//! Built-in acceptance criteria.

use super::state::AcceptanceState;
use super::AcceptanceCriterion;
use crate::class::{HeuristicClassTag, MoveOutcome};
use crate::error::{HyperError, Result};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Accepts only `OnlyImproving` moves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrictImproving;

impl AcceptanceCriterion for StrictImproving {
    fn name(&self) -> &str {
        "strict-improving"
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        _outcome: &MoveOutcome,
        tag: HeuristicClassTag,
        _state: &AcceptanceState,
        _rng: &mut R,
    ) -> bool {
        tag == HeuristicClassTag::OnlyImproving
    }
}

/// Accepts every move in the `ImprovingMoreOrEqual` group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImprovingOrEqual;

impl AcceptanceCriterion for ImprovingOrEqual {
    fn name(&self) -> &str {
        "improving-or-equal"
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        _outcome: &MoveOutcome,
        tag: HeuristicClassTag,
        _state: &AcceptanceState,
        _rng: &mut R,
    ) -> bool {
        tag.belongs_to(HeuristicClassTag::ImprovingMoreOrEqual)
    }
}

/// Accepts improving and equal moves, and worsening moves by chance.
///
/// `OnlyWorsening` is accepted with probability `worsening_probability`,
/// `WorseningMore` with `severe_probability` (0 rejects them always), which
/// may not exceed `worsening_probability`. With `scale_with_temperature`
/// (off by default), both probabilities are multiplied by
/// [`AcceptanceState::temperature_ratio`], so they shrink as the search
/// cools.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundedWorsening {
    pub worsening_probability: f64,
    pub severe_probability: f64,
    pub scale_with_temperature: bool,
}

impl Default for BoundedWorsening {
    fn default() -> Self {
        Self::new(0.1, 0.0)
    }
}

impl BoundedWorsening {
    pub fn new(worsening_probability: f64, severe_probability: f64) -> Self {
        Self {
            worsening_probability,
            severe_probability,
            scale_with_temperature: false,
        }
    }

    pub fn with_temperature_scaling(mut self, enabled: bool) -> Self {
        self.scale_with_temperature = enabled;
        self
    }

    /// Validates the probabilities.
    pub fn validate(&self) -> Result<()> {
        for (name, p) in [
            ("worsening_probability", self.worsening_probability),
            ("severe_probability", self.severe_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(HyperError::InvalidConfiguration(format!(
                    "{name} must be in [0, 1], got {p}"
                )));
            }
        }
        if self.severe_probability > self.worsening_probability {
            return Err(HyperError::InvalidConfiguration(format!(
                "severe_probability {} exceeds worsening_probability {}",
                self.severe_probability, self.worsening_probability
            )));
        }
        Ok(())
    }

    fn probability(&self, base: f64, state: &AcceptanceState) -> f64 {
        if self.scale_with_temperature {
            base * state.temperature_ratio().clamp(0.0, 1.0)
        } else {
            base
        }
    }
}

impl AcceptanceCriterion for BoundedWorsening {
    fn name(&self) -> &str {
        "bounded-worsening"
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        _outcome: &MoveOutcome,
        tag: HeuristicClassTag,
        state: &AcceptanceState,
        rng: &mut R,
    ) -> bool {
        let base = match tag {
            HeuristicClassTag::OnlyImproving
            | HeuristicClassTag::OnlyEqual
            | HeuristicClassTag::ImprovingMoreOrEqual => return true,
            HeuristicClassTag::OnlyWorsening => self.worsening_probability,
            HeuristicClassTag::WorseningMore => self.severe_probability,
        };
        let p = self.probability(base, state);
        p > 0.0 && rng.random_range(0.0..1.0) < p
    }
}

/// Metropolis criterion: worsening moves pass with `exp(-delta / T)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Annealing;

impl AcceptanceCriterion for Annealing {
    fn name(&self) -> &str {
        "annealing"
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        outcome: &MoveOutcome,
        tag: HeuristicClassTag,
        state: &AcceptanceState,
        rng: &mut R,
    ) -> bool {
        if !tag.is_worsening() {
            return true;
        }
        let temperature = state.temperature();
        if temperature <= 0.0 {
            return false;
        }
        let probability = (-outcome.delta() / temperature).exp();
        rng.random_range(0.0..1.0) < probability
    }
}

/// Accepts every candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlwaysAccept;

impl AcceptanceCriterion for AlwaysAccept {
    fn name(&self) -> &str {
        "always-accept"
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        _outcome: &MoveOutcome,
        _tag: HeuristicClassTag,
        _state: &AcceptanceState,
        _rng: &mut R,
    ) -> bool {
        true
    }
}

/// Accepts iff the raw delta is `<= 0`, ignoring the tie tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeverAcceptWorsening;

impl AcceptanceCriterion for NeverAcceptWorsening {
    fn name(&self) -> &str {
        "never-accept-worsening"
    }

    fn decide<R: Rng + ?Sized>(
        &self,
        outcome: &MoveOutcome,
        _tag: HeuristicClassTag,
        _state: &AcceptanceState,
        _rng: &mut R,
    ) -> bool {
        outcome.delta() <= 0.0
    }
}
