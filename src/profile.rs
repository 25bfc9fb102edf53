//! Per-heuristic running statistics.
//!
//! A [`HeuristicProfile`] counts how often a low-level heuristic was
//! applied, how often its candidate was accepted, and how its moves were
//! classified. It also keeps a decay-weighted reward score that the
//! [`SelectionPolicy`](crate::selection::SelectionPolicy) reads.
//!
//! # Reward update
//!
//! After each application the reward `r` is
//!
//! ```text
//! r = acceptance_weight * [accepted] + improvement_weight * [improving]
//! ```
//!
//! and the score is smoothed exponentially with decay `rho`:
//!
//! ```text
//! score = max(min_score, score * (1 - rho) + rho * r)
//! ```
//!
//! # References
//!
//! Ropke & Pisinger (2006), Equation (1), applied per application instead
//! of per segment.

use crate::class::HeuristicClassTag;
use crate::error::{HyperError, Result};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of the reward score.
///
/// # Examples
///
/// ```
/// use u_hyperheur::profile::ProfileConfig;
///
/// let config = ProfileConfig::default()
///     .with_decay(0.2)
///     .with_weights(1.0, 4.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProfileConfig {
    /// Smoothing factor in (0, 1]. Higher values forget faster.
    pub decay: f64,

    /// Reward for an accepted candidate.
    pub acceptance_weight: f64,

    /// Reward for an improving candidate (on top of acceptance).
    pub improvement_weight: f64,

    /// Score of a heuristic that has never been applied.
    pub initial_score: f64,

    /// Lower bound on the score, so no heuristic starves under roulette selection.
    pub min_score: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            decay: 0.1,
            acceptance_weight: 1.0,
            improvement_weight: 2.0,
            initial_score: 1.0,
            min_score: 0.01,
        }
    }
}

impl ProfileConfig {
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_weights(mut self, acceptance: f64, improvement: f64) -> Self {
        self.acceptance_weight = acceptance;
        self.improvement_weight = improvement;
        self
    }

    pub fn with_initial_score(mut self, score: f64) -> Self {
        self.initial_score = score;
        self
    }

    pub fn with_min_score(mut self, score: f64) -> Self {
        self.min_score = score;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(HyperError::InvalidConfiguration(format!(
                "profile decay must be in (0, 1], got {}",
                self.decay
            )));
        }
        for (name, w) in [
            ("acceptance_weight", self.acceptance_weight),
            ("improvement_weight", self.improvement_weight),
        ] {
            if !(w >= 0.0 && w.is_finite()) {
                return Err(HyperError::InvalidConfiguration(format!(
                    "{name} must be finite and non-negative, got {w}"
                )));
            }
        }
        if !(self.min_score >= 0.0 && self.min_score.is_finite()) {
            return Err(HyperError::InvalidConfiguration(format!(
                "min_score must be non-negative, got {}",
                self.min_score
            )));
        }
        if !(self.initial_score >= self.min_score) || !self.initial_score.is_finite() {
            return Err(HyperError::InvalidConfiguration(format!(
                "initial_score must be finite and >= min_score, got {}",
                self.initial_score
            )));
        }
        Ok(())
    }
}

/// Running statistics for one low-level heuristic.
///
/// Invariants, for any sequence of [`record`](Self::record) calls:
/// `attempts == per_class_count.iter().sum()` and
/// `accepted_count <= attempts`. Deserialization goes through
/// [`from_parts`](Self::from_parts), so a decoded profile holds them too.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ProfileParts"))]
pub struct HeuristicProfile {
    attempts: u64,
    accepted_count: u64,
    per_class_count: [u64; 5],
    reward_score: f64,
    config: ProfileConfig,
    elapsed: Duration,
}

/// Unchecked wire form of a [`HeuristicProfile`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct ProfileParts {
    attempts: u64,
    accepted_count: u64,
    per_class_count: [u64; 5],
    reward_score: f64,
    config: ProfileConfig,
    #[serde(default)]
    elapsed: Duration,
}

#[cfg(feature = "serde")]
impl TryFrom<ProfileParts> for HeuristicProfile {
    type Error = HyperError;

    fn try_from(parts: ProfileParts) -> Result<Self> {
        Ok(HeuristicProfile::from_parts(
            parts.config,
            parts.attempts,
            parts.accepted_count,
            parts.per_class_count,
            parts.reward_score,
        )?
        .with_elapsed(parts.elapsed))
    }
}

impl HeuristicProfile {
    /// Creates an empty profile.
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            attempts: 0,
            accepted_count: 0,
            per_class_count: [0; 5],
            reward_score: config.initial_score,
            config,
            elapsed: Duration::ZERO,
        }
    }

    /// Rebuilds a profile from previously saved counters.
    ///
    /// Fails with `InvalidConfiguration` for an invalid `config`, and with
    /// `InvalidState` when the counters break the profile invariants or
    /// `reward_score` is not a finite value at or above `config.min_score`.
    pub fn from_parts(
        config: ProfileConfig,
        attempts: u64,
        accepted_count: u64,
        per_class_count: [u64; 5],
        reward_score: f64,
    ) -> Result<Self> {
        config.validate()?;
        let total: u64 = per_class_count.iter().sum();
        if total != attempts {
            return Err(HyperError::InvalidState(format!(
                "per-class counts sum to {total} but attempts is {attempts}"
            )));
        }
        if accepted_count > attempts {
            return Err(HyperError::InvalidState(format!(
                "accepted_count {accepted_count} exceeds attempts {attempts}"
            )));
        }
        if !reward_score.is_finite() || reward_score < config.min_score {
            return Err(HyperError::InvalidState(format!(
                "reward_score must be finite and >= min_score {}, got {reward_score}",
                config.min_score
            )));
        }
        Ok(Self {
            attempts,
            accepted_count,
            per_class_count,
            reward_score,
            config,
            elapsed: Duration::ZERO,
        })
    }

    /// Sets the accumulated application time, e.g. when restoring a profile.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Records one application of the heuristic.
    ///
    /// `tag` is expected to be one of the four primitive tags.
    pub fn record(&mut self, tag: HeuristicClassTag, accepted: bool) {
        debug_assert!(tag.is_primitive(), "composite tag recorded: {tag:?}");

        self.attempts += 1;
        self.per_class_count[tag.index()] += 1;
        if accepted {
            self.accepted_count += 1;
        }

        let mut reward = 0.0;
        if accepted {
            reward += self.config.acceptance_weight;
        }
        if tag == HeuristicClassTag::OnlyImproving {
            reward += self.config.improvement_weight;
        }

        let rho = self.config.decay;
        self.reward_score =
            (self.reward_score * (1.0 - rho) + rho * reward).max(self.config.min_score);
    }

    /// Adds time spent applying and evaluating this heuristic.
    pub fn add_elapsed(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;
    }

    /// Total time spent applying and evaluating this heuristic.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Mean time per application, zero before the first one.
    pub fn mean_call_time(&self) -> Duration {
        match u32::try_from(self.attempts) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.elapsed / n,
            Err(_) => Duration::from_secs_f64(self.elapsed.as_secs_f64() / self.attempts as f64),
        }
    }

    /// Current reward score.
    pub fn score(&self) -> f64 {
        self.reward_score
    }

    /// Clears all counters and restores the initial score.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count
    }

    /// Count for one tag.
    pub fn class_count(&self, tag: HeuristicClassTag) -> u64 {
        self.per_class_count[tag.index()]
    }

    /// Counts for all tags, indexed by [`HeuristicClassTag::index`].
    pub fn per_class_count(&self) -> [u64; 5] {
        self.per_class_count
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Fraction of applications whose candidate was accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted_count as f64 / self.attempts as f64
        }
    }

    /// Fraction of applications that improved the current solution.
    pub fn improvement_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.class_count(HeuristicClassTag::OnlyImproving) as f64 / self.attempts as f64
        }
    }

    /// Summarizes the heuristic's observed behaviour as a single class.
    ///
    /// | history                                   | class                  |
    /// |-------------------------------------------|------------------------|
    /// | only improving                            | `OnlyImproving`        |
    /// | only equal                                | `OnlyEqual`            |
    /// | improving and equal, nothing worse        | `ImprovingMoreOrEqual` |
    /// | only worsening, none much worse           | `OnlyWorsening`        |
    /// | only worsening, some much worse           | `WorseningMore`        |
    /// | empty, or worsening mixed with the rest   | `None`                 |
    pub fn behaviour(&self) -> Option<HeuristicClassTag> {
        if self.attempts == 0 {
            return None;
        }
        let improving = self.class_count(HeuristicClassTag::OnlyImproving);
        let equal = self.class_count(HeuristicClassTag::OnlyEqual);
        let worse = self.class_count(HeuristicClassTag::OnlyWorsening);
        let much_worse = self.class_count(HeuristicClassTag::WorseningMore);

        let non_worsening = improving + equal;
        let worsening = worse + much_worse;

        match (non_worsening > 0, worsening > 0) {
            (true, false) if equal == 0 => Some(HeuristicClassTag::OnlyImproving),
            (true, false) if improving == 0 => Some(HeuristicClassTag::OnlyEqual),
            (true, false) => Some(HeuristicClassTag::ImprovingMoreOrEqual),
            (false, true) if much_worse > 0 => Some(HeuristicClassTag::WorseningMore),
            (false, true) => Some(HeuristicClassTag::OnlyWorsening),
            _ => None,
        }
    }
}

#[cfg(test)]
impl HeuristicProfile {
    /// Bypasses validation to build profiles no public path can produce.
    pub(crate) fn with_raw_score(mut self, score: f64) -> Self {
        self.reward_score = score;
        self
    }
}

impl Default for HeuristicProfile {
    fn default() -> Self {
        Self::new(ProfileConfig::default())
    }
}
