//! Low-level heuristic selection.
//!
//! A [`SelectionPolicy`] picks the next heuristic to apply from the
//! current [`HeuristicProfile`]s. The [`HeuristicSelector`] owns those
//! profiles for the duration of a run.
//!
//! # References
//!
//! - Burke et al. (2013), "Hyper-heuristics: a survey of the state of the art"
//! - Sutton & Barto (2018), Section 2.2 (epsilon-greedy action selection)

use crate::class::HeuristicClassTag;
use crate::error::{HyperError, Result};
use crate::profile::{HeuristicProfile, ProfileConfig};
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a low-level heuristic.
pub type HeuristicId = usize;

/// Strategy for choosing the next heuristic.
///
/// # Examples
///
/// ```
/// use u_hyperheur::selection::SelectionPolicy;
///
/// // Explore 10% of the time, otherwise pick the best-scoring heuristic.
/// let policy = SelectionPolicy::EpsilonGreedy { exploration_rate: 0.1 };
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SelectionPolicy {
    /// Every heuristic with equal probability.
    Uniform,

    /// Probability proportional to reward score (roulette wheel).
    ///
    /// Falls back to uniform when all scores are zero.
    #[default]
    Roulette,

    /// Uniform with probability `exploration_rate`, otherwise the heuristic
    /// with the highest reward score. Ties go to the lowest id.
    EpsilonGreedy {
        /// Exploration probability in [0, 1].
        exploration_rate: f64,
    },
}

impl SelectionPolicy {
    /// Validates the policy parameters.
    pub fn validate(&self) -> Result<()> {
        if let SelectionPolicy::EpsilonGreedy { exploration_rate } = *self {
            if !(0.0..=1.0).contains(&exploration_rate) {
                return Err(HyperError::InvalidConfiguration(format!(
                    "exploration_rate must be in [0, 1], got {exploration_rate}"
                )));
            }
        }
        Ok(())
    }

    /// Selects a heuristic id from `profiles`.
    ///
    /// Fails with `InvalidState` when `profiles` is empty.
    pub fn select<R: Rng + ?Sized>(
        &self,
        profiles: &BTreeMap<HeuristicId, HeuristicProfile>,
        rng: &mut R,
    ) -> Result<HeuristicId> {
        if profiles.is_empty() {
            return Err(HyperError::InvalidState(
                "cannot select from an empty heuristic registry".into(),
            ));
        }

        let id = match *self {
            SelectionPolicy::Uniform => uniform(profiles, rng),
            SelectionPolicy::Roulette => roulette(profiles, rng),
            SelectionPolicy::EpsilonGreedy { exploration_rate } => {
                if exploration_rate > 0.0 && rng.random_range(0.0..1.0) < exploration_rate {
                    uniform(profiles, rng)
                } else {
                    greedy(profiles)
                }
            }
        };
        Ok(id)
    }
}

fn uniform<R: Rng + ?Sized>(
    profiles: &BTreeMap<HeuristicId, HeuristicProfile>,
    rng: &mut R,
) -> HeuristicId {
    let n = rng.random_range(0..profiles.len());
    // n < len, so nth always hits.
    profiles.keys().nth(n).copied().unwrap_or_default()
}

/// Roulette wheel over reward scores.
fn roulette<R: Rng + ?Sized>(
    profiles: &BTreeMap<HeuristicId, HeuristicProfile>,
    rng: &mut R,
) -> HeuristicId {
    let total: f64 = profiles.values().map(|p| p.score().max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        return uniform(profiles, rng);
    }

    let mut roll = rng.random_range(0.0..total);
    let mut last = 0;
    for (&id, profile) in profiles {
        roll -= profile.score().max(0.0);
        if roll <= 0.0 {
            return id;
        }
        last = id;
    }
    last
}

/// Highest score wins; the first (lowest) id wins ties. NaN ranks last.
fn greedy(profiles: &BTreeMap<HeuristicId, HeuristicProfile>) -> HeuristicId {
    let mut best: Option<(HeuristicId, f64)> = None;
    for (&id, profile) in profiles {
        let score = match profile.score() {
            s if s.is_nan() => f64::NEG_INFINITY,
            s => s,
        };
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((id, score)),
        }
    }
    best.map(|(id, _)| id).unwrap_or_default()
}

/// Owns the profiles of all registered heuristics and selects among them.
#[derive(Debug, Clone)]
pub struct HeuristicSelector {
    policy: SelectionPolicy,
    profile_config: ProfileConfig,
    profiles: BTreeMap<HeuristicId, HeuristicProfile>,
}

impl HeuristicSelector {
    /// Creates a selector with no registered heuristics.
    pub fn new(policy: SelectionPolicy, profile_config: ProfileConfig) -> Self {
        Self {
            policy,
            profile_config,
            profiles: BTreeMap::new(),
        }
    }

    /// Creates a selector with heuristics `0..count` registered.
    pub fn with_heuristics(
        policy: SelectionPolicy,
        profile_config: ProfileConfig,
        count: usize,
    ) -> Self {
        let mut selector = Self::new(policy, profile_config);
        for id in 0..count {
            selector.register(id);
        }
        selector
    }

    /// Registers a heuristic with a fresh profile. No-op if already present.
    pub fn register(&mut self, id: HeuristicId) {
        let config = self.profile_config;
        self.profiles
            .entry(id)
            .or_insert_with(|| HeuristicProfile::new(config));
    }

    /// Registers a heuristic with an existing (e.g. restored) profile.
    pub fn register_profile(&mut self, id: HeuristicId, profile: HeuristicProfile) {
        self.profiles.insert(id, profile);
    }

    /// Selects the next heuristic.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<HeuristicId> {
        self.policy.select(&self.profiles, rng)
    }

    /// Records one application of heuristic `id` that took `elapsed`.
    pub fn record(
        &mut self,
        id: HeuristicId,
        tag: HeuristicClassTag,
        accepted: bool,
        elapsed: Duration,
    ) -> Result<()> {
        let profile = self.profiles.get_mut(&id).ok_or_else(|| {
            HyperError::InvalidState(format!("heuristic {id} is not registered"))
        })?;
        profile.record(tag, accepted);
        profile.add_elapsed(elapsed);
        Ok(())
    }

    /// Resets every profile to its initial state.
    pub fn reset(&mut self) {
        for profile in self.profiles.values_mut() {
            profile.reset();
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn profile(&self, id: HeuristicId) -> Option<&HeuristicProfile> {
        self.profiles.get(&id)
    }

    pub fn profiles(&self) -> &BTreeMap<HeuristicId, HeuristicProfile> {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Total time spent in heuristic applications and evaluations.
    pub fn total_elapsed(&self) -> Duration {
        self.profiles.values().map(|p| p.elapsed()).sum()
    }

    /// Total applications recorded across all heuristics.
    pub fn total_attempts(&self) -> u64 {
        self.profiles.values().map(|p| p.attempts()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn profiles_with_scores(scores: &[f64]) -> BTreeMap<HeuristicId, HeuristicProfile> {
        let config = ProfileConfig::default().with_min_score(0.0);
        scores
            .iter()
            .enumerate()
            .map(|(id, &s)| {
                let p = HeuristicProfile::from_parts(config, 0, 0, [0; 5], s).unwrap();
                (id, p)
            })
            .collect()
    }

    #[test]
    fn test_empty_registry_is_invalid_state() {
        let mut rng = StdRng::seed_from_u64(0);
        let empty = BTreeMap::new();
        for policy in [
            SelectionPolicy::Uniform,
            SelectionPolicy::Roulette,
            SelectionPolicy::EpsilonGreedy {
                exploration_rate: 0.5,
            },
        ] {
            let err = policy.select(&empty, &mut rng).unwrap_err();
            assert!(matches!(err, HyperError::InvalidState(_)));
        }
    }

    #[test]
    fn test_greedy_picks_argmax() {
        let profiles = profiles_with_scores(&[0.5, 2.0, 1.0]);
        let policy = SelectionPolicy::EpsilonGreedy {
            exploration_rate: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(policy.select(&profiles, &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_greedy_tie_breaks_lowest_id() {
        let profiles = profiles_with_scores(&[1.0, 3.0, 3.0, 3.0]);
        let policy = SelectionPolicy::EpsilonGreedy {
            exploration_rate: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.select(&profiles, &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_greedy_ignores_nan_score() {
        let mut profiles = profiles_with_scores(&[2.0, 0.0, 1.0]);
        let nan = HeuristicProfile::default().with_raw_score(f64::NAN);
        profiles.insert(1, nan);
        let policy = SelectionPolicy::EpsilonGreedy {
            exploration_rate: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.select(&profiles, &mut rng).unwrap(), 0);

        let leading_nan: BTreeMap<_, _> = profiles_with_scores(&[0.0, 0.5, 0.5])
            .into_iter()
            .map(|(id, p)| if id == 0 { (id, p.with_raw_score(f64::NAN)) } else { (id, p) })
            .collect();
        assert_eq!(policy.select(&leading_nan, &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_full_exploration_visits_all() {
        let profiles = profiles_with_scores(&[0.1, 5.0, 0.1]);
        let policy = SelectionPolicy::EpsilonGreedy {
            exploration_rate: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[policy.select(&profiles, &mut rng).unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_uniform_covers_sparse_ids() {
        let mut profiles = BTreeMap::new();
        profiles.insert(3, HeuristicProfile::default());
        profiles.insert(10, HeuristicProfile::default());
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let id = SelectionPolicy::Uniform.select(&profiles, &mut rng).unwrap();
            assert!(id == 3 || id == 10);
        }
    }

    #[test]
    fn test_roulette_proportional() {
        let profiles = profiles_with_scores(&[1.0, 3.0]);
        let mut rng = StdRng::seed_from_u64(4);
        let picks_of_one = (0..10_000)
            .filter(|_| SelectionPolicy::Roulette.select(&profiles, &mut rng).unwrap() == 1)
            .count();
        let ratio = picks_of_one as f64 / 10_000.0;
        assert!((ratio - 0.75).abs() < 0.03, "ratio {ratio}");
    }

    #[test]
    fn test_roulette_zero_scores_fall_back_to_uniform() {
        let profiles = profiles_with_scores(&[0.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 2];
        for _ in 0..100 {
            seen[SelectionPolicy::Roulette.select(&profiles, &mut rng).unwrap()] = true;
        }
        assert!(seen[0] && seen[1]);
    }

    #[test]
    fn test_validate() {
        assert!(SelectionPolicy::default().validate().is_ok());
        assert!(SelectionPolicy::EpsilonGreedy {
            exploration_rate: 1.5
        }
        .validate()
        .is_err());
        assert!(SelectionPolicy::EpsilonGreedy {
            exploration_rate: -0.1
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_selector_record_and_reset() {
        let mut selector =
            HeuristicSelector::with_heuristics(SelectionPolicy::Uniform, ProfileConfig::default(), 3);
        assert_eq!(selector.len(), 3);

        selector
            .record(1, HeuristicClassTag::OnlyImproving, true, Duration::from_micros(30))
            .unwrap();
        assert_eq!(selector.profile(1).unwrap().attempts(), 1);
        assert_eq!(selector.total_attempts(), 1);
        assert_eq!(selector.total_elapsed(), Duration::from_micros(30));

        let err = selector
            .record(7, HeuristicClassTag::OnlyEqual, false, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, HyperError::InvalidState(_)));

        selector.reset();
        assert_eq!(selector.total_attempts(), 0);
    }

    #[test]
    fn test_selector_empty_select_fails() {
        let selector = HeuristicSelector::new(SelectionPolicy::Roulette, ProfileConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(selector.is_empty());
        assert!(selector.select(&mut rng).is_err());
    }
}
