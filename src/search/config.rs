//! Search loop configuration.

use crate::acceptance::{AcceptanceVariant, CoolingSchedule};
use crate::class::{validate_thresholds, Classifier};
use crate::error::{HyperError, Result};
use crate::profile::ProfileConfig;
use crate::selection::SelectionPolicy;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a hyper-heuristic search run.
///
/// # Classification
///
/// Quality deltas within `tie_tolerance` (ε) count as equal. Worsening
/// deltas above `worsening_threshold` (θ) count as much worse. θ must
/// exceed ε.
///
/// # Stopping
///
/// The run converges when the first of these holds:
/// - the best quality is at or below `quality_target`
/// - `max_iterations` iterations have run (0 converges immediately)
/// - `time_limit` has passed since `start()`
/// - the best quality has not improved for `no_improvement_limit`
///   iterations (0 disables this check)
///
/// # Examples
///
/// ```
/// use u_hyperheur::acceptance::AcceptanceVariant;
/// use u_hyperheur::search::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_thresholds(0.01, 5.0)
///     .with_exploration_rate(0.1)
///     .with_max_iterations(5000)
///     .with_no_improvement_limit(500)
///     .with_acceptance(AcceptanceVariant::Annealing)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchConfig {
    /// Tie tolerance ε, at least 0.
    pub tie_tolerance: f64,

    /// Worsening threshold θ, greater than ε.
    pub worsening_threshold: f64,

    /// Heuristic selection policy.
    pub selection: SelectionPolicy,

    /// Iteration budget.
    pub max_iterations: usize,

    /// Stagnation limit on the best quality. 0 = disabled.
    pub no_improvement_limit: usize,

    /// Stop as soon as the best quality reaches this value.
    pub quality_target: Option<f64>,

    /// Wall-clock budget, measured from `start()`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub time_limit: Option<Duration>,

    /// Acceptance criterion.
    pub acceptance: AcceptanceVariant,

    /// Cooling schedule for the acceptance temperature.
    pub cooling: CoolingSchedule,

    /// Initial acceptance temperature.
    pub initial_temperature: f64,

    /// Minimum acceptance temperature.
    pub min_temperature: f64,

    /// Reward score parameters for heuristic profiles.
    pub profile: ProfileConfig,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,

    /// Best quality is sampled every `history_interval` iterations.
    pub history_interval: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tie_tolerance: 1e-9,
            worsening_threshold: 1.0,
            selection: SelectionPolicy::default(),
            max_iterations: 10000,
            no_improvement_limit: 0,
            quality_target: None,
            time_limit: None,
            acceptance: AcceptanceVariant::default(),
            cooling: CoolingSchedule::default(),
            initial_temperature: 100.0,
            min_temperature: 0.01,
            profile: ProfileConfig::default(),
            seed: None,
            history_interval: 100,
        }
    }
}

impl SearchConfig {
    pub fn with_thresholds(mut self, tie_tolerance: f64, worsening_threshold: f64) -> Self {
        self.tie_tolerance = tie_tolerance;
        self.worsening_threshold = worsening_threshold;
        self
    }

    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Switches to epsilon-greedy selection with the given exploration rate.
    pub fn with_exploration_rate(mut self, rate: f64) -> Self {
        self.selection = SelectionPolicy::EpsilonGreedy {
            exploration_rate: rate,
        };
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_no_improvement_limit(mut self, n: usize) -> Self {
        self.no_improvement_limit = n;
        self
    }

    pub fn with_quality_target(mut self, target: f64) -> Self {
        self.quality_target = Some(target);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceVariant) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_temperature(mut self, initial: f64, cooling: CoolingSchedule, min: f64) -> Self {
        self.initial_temperature = initial;
        self.cooling = cooling;
        self.min_temperature = min;
        self
    }

    pub fn with_profile(mut self, profile: ProfileConfig) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_history_interval(mut self, n: usize) -> Self {
        self.history_interval = n;
        self
    }

    /// Builds the move classifier for these thresholds.
    pub fn classifier(&self) -> Result<Classifier> {
        Classifier::new(self.tie_tolerance, self.worsening_threshold)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_thresholds(self.tie_tolerance, self.worsening_threshold)?;
        self.selection.validate()?;
        self.acceptance.validate()?;
        self.cooling.validate()?;
        self.profile.validate()?;

        if !(self.initial_temperature > 0.0) || !self.initial_temperature.is_finite() {
            return Err(HyperError::InvalidConfiguration(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            )));
        }
        if !(self.min_temperature > 0.0) {
            return Err(HyperError::InvalidConfiguration(format!(
                "min_temperature must be positive, got {}",
                self.min_temperature
            )));
        }
        if self.min_temperature >= self.initial_temperature {
            return Err(HyperError::InvalidConfiguration(
                "min_temperature must be less than initial_temperature".into(),
            ));
        }
        if self.history_interval == 0 {
            return Err(HyperError::InvalidConfiguration(
                "history_interval must be positive".into(),
            ));
        }
        if let Some(target) = self.quality_target {
            if target.is_nan() {
                return Err(HyperError::InvalidConfiguration(
                    "quality_target must not be NaN".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptance::BoundedWorsening;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.max_iterations, 10000);
        assert_eq!(config.no_improvement_limit, 0);
        assert_eq!(config.selection, SelectionPolicy::Roulette);
        assert_eq!(config.acceptance, AcceptanceVariant::ImprovingOrEqual);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_threshold_order() {
        let config = SearchConfig::default().with_thresholds(0.5, 0.5);
        assert!(matches!(
            config.validate(),
            Err(HyperError::InvalidConfiguration(_))
        ));

        let config = SearchConfig::default().with_thresholds(1.0, 0.1);
        assert!(config.validate().is_err());

        let config = SearchConfig::default().with_thresholds(-0.1, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_exploration_rate() {
        assert!(SearchConfig::default()
            .with_exploration_rate(1.2)
            .validate()
            .is_err());
        assert!(SearchConfig::default()
            .with_exploration_rate(0.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_temperatures() {
        let config =
            SearchConfig::default().with_temperature(1.0, CoolingSchedule::Constant, 2.0);
        assert!(config.validate().is_err());

        let config =
            SearchConfig::default().with_temperature(-1.0, CoolingSchedule::Constant, 0.1);
        assert!(config.validate().is_err());

        let config = SearchConfig::default().with_temperature(
            10.0,
            CoolingSchedule::Geometric { alpha: 1.5 },
            0.1,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_nested() {
        let config = SearchConfig::default()
            .with_acceptance(AcceptanceVariant::BoundedWorsening(BoundedWorsening::new(
                1.5, 0.0,
            )));
        assert!(config.validate().is_err());

        let config = SearchConfig::default().with_profile(ProfileConfig::default().with_decay(0.0));
        assert!(config.validate().is_err());

        let config = SearchConfig::default().with_history_interval(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_chain() {
        let config = SearchConfig::default()
            .with_thresholds(0.01, 2.0)
            .with_exploration_rate(0.2)
            .with_max_iterations(500)
            .with_no_improvement_limit(50)
            .with_quality_target(-10.0)
            .with_time_limit(Duration::from_secs(30))
            .with_acceptance(AcceptanceVariant::StrictImproving)
            .with_seed(42);

        assert!((config.tie_tolerance - 0.01).abs() < 1e-12);
        assert!((config.worsening_threshold - 2.0).abs() < 1e-12);
        assert_eq!(
            config.selection,
            SelectionPolicy::EpsilonGreedy {
                exploration_rate: 0.2
            }
        );
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.no_improvement_limit, 50);
        assert_eq!(config.quality_target, Some(-10.0));
        assert_eq!(config.time_limit, Some(Duration::from_secs(30)));
        assert_eq!(config.seed, Some(42));
        assert!(config.classifier().is_ok());
    }
}
