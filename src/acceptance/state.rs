//! Acceptance state and cooling schedules.

use crate::error::{HyperError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cooling schedule for the acceptance temperature.
///
/// The search loop advances the schedule once per iteration.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - Linear: fixed-duration cooling
/// - LundyMees: Lundy & Mees (1986)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoolingSchedule {
    /// Temperature never changes.
    Constant,

    /// `T_{k+1} = alpha * T_k`.
    Geometric {
        /// Cooling factor in (0, 1).
        alpha: f64,
    },

    /// `T_k = T_0 - k * (T_0 - T_min) / steps`, where `steps` is the
    /// iteration budget of the run.
    Linear,

    /// `T_{k+1} = T_k / (1 + beta * T_k)`.
    LundyMees {
        /// Cooling parameter, positive.
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.9995 }
    }
}

impl CoolingSchedule {
    /// Validates the schedule parameters.
    pub fn validate(&self) -> Result<()> {
        match *self {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return Err(HyperError::InvalidConfiguration(format!(
                        "geometric alpha must be in (0, 1), got {alpha}"
                    )));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if !(beta > 0.0) || !beta.is_finite() {
                    return Err(HyperError::InvalidConfiguration(format!(
                        "lundy-mees beta must be positive, got {beta}"
                    )));
                }
            }
            CoolingSchedule::Constant | CoolingSchedule::Linear => {}
        }
        Ok(())
    }
}

/// Mutable state read by acceptance criteria.
///
/// Owned by one search run. Criteria only read it; the search loop calls
/// [`advance`](Self::advance) once per iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceState {
    temperature: f64,
    initial_temperature: f64,
    min_temperature: f64,
    cooling: CoolingSchedule,
    step: usize,
    total_steps: usize,
}

impl AcceptanceState {
    /// Creates the state at its initial temperature.
    ///
    /// `total_steps` is only used by [`CoolingSchedule::Linear`].
    pub fn new(
        initial_temperature: f64,
        min_temperature: f64,
        cooling: CoolingSchedule,
        total_steps: usize,
    ) -> Self {
        Self {
            temperature: initial_temperature,
            initial_temperature,
            min_temperature,
            cooling,
            step: 0,
            total_steps,
        }
    }

    /// Current temperature.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Current temperature relative to the initial one, in (0, 1].
    pub fn temperature_ratio(&self) -> f64 {
        if self.initial_temperature > 0.0 {
            self.temperature / self.initial_temperature
        } else {
            0.0
        }
    }

    /// Number of times [`advance`](Self::advance) has been called.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Applies one cooling step. Never drops below the minimum temperature.
    pub fn advance(&mut self) {
        let next = match self.cooling {
            CoolingSchedule::Constant => self.temperature,
            CoolingSchedule::Geometric { alpha } => self.temperature * alpha,
            CoolingSchedule::Linear => {
                if self.total_steps == 0 {
                    self.min_temperature
                } else {
                    self.initial_temperature
                        - (self.step + 1) as f64
                            * (self.initial_temperature - self.min_temperature)
                            / self.total_steps as f64
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                self.temperature / (1.0 + beta * self.temperature)
            }
        };
        self.temperature = next.max(self.min_temperature);
        self.step += 1;
    }

    /// Restores the initial temperature.
    pub fn reset(&mut self) {
        self.temperature = self.initial_temperature;
        self.step = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric() {
        let mut s = AcceptanceState::new(100.0, 1.0, CoolingSchedule::Geometric { alpha: 0.5 }, 0);
        s.advance();
        assert!((s.temperature() - 50.0).abs() < 1e-12);
        s.advance();
        assert!((s.temperature() - 25.0).abs() < 1e-12);
        assert_eq!(s.step(), 2);
        assert!((s.temperature_ratio() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_floor_at_min_temperature() {
        let mut s = AcceptanceState::new(10.0, 4.0, CoolingSchedule::Geometric { alpha: 0.5 }, 0);
        s.advance();
        s.advance();
        assert!((s.temperature() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear() {
        let mut s = AcceptanceState::new(10.0, 0.0, CoolingSchedule::Linear, 10);
        for _ in 0..5 {
            s.advance();
        }
        assert!((s.temperature() - 5.0).abs() < 1e-9);
        for _ in 0..10 {
            s.advance();
        }
        assert!((s.temperature() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_lundy_mees() {
        let mut s = AcceptanceState::new(1.0, 1e-6, CoolingSchedule::LundyMees { beta: 1.0 }, 0);
        s.advance();
        assert!((s.temperature() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_and_reset() {
        let mut s = AcceptanceState::new(3.0, 1.0, CoolingSchedule::Constant, 0);
        s.advance();
        assert!((s.temperature() - 3.0).abs() < 1e-12);

        let mut g = AcceptanceState::new(3.0, 1.0, CoolingSchedule::Geometric { alpha: 0.9 }, 0);
        g.advance();
        g.reset();
        assert!((g.temperature() - 3.0).abs() < 1e-12);
        assert_eq!(g.step(), 0);
    }

    #[test]
    fn test_validate() {
        assert!(CoolingSchedule::default().validate().is_ok());
        assert!(CoolingSchedule::Geometric { alpha: 1.0 }.validate().is_err());
        assert!(CoolingSchedule::LundyMees { beta: 0.0 }.validate().is_err());
        assert!(CoolingSchedule::Linear.validate().is_ok());
    }
}
