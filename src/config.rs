use std::ops::RangeInclusive;

use crate::error::ConfigError;

/// Monthly income drawn for each citizen at creation.
pub const INCOME_RANGE: RangeInclusive<u32> = 2_000..=10_000;

/// Credit score drawn for each citizen at creation.
pub const CREDIT_SCORE_RANGE: RangeInclusive<u32> = 500..=800;

/// Chance that a citizen applies for a loan on any given day.
pub const APPLY_PROBABILITY: f64 = 0.30;

/// Daily default risk per 10 points of interest rate, before the
/// personality multiplier. The rate is used as raw percentage points.
pub const BASE_DEFAULT_RISK: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    pub n_agents: usize,
    /// Percentage points, e.g. 8.5 for 8.5%.
    pub interest_rate: f64,
    pub days: u32,
}

impl SimulationConfig {
    /// Reference city: 200 citizens at 8.5% over one week.
    pub fn canonical() -> Self {
        SimulationConfig { seed: 42, n_agents: 200, interest_rate: 8.5, days: 7 }
    }

    /// Config for the `run`-th of several consecutive seeds starting at
    /// `self.seed`. Seeds wrap past `u64::MAX`.
    pub fn nth_run(&self, run: u64) -> Self {
        SimulationConfig { seed: self.seed.wrapping_add(run), ..self.clone() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.interest_rate.is_finite() || self.interest_rate < 0.0 {
            return Err(ConfigError::InterestRate(self.interest_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_config_is_valid() {
        assert!(SimulationConfig::canonical().validate().is_ok());
    }

    #[test]
    fn nan_interest_rate_rejected() {
        let config = SimulationConfig { interest_rate: f64::NAN, ..SimulationConfig::canonical() };
        assert!(matches!(config.validate(), Err(ConfigError::InterestRate(_))));
    }

    #[test]
    fn negative_interest_rate_rejected() {
        let config = SimulationConfig { interest_rate: -1.0, ..SimulationConfig::canonical() };
        assert_eq!(config.validate(), Err(ConfigError::InterestRate(-1.0)));
    }

    #[test]
    fn zero_agents_is_a_valid_city() {
        let config = SimulationConfig { n_agents: 0, ..SimulationConfig::canonical() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nth_run_offsets_seed_and_wraps() {
        let base = SimulationConfig { seed: u64::MAX, ..SimulationConfig::canonical() };
        assert_eq!(base.nth_run(0).seed, u64::MAX);
        assert_eq!(base.nth_run(1).seed, 0);
        assert_eq!(base.nth_run(2).seed, 1);
        assert_eq!(base.nth_run(1).n_agents, base.n_agents);
    }
}
