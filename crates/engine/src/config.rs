//! Lifecycle tuning knobs.

use std::time::Duration;

use serde::Deserialize;

/// Timing and outcome parameters for the execution lifecycle.
///
/// Deserialises from a `[executor]` TOML table; every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Delay before a task-graph run resolves to completed.
    pub run_delay_ms: u64,
    /// Lower bound of the random deployment delay.
    pub deploy_min_delay_ms: u64,
    /// Upper bound of the random deployment delay.
    pub deploy_max_delay_ms: u64,
    /// Probability that a deployment resolves to completed, in `[0, 1]`.
    pub deploy_success_rate: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            run_delay_ms: 2000,
            deploy_min_delay_ms: 1000,
            deploy_max_delay_ms: 3000,
            deploy_success_rate: 0.95,
        }
    }
}

impl ExecutorConfig {
    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }

    /// The deployment delay bounds, ordered even if configured backwards.
    pub fn deploy_delay_bounds(&self) -> (Duration, Duration) {
        let lo = self.deploy_min_delay_ms.min(self.deploy_max_delay_ms);
        let hi = self.deploy_min_delay_ms.max(self.deploy_max_delay_ms);
        (Duration::from_millis(lo), Duration::from_millis(hi))
    }

    /// Success rate clamped into `[0, 1]`; NaN counts as certain failure.
    pub fn success_rate(&self) -> f64 {
        if self.deploy_success_rate.is_nan() {
            0.0
        } else {
            self.deploy_success_rate.clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_ordered() {
        let config = ExecutorConfig {
            deploy_min_delay_ms: 500,
            deploy_max_delay_ms: 100,
            ..Default::default()
        };
        assert_eq!(
            config.deploy_delay_bounds(),
            (Duration::from_millis(100), Duration::from_millis(500))
        );
    }

    #[test]
    fn success_rate_is_clamped() {
        let mut config = ExecutorConfig { deploy_success_rate: 1.5, ..Default::default() };
        assert_eq!(config.success_rate(), 1.0);
        config.deploy_success_rate = -0.2;
        assert_eq!(config.success_rate(), 0.0);
        config.deploy_success_rate = f64::NAN;
        assert_eq!(config.success_rate(), 0.0);
    }
}
