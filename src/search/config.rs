//! Search configuration.

use std::time::Duration;

/// Configuration for the staged population search.
///
/// The search starts `2^stages` independent lineages and halves the
/// population after every generation, so later survivors receive
/// exponentially more refinement than early casualties.
///
/// # Examples
///
/// ```
/// use haulplan::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_stages(6)
///     .with_iterations(1000)
///     .with_seed(42);
/// assert_eq!(config.stages, 6);
/// ```
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of halving generations; the initial population holds
    /// `2^stages` lineages. With 0 stages a single lineage is refined
    /// through the full iteration budget.
    pub stages: u32,

    /// Iteration budget of the final generation. Generation `s` runs
    /// each surviving lineage through `iterations / 2^(stages - s - 1)`
    /// local-search steps.
    pub iterations: usize,

    /// Probability that one step keeps the current assignment instead of
    /// moving to the best neighbor. Drives diversification.
    pub p_random: f64,

    /// Random seed for reproducibility. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Wall-clock budget. When it expires, refinement stops at the next
    /// iteration boundary and the best assignment found so far is
    /// returned.
    pub deadline: Option<Duration>,

    /// Refine the lineages of a generation in parallel.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            stages: 8,
            iterations: 2000,
            p_random: 0.3,
            seed: None,
            deadline: None,
            parallel: true,
        }
    }
}

impl SearchConfig {
    pub fn with_stages(mut self, stages: u32) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_p_random(mut self, p: f64) -> Self {
        self.p_random = p;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.p_random) {
            return Err(format!("p_random must be in [0, 1], got {}", self.p_random));
        }
        if self.stages > 20 {
            return Err(format!(
                "stages must be at most 20 (2^{} lineages is unreasonable)",
                self.stages
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.stages, 8);
        assert_eq!(config.iterations, 2000);
        assert!((config.p_random - 0.3).abs() < 1e-12);
        assert!(config.seed.is_none());
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_validate_ok() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_p_random() {
        assert!(SearchConfig::default().with_p_random(1.5).validate().is_err());
        assert!(SearchConfig::default()
            .with_p_random(-0.1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_too_many_stages() {
        assert!(SearchConfig::default().with_stages(21).validate().is_err());
    }

    #[test]
    fn test_builders_chain() {
        let config = SearchConfig::default()
            .with_stages(3)
            .with_iterations(128)
            .with_p_random(0.5)
            .with_seed(9)
            .with_deadline(Duration::from_millis(250))
            .with_parallel(false);
        assert_eq!(config.stages, 3);
        assert_eq!(config.iterations, 128);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.deadline, Some(Duration::from_millis(250)));
        assert!(!config.parallel);
    }
}
