//! Optimizer configuration.

use std::time::Duration;

use crate::strategy::OptimizerStrategy;

/// Thresholds and safety valves for a [`QueryOptimizer`] run.
///
/// [`QueryOptimizer`]: crate::QueryOptimizer
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ecl_optimizer::{OptimizerConfig, OptimizerStrategy};
///
/// let config = OptimizerConfig::builder()
///     .with_strategy(OptimizerStrategy::Lossy)
///     .with_time_budget(Duration::from_secs(2))
///     .with_max_iterations(10)
///     .build();
/// assert!(config.strategy.is_lossy());
/// ```
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Strategy the greedy ancestor search starts in.
    pub strategy: OptimizerStrategy,
    /// Minimum precision for an inclusion refinement cell.
    pub refinement_precision: f64,
    /// Minimum true positives for an inclusion refinement cell.
    pub refinement_min_true_positives: usize,
    /// Maximum false positives for an inclusion refinement cell.
    pub refinement_max_false_positives: usize,
    /// Minimum true positives for an exclusion refinement cell. Exclusion
    /// cells additionally require exact precision: a wrongly excluded
    /// concept cannot be recovered, so no imprecision is tolerated.
    pub exclusion_refinement_min_true_positives: usize,
    /// Minimum number of target concepts an ancestor clause must cover.
    pub min_cluster_size: usize,
    /// Fitness score the greedy search initially requires.
    pub fit_threshold: f64,
    /// Lowest fitness score the greedy search may relax down to.
    pub fit_floor: f64,
    /// Amount the fitness requirement drops per relaxation.
    pub fit_step: f64,
    /// Initial zoom granularity of the greedy search.
    pub initial_zoom: u32,
    /// Zoom ceiling; zoom doubles per relaxation until it is reached.
    pub max_zoom: u32,
    /// Maximum number of greedy loop turns.
    pub max_iterations: usize,
    /// Wall-clock budget for the greedy loop.
    pub time_budget: Duration,
    /// False-positive rate tolerated by the lossy strategy.
    pub lossy_false_positive_rate: f64,
    /// Child count at which a low-precision candidate is rejected for
    /// inclusion use.
    pub large_fanout_children: usize,
    /// Member-child precision below which a large-fanout candidate is
    /// rejected for inclusion use.
    pub large_fanout_precision: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            strategy: OptimizerStrategy::Default,
            refinement_precision: 0.95,
            refinement_min_true_positives: 10,
            refinement_max_false_positives: 2,
            exclusion_refinement_min_true_positives: 5,
            min_cluster_size: 2,
            fit_threshold: 0.7,
            fit_floor: 0.3,
            fit_step: 0.1,
            initial_zoom: 1,
            max_zoom: 16,
            max_iterations: 30,
            time_budget: Duration::from_secs(5),
            lossy_false_positive_rate: 0.1,
            large_fanout_children: 10,
            large_fanout_precision: 0.5,
        }
    }
}

impl OptimizerConfig {
    /// Creates a new builder for OptimizerConfig.
    pub fn builder() -> OptimizerConfigBuilder {
        OptimizerConfigBuilder::default()
    }
}

/// Builder for OptimizerConfig.
#[derive(Debug, Clone)]
pub struct OptimizerConfigBuilder {
    config: OptimizerConfig,
}

impl Default for OptimizerConfigBuilder {
    fn default() -> Self {
        Self { config: OptimizerConfig::default() }
    }
}

impl OptimizerConfigBuilder {
    /// Sets the starting strategy.
    pub fn with_strategy(mut self, strategy: OptimizerStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Sets the inclusion refinement thresholds.
    pub fn with_refinement_thresholds(
        mut self,
        precision: f64,
        min_true_positives: usize,
        max_false_positives: usize,
    ) -> Self {
        self.config.refinement_precision = precision;
        self.config.refinement_min_true_positives = min_true_positives;
        self.config.refinement_max_false_positives = max_false_positives;
        self
    }

    /// Sets the exclusion refinement true-positive minimum.
    pub fn with_exclusion_refinement_min_true_positives(mut self, min: usize) -> Self {
        self.config.exclusion_refinement_min_true_positives = min;
        self
    }

    /// Sets the minimum ancestor cluster size.
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.config.min_cluster_size = size;
        self
    }

    /// Sets the fitness threshold, its floor, and the relaxation step.
    pub fn with_fit(mut self, threshold: f64, floor: f64, step: f64) -> Self {
        self.config.fit_threshold = threshold;
        self.config.fit_floor = floor;
        self.config.fit_step = step;
        self
    }

    /// Sets the initial and maximum zoom.
    pub fn with_zoom(mut self, initial: u32, max: u32) -> Self {
        self.config.initial_zoom = initial;
        self.config.max_zoom = max;
        self
    }

    /// Sets the greedy loop iteration cap.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Sets the greedy loop wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.config.time_budget = budget;
        self
    }

    /// Sets the false-positive rate tolerated by the lossy strategy.
    pub fn with_lossy_false_positive_rate(mut self, rate: f64) -> Self {
        self.config.lossy_false_positive_rate = rate;
        self
    }

    /// Sets the large-fanout rejection bounds.
    pub fn with_large_fanout(mut self, children: usize, precision: f64) -> Self {
        self.config.large_fanout_children = children;
        self.config.large_fanout_precision = precision;
        self
    }

    /// Builds the OptimizerConfig.
    pub fn build(self) -> OptimizerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizerConfig::default();
        assert_eq!(config.strategy, OptimizerStrategy::Default);
        assert_eq!(config.refinement_min_true_positives, 10);
        assert_eq!(config.exclusion_refinement_min_true_positives, 5);
        assert_eq!(config.min_cluster_size, 2);
        assert_eq!(config.max_iterations, 30);
        assert_eq!(config.time_budget, Duration::from_secs(5));
        assert!(config.fit_floor < config.fit_threshold);
    }

    #[test]
    fn test_builder_overrides() {
        let config = OptimizerConfig::builder()
            .with_strategy(OptimizerStrategy::Lossy)
            .with_refinement_thresholds(0.9, 5, 1)
            .with_min_cluster_size(3)
            .with_fit(0.8, 0.4, 0.2)
            .with_zoom(2, 8)
            .with_max_iterations(12)
            .with_time_budget(Duration::from_millis(250))
            .with_lossy_false_positive_rate(0.25)
            .with_large_fanout(20, 0.4)
            .build();

        assert!(config.strategy.is_lossy());
        assert_eq!(config.refinement_precision, 0.9);
        assert_eq!(config.refinement_min_true_positives, 5);
        assert_eq!(config.refinement_max_false_positives, 1);
        assert_eq!(config.min_cluster_size, 3);
        assert_eq!(config.fit_threshold, 0.8);
        assert_eq!(config.initial_zoom, 2);
        assert_eq!(config.max_zoom, 8);
        assert_eq!(config.max_iterations, 12);
        assert_eq!(config.time_budget, Duration::from_millis(250));
        assert_eq!(config.lossy_false_positive_rate, 0.25);
        assert_eq!(config.large_fanout_children, 20);
    }
}
