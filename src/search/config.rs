//! Configuration for synthesis runs

use crate::search::cost::CostMetric;
use std::time::Duration;

/// Main search configuration
///
/// The default is unbounded; callers that need a budget set one.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Wall-clock budget for one run (None = unbounded)
    pub timeout: Option<Duration>,
    /// Maximum number of task expansions (None = unbounded)
    pub max_expansions: Option<u64>,
    /// Worklist priority estimate
    pub cost_metric: CostMetric,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_expansions: None,
            cost_metric: CostMetric::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_option(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_expansions(mut self, max: u64) -> Self {
        self.max_expansions = Some(max);
        self
    }

    pub fn with_max_expansions_option(mut self, max: Option<u64>) -> Self {
        self.max_expansions = max;
        self
    }

    pub fn with_cost_metric(mut self, metric: CostMetric) -> Self {
        self.cost_metric = metric;
        self
    }

    /// No time or expansion limit
    pub fn unbounded(mut self) -> Self {
        self.timeout = None;
        self.max_expansions = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.timeout, None);
        assert_eq!(config.max_expansions, None);
        assert_eq!(config.cost_metric, CostMetric::ConstraintSize);
    }

    #[test]
    fn test_search_config_builder() {
        let config = SearchConfig::default()
            .with_timeout(Duration::from_millis(250))
            .with_max_expansions(10)
            .with_cost_metric(CostMetric::Depth);

        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.max_expansions, Some(10));
        assert_eq!(config.cost_metric, CostMetric::Depth);
    }

    #[test]
    fn test_unbounded() {
        let config = SearchConfig::default().with_max_expansions(3).unbounded();
        assert!(config.timeout.is_none());
        assert!(config.max_expansions.is_none());
    }
}
