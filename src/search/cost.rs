//! Priority estimates for the worklist

use crate::derivation::{Priority, Problem};

/// How a task's worklist priority is estimated (lower is expanded first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostMetric {
    /// Node count of the constraint plus the number of outputs (default)
    #[default]
    ConstraintSize,
    /// Number of outputs still to be produced
    OutputCount,
    /// Depth in the derivation tree (breadth-first)
    Depth,
}

impl std::fmt::Display for CostMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostMetric::ConstraintSize => write!(f, "constraint-size"),
            CostMetric::OutputCount => write!(f, "output-count"),
            CostMetric::Depth => write!(f, "depth"),
        }
    }
}

impl std::str::FromStr for CostMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "constraint-size" | "size" => Ok(CostMetric::ConstraintSize),
            "output-count" | "outputs" => Ok(CostMetric::OutputCount),
            "depth" | "bfs" => Ok(CostMetric::Depth),
            _ => Err(format!(
                "Unknown cost metric: '{}'. Valid options: constraint-size, output-count, depth",
                s
            )),
        }
    }
}

/// Priority of a task for `problem` created at `depth`
///
/// Depends only on the problem and its depth, so it can be fixed when the
/// task is created.
pub fn priority(problem: &Problem, depth: usize, metric: CostMetric) -> Priority {
    let estimate = match metric {
        CostMetric::ConstraintSize => problem.size() as u64,
        CostMetric::OutputCount => problem.outputs.len() as u64,
        CostMetric::Depth => 0,
    };
    // Depth breaks ties in favour of shallower tasks under every metric.
    Priority(estimate.saturating_mul(1024).saturating_add(depth as u64))
}
