//! Search result types and statistics

use crate::derivation::{DerivationTree, Problem, Solution};
use crate::oracle::OracleStatistics;
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOutcome {
    /// The root task was solved through the rule catalog
    Solved,
    /// The worklist emptied with the root unsolved; the placeholder is returned
    #[default]
    Exhausted,
    /// The time or expansion budget ran out; the placeholder is returned
    BudgetExceeded,
}

impl std::fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchOutcome::Solved => write!(f, "solved"),
            SearchOutcome::Exhausted => write!(f, "exhausted"),
            SearchOutcome::BudgetExceeded => write!(f, "budget exceeded"),
        }
    }
}

/// Result of a synthesis run
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub problem: Problem,
    /// Accepted solution for the root (possibly the placeholder)
    pub solution: Solution,
    /// Record of the run
    pub tree: DerivationTree,
    pub outcome: SearchOutcome,
    pub statistics: SearchStatistics,
}

impl SynthesisResult {
    /// Whether the solution is the unknown-witness placeholder
    pub fn is_placeholder(&self) -> bool {
        self.solution.is_placeholder()
    }

    /// Whether the solution contains no `choose`
    pub fn is_complete(&self) -> bool {
        self.solution.is_complete()
    }

    pub fn into_parts(self) -> (Solution, DerivationTree) {
        (self.solution, self.tree)
    }
}

/// Statistics from a synthesis run
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Total time spent searching
    pub elapsed_time: Duration,
    /// Tasks whose alternatives were generated
    pub expansions: u64,
    /// Tasks created, the root included
    pub tasks_created: u64,
    /// Subtasks created as dormant (never queued)
    pub dormant_tasks: u64,
    /// Popped worklist entries skipped because they or an ancestor were solved
    pub stale_skipped: u64,
    /// Alternatives generated across all expansions
    pub alternatives: u64,
    /// Tasks solved by an immediate alternative
    pub immediate_solutions: u64,
    /// Tasks solved by the placeholder because no rule applied
    pub placeholders: u64,
    pub groups_completed: u64,
    pub groups_rejected: u64,
    /// Deepest task created
    pub max_depth: usize,
    /// Oracle activity during the run
    pub oracle: OracleStatistics,
}

impl SearchStatistics {
    /// Average number of alternatives per expanded task
    pub fn branching_factor(&self) -> f64 {
        if self.expansions == 0 {
            0.0
        } else {
            self.alternatives as f64 / self.expansions as f64
        }
    }

    /// Expansions per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.expansions as f64 / secs
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Time: {:.2?}\n", self.elapsed_time));
        s.push_str(&format!("Expansions: {}\n", self.expansions));
        s.push_str(&format!("Throughput: {:.0} expansions/sec\n", self.throughput()));
        s.push_str(&format!(
            "Tasks created: {} ({} dormant)\n",
            self.tasks_created, self.dormant_tasks
        ));
        s.push_str(&format!(
            "Alternatives: {} ({:.2} per expansion)\n",
            self.alternatives,
            self.branching_factor()
        ));
        s.push_str(&format!("Immediate solutions: {}\n", self.immediate_solutions));
        s.push_str(&format!(
            "AND-groups completed: {}, rejected: {}\n",
            self.groups_completed, self.groups_rejected
        ));
        if self.placeholders > 0 {
            s.push_str(&format!("Placeholders: {}\n", self.placeholders));
        }
        if self.stale_skipped > 0 {
            s.push_str(&format!("Stale entries skipped: {}\n", self.stale_skipped));
        }
        s.push_str(&format!("Max depth: {}\n", self.max_depth));

        if self.oracle.queries > 0 {
            s.push_str(&format!("Oracle queries: {}\n", self.oracle.queries));
            s.push_str(&format!(
                "Oracle proved/refuted/unknown: {}/{}/{}\n",
                self.oracle.proved, self.oracle.refuted, self.oracle.unknown
            ));
            if self.oracle.backend_failures > 0 {
                s.push_str(&format!(
                    "Backend failures: {}\n",
                    self.oracle.backend_failures
                ));
            }
        }

        s
    }
}

impl std::fmt::Display for SynthesisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.outcome {
            SearchOutcome::Solved if self.is_placeholder() => {
                writeln!(f, "No rule applies; returning the placeholder.")?
            }
            SearchOutcome::Solved if self.is_complete() => writeln!(f, "Solution found!")?,
            SearchOutcome::Solved => writeln!(f, "Partial solution found.")?,
            SearchOutcome::Exhausted => {
                writeln!(f, "Search exhausted; returning the placeholder.")?
            }
            SearchOutcome::BudgetExceeded => {
                writeln!(f, "Budget exceeded; returning the placeholder.")?
            }
        }
        writeln!(f, "Problem:")?;
        writeln!(f, "  {}", self.problem)?;
        writeln!(f, "Solution (cost {}):", self.solution.cost)?;
        writeln!(f, "  {}", self.solution)?;
        Ok(())
    }
}
