//! Structured search events and the sinks that receive them
//!
//! The engine reports every state change to a [`SearchObserver`] passed in
//! by the caller. The default [`TracingObserver`] forwards events to
//! `tracing`; tests use [`RecordingObserver`] to inspect a run.

use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::derivation::{AlternativeId, DerivationTree, Priority, SolvedVia, TaskId};
use crate::search::result::SearchOutcome;

/// Which budget stopped a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Timeout(Duration),
    Expansions(u64),
}

/// A state change during a run
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    TaskCreated {
        task: TaskId,
        parent: Option<TaskId>,
        priority: Priority,
        /// Created for a non-winning alternative; never queued
        dormant: bool,
    },
    /// A popped task was skipped because it or an ancestor was already solved
    TaskSkipped { task: TaskId },
    TaskExpanded { task: TaskId, alternatives: usize },
    TaskSolved { task: TaskId, via: SolvedVia },
    GroupRejected { task: TaskId, alternative: AlternativeId },
    BudgetExceeded { budget: Budget },
    RunFinished { outcome: SearchOutcome, expansions: u64 },
}

/// Receiver of search events
///
/// The tree is passed alongside each event so a sink can look up the
/// problems and alternatives an event refers to.
pub trait SearchObserver {
    fn on_event(&mut self, event: &SearchEvent, tree: &DerivationTree);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SearchObserver for NullObserver {
    fn on_event(&mut self, _event: &SearchEvent, _tree: &DerivationTree) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_event(&mut self, event: &SearchEvent, tree: &DerivationTree) {
        match event {
            SearchEvent::TaskCreated {
                task,
                parent,
                priority,
                dormant,
            } => {
                trace!(task = task.0, parent = ?parent.map(|p| p.0), priority = priority.0, dormant, "task_created");
            }
            SearchEvent::TaskSkipped { task } => trace!(task = task.0, "task_skipped"),
            SearchEvent::TaskExpanded { task, alternatives } => {
                if let Some(t) = tree.task(*task) {
                    debug!(task = task.0, depth = t.depth, alternatives, problem = %t.problem, "task_expanded");
                }
            }
            SearchEvent::TaskSolved { task, via } => {
                let rule = via
                    .alternative()
                    .and_then(|a| tree.alternative(a))
                    .map(|a| a.rule.as_str())
                    .unwrap_or("placeholder");
                match tree.task(*task).and_then(|t| t.solution()) {
                    Some(solution) => debug!(task = task.0, rule, solution = %solution, "task_solved"),
                    None => debug!(task = task.0, rule, "task_solved"),
                }
            }
            SearchEvent::GroupRejected { task, alternative } => {
                let rule = tree.alternative(*alternative).map(|a| a.rule.as_str());
                debug!(task = task.0, rule = ?rule, "group_rejected");
            }
            SearchEvent::BudgetExceeded { budget } => match budget {
                Budget::Timeout(limit) => warn!(limit = ?limit, "search_timeout"),
                Budget::Expansions(limit) => warn!(limit, "expansion_budget_exhausted"),
            },
            SearchEvent::RunFinished {
                outcome,
                expansions,
            } => {
                if *outcome == SearchOutcome::Solved {
                    info!(outcome = %outcome, expansions, tasks = tree.len(), "search_finished");
                } else {
                    warn!(outcome = %outcome, expansions, tasks = tree.len(), "search_degraded");
                }
            }
        }
    }
}

/// Keeps every event, for inspection after the run
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub events: Vec<SearchEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks expanded, in expansion order
    pub fn expanded(&self) -> Vec<TaskId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::TaskExpanded { task, .. } => Some(*task),
                _ => None,
            })
            .collect()
    }

    /// Tasks solved, in solve order
    pub fn solved(&self) -> Vec<TaskId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::TaskSolved { task, .. } => Some(*task),
                _ => None,
            })
            .collect()
    }
}

impl SearchObserver for RecordingObserver {
    fn on_event(&mut self, event: &SearchEvent, _tree: &DerivationTree) {
        self.events.push(event.clone());
    }
}
