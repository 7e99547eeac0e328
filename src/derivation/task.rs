//! Derivation tree nodes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::derivation::{Problem, Solution};

/// Stable index of a task in the derivation tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub usize);

/// Stable index of an alternative in the derivation tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlternativeId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl fmt::Display for AlternativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// Worklist ordering key, fixed when the task is created (lower first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Priority(pub u64);

/// Search state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Queued, not yet expanded
    Pending,
    /// Created by an alternative that lost to an immediate success; never queued
    Dormant,
    /// Alternatives generated; waiting for one of its AND-groups to complete
    Expanded,
    /// Solution accepted
    Solved,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Dormant => write!(f, "dormant"),
            TaskStatus::Expanded => write!(f, "expanded"),
            TaskStatus::Solved => write!(f, "solved"),
        }
    }
}

/// Position of a subtask inside its parent's AND-group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    pub task: TaskId,
    pub alternative: AlternativeId,
    /// Index among the alternative's subtasks
    pub index: usize,
}

/// How a task obtained its solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolvedVia {
    /// An immediately successful alternative
    Immediate(AlternativeId),
    /// A completed AND-group
    Group(AlternativeId),
    /// No rule applied; the placeholder was admitted
    Placeholder,
}

impl SolvedVia {
    pub fn alternative(&self) -> Option<AlternativeId> {
        match self {
            SolvedVia::Immediate(id) | SolvedVia::Group(id) => Some(*id),
            SolvedVia::Placeholder => None,
        }
    }
}

/// A node of the derivation tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub problem: Problem,
    /// Absent only for the root
    pub parent: Option<ParentLink>,
    pub priority: Priority,
    pub depth: usize,
    status: TaskStatus,
    solution: Option<Solution>,
    solved_via: Option<SolvedVia>,
    /// Alternatives generated when the task was expanded, in catalog order
    alternatives: Vec<AlternativeId>,
    /// Subtasks of all alternatives, in creation order
    children: Vec<TaskId>,
}

impl Task {
    pub(crate) fn new(
        id: TaskId,
        problem: Problem,
        parent: Option<ParentLink>,
        priority: Priority,
        depth: usize,
        status: TaskStatus,
    ) -> Self {
        Self {
            id,
            problem,
            parent,
            priority,
            depth,
            status,
            solution: None,
            solved_via: None,
            alternatives: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_solved(&self) -> bool {
        self.status == TaskStatus::Solved
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    pub fn solved_via(&self) -> Option<SolvedVia> {
        self.solved_via
    }

    pub fn alternatives(&self) -> &[AlternativeId] {
        &self.alternatives
    }

    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    /// Record the accepted solution; returns false (and changes nothing)
    /// if the task was already solved
    pub(crate) fn mark_solved(&mut self, solution: Solution, via: SolvedVia) -> bool {
        if self.is_solved() {
            return false;
        }
        self.status = TaskStatus::Solved;
        self.solution = Some(solution);
        self.solved_via = Some(via);
        true
    }

    pub(crate) fn mark_expanded(&mut self) {
        if self.status == TaskStatus::Pending {
            self.status = TaskStatus::Expanded;
        }
    }

    pub(crate) fn push_alternative(&mut self, id: AlternativeId) {
        self.alternatives.push(id);
    }

    pub(crate) fn push_child(&mut self, id: TaskId) {
        self.children.push(id);
    }
}
