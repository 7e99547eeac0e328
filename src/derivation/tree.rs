//! Append-only record of a synthesis run
//!
//! The engine owns the tree while searching and hands it back read-only
//! once the run ends. Tasks and alternatives live in index-addressed
//! arenas; parent and child relations are stored as ids.

use serde::Serialize;
use std::fmt;

use crate::derivation::{
    AlternativeId, ParentLink, Priority, Problem, Solution, SolvedVia, Task, TaskId, TaskStatus,
};

/// Lifecycle of an alternative as recorded in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlternativeState {
    /// Generated but never used to solve its task
    Open,
    /// Solved its task
    Accepted,
    /// All subtasks solved, builder declined the combination
    Rejected,
}

/// An alternative as recorded in the tree
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeRecord {
    pub id: AlternativeId,
    /// Task the alternative was generated for
    pub task: TaskId,
    pub rule: String,
    pub description: String,
    pub immediate: bool,
    pub subtasks: Vec<TaskId>,
    pub state: AlternativeState,
}

impl fmt::Display for AlternativeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.description)
    }
}

/// Task/alternative graph of one run
#[derive(Debug, Clone, Serialize)]
pub struct DerivationTree {
    tasks: Vec<Task>,
    alternatives: Vec<AlternativeRecord>,
    root: TaskId,
}

impl DerivationTree {
    /// Tree holding only the root task for `problem`
    pub(crate) fn new(problem: Problem, priority: Priority) -> Self {
        let root = TaskId(0);
        Self {
            tasks: vec![Task::new(root, problem, None, priority, 0, TaskStatus::Pending)],
            alternatives: Vec::new(),
            root,
        }
    }

    pub fn root(&self) -> TaskId {
        self.root
    }

    pub fn root_task(&self) -> &Task {
        &self.tasks[self.root.0]
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks, in creation order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    /// All alternatives, in creation order
    pub fn alternatives(&self) -> &[AlternativeRecord] {
        &self.alternatives
    }

    pub fn alternative(&self, id: AlternativeId) -> Option<&AlternativeRecord> {
        self.alternatives.get(id.0)
    }

    /// Subtasks of every alternative of `id`, in creation order
    pub fn children(&self, id: TaskId) -> &[TaskId] {
        self.task(id).map(Task::children).unwrap_or(&[])
    }

    /// Alternatives generated for `id`, in catalog order
    pub fn alternatives_of(&self, id: TaskId) -> Vec<&AlternativeRecord> {
        self.task(id)
            .map(|t| {
                t.alternatives()
                    .iter()
                    .filter_map(|a| self.alternative(*a))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The alternative that solved `id`, if it was solved by one
    pub fn chosen_alternative(&self, id: TaskId) -> Option<&AlternativeRecord> {
        self.task(id)
            .and_then(Task::solved_via)
            .and_then(|via| via.alternative())
            .and_then(|a| self.alternative(a))
    }

    pub fn parent(&self, id: TaskId) -> Option<TaskId> {
        self.task(id).and_then(|t| t.parent).map(|link| link.task)
    }

    /// Whether `id` or any of its ancestors is solved
    pub fn is_settled(&self, id: TaskId) -> bool {
        let mut current = Some(id);
        while let Some(tid) = current {
            match self.task(tid) {
                Some(task) if task.is_solved() => return true,
                Some(task) => current = task.parent.map(|link| link.task),
                None => return false,
            }
        }
        false
    }

    pub fn root_solution(&self) -> Option<&Solution> {
        self.root_task().solution()
    }

    pub fn solved_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_solved()).count()
    }

    /// Tasks whose alternatives were generated (solved or not)
    pub fn expanded_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| {
                t.status() == TaskStatus::Expanded
                    || !t.alternatives().is_empty()
                    || t.solved_via() == Some(SolvedVia::Placeholder)
            })
            .count()
    }

    /// Pre-order traversal from the root
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![(self.root, 0)],
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn add_task(
        &mut self,
        problem: Problem,
        parent: ParentLink,
        priority: Priority,
        status: TaskStatus,
    ) -> TaskId {
        let id = TaskId(self.tasks.len());
        let depth = self.tasks[parent.task.0].depth + 1;
        self.tasks
            .push(Task::new(id, problem, Some(parent), priority, depth, status));
        self.tasks[parent.task.0].push_child(id);
        if let Some(alt) = self.alternatives.get_mut(parent.alternative.0) {
            alt.subtasks.push(id);
        }
        id
    }

    pub(crate) fn add_alternative(
        &mut self,
        task: TaskId,
        rule: &str,
        description: &str,
        immediate: bool,
    ) -> AlternativeId {
        let id = AlternativeId(self.alternatives.len());
        self.alternatives.push(AlternativeRecord {
            id,
            task,
            rule: rule.to_string(),
            description: description.to_string(),
            immediate,
            subtasks: Vec::new(),
            state: AlternativeState::Open,
        });
        self.tasks[task.0].push_alternative(id);
        id
    }

    pub(crate) fn mark_expanded(&mut self, id: TaskId) {
        self.tasks[id.0].mark_expanded();
    }

    /// Record the solution of `id`; false if it was already solved
    pub(crate) fn mark_solved(&mut self, id: TaskId, solution: Solution, via: SolvedVia) -> bool {
        let solved = self.tasks[id.0].mark_solved(solution, via);
        if solved {
            if let Some(alt) = via.alternative() {
                self.set_alternative_state(alt, AlternativeState::Accepted);
            }
        }
        solved
    }

    pub(crate) fn set_alternative_state(&mut self, id: AlternativeId, state: AlternativeState) {
        if let Some(alt) = self.alternatives.get_mut(id.0) {
            alt.state = state;
        }
    }
}

/// A task visited by [`DerivationTree::walk`]
#[derive(Debug, Clone, Copy)]
pub struct WalkEntry<'a> {
    pub task: &'a Task,
    /// Distance from the root
    pub level: usize,
    pub chosen: Option<&'a AlternativeRecord>,
}

/// Pre-order iterator over the tree
pub struct Walk<'a> {
    tree: &'a DerivationTree,
    stack: Vec<(TaskId, usize)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, level) = self.stack.pop()?;
        let task = self.tree.task(id)?;
        for child in task.children().iter().rev() {
            self.stack.push((*child, level + 1));
        }
        Some(WalkEntry {
            task,
            level,
            chosen: self.tree.chosen_alternative(id),
        })
    }
}

impl fmt::Display for DerivationTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.walk() {
            let indent = "  ".repeat(entry.level);
            write!(
                f,
                "{}{} [{}] {}",
                indent, entry.task.id, entry.task.status(), entry.task.problem
            )?;
            match (entry.chosen, entry.task.solution()) {
                (Some(alt), Some(sol)) => writeln!(f, " via {} => {}", alt, sol)?,
                (None, Some(sol)) => writeln!(f, " => {}", sol)?,
                _ => writeln!(f)?,
            }
        }
        Ok(())
    }
}
