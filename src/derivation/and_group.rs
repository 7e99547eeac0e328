//! AND-groups: an alternative together with the subtasks it created

use crate::derivation::{AlternativeId, Solution, SolutionBuilder, TaskId};

/// Lifecycle of an AND-group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Some subtasks are still unsolved
    Pending,
    /// All subtasks solved and the builder produced a solution
    Completed,
    /// All subtasks solved but the builder declined the combination
    Rejected,
}

/// Result of delivering one subsolution to a group
#[derive(Debug, Clone, PartialEq)]
pub enum Contribution {
    /// Other subtasks are still outstanding
    Incomplete,
    /// The group completed; the parent's solution
    Complete(Solution),
    /// The group completed but its builder declined
    Rejected,
    /// The group had already finished; the subsolution is not used
    Ignored,
}

/// Bookkeeping for one decomposing alternative
#[derive(Debug)]
pub struct AndGroup {
    pub alternative: AlternativeId,
    pub parent: TaskId,
    pub subtasks: Vec<TaskId>,
    solutions: Vec<Option<Solution>>,
    remaining: usize,
    builder: SolutionBuilder,
    state: GroupState,
}

impl AndGroup {
    pub fn new(
        alternative: AlternativeId,
        parent: TaskId,
        subtasks: Vec<TaskId>,
        builder: SolutionBuilder,
    ) -> Self {
        let n = subtasks.len();
        Self {
            alternative,
            parent,
            subtasks,
            solutions: vec![None; n],
            remaining: n,
            builder,
            state: GroupState::Pending,
        }
    }

    pub fn state(&self) -> GroupState {
        self.state
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Record the solution of the subtask at `index`
    ///
    /// When the last outstanding subtask arrives, the builder runs on the
    /// subsolutions in subtask order.
    pub fn contribute(&mut self, index: usize, solution: Solution) -> Contribution {
        if self.state != GroupState::Pending {
            return Contribution::Ignored;
        }
        match self.solutions.get_mut(index) {
            Some(slot @ None) => *slot = Some(solution),
            _ => return Contribution::Ignored,
        }
        self.remaining -= 1;
        if self.remaining > 0 {
            return Contribution::Incomplete;
        }

        let subsolutions: Vec<Solution> = self.solutions.iter().flatten().cloned().collect();
        match self.builder.build(&subsolutions) {
            Some(solution) => {
                self.state = GroupState::Completed;
                Contribution::Complete(solution)
            }
            None => {
                self.state = GroupState::Rejected;
                Contribution::Rejected
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Expr;

    fn marker(v: i64) -> Solution {
        Solution::term(Expr::Tuple(vec![Expr::IntLit(v)]))
    }

    fn concat_builder() -> SolutionBuilder {
        SolutionBuilder::new(2, |subs| {
            let elems = subs
                .iter()
                .flat_map(|s| match &s.term {
                    Expr::Tuple(e) => e.clone(),
                    other => vec![other.clone()],
                })
                .collect();
            Some(Solution::term(Expr::Tuple(elems)))
        })
    }

    #[test]
    fn test_completes_in_declared_order() {
        let mut g = AndGroup::new(AlternativeId(0), TaskId(0), vec![TaskId(1), TaskId(2)], concat_builder());
        // Second subtask solves first; the builder still sees declared order.
        assert_eq!(g.contribute(1, marker(2)), Contribution::Incomplete);
        assert_eq!(g.remaining(), 1);
        assert_eq!(
            g.contribute(0, marker(1)),
            Contribution::Complete(Solution::term(Expr::Tuple(vec![
                Expr::IntLit(1),
                Expr::IntLit(2)
            ])))
        );
        assert_eq!(g.state(), GroupState::Completed);
    }

    #[test]
    fn test_duplicate_and_late_contributions_ignored() {
        let mut g = AndGroup::new(AlternativeId(0), TaskId(0), vec![TaskId(1), TaskId(2)], concat_builder());
        assert_eq!(g.contribute(0, marker(1)), Contribution::Incomplete);
        assert_eq!(g.contribute(0, marker(9)), Contribution::Ignored);
        assert!(matches!(g.contribute(1, marker(2)), Contribution::Complete(_)));
        assert_eq!(g.contribute(1, marker(3)), Contribution::Ignored);
        assert_eq!(g.contribute(5, marker(3)), Contribution::Ignored);
    }

    #[test]
    fn test_rejected_by_builder() {
        let builder = SolutionBuilder::new(1, |_| None);
        let mut g = AndGroup::new(AlternativeId(3), TaskId(0), vec![TaskId(1)], builder);
        assert_eq!(g.contribute(0, marker(1)), Contribution::Rejected);
        assert_eq!(g.state(), GroupState::Rejected);
    }
}
