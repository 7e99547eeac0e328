//! Rule instantiations: one way a rule solves or decomposes a task

use std::fmt;

use crate::derivation::{Problem, Solution};
use crate::error::{SynthError, SynthResult};

type BuildFn = dyn Fn(&[Solution]) -> Option<Solution>;

/// Recombines subtask solutions into a solution for the parent task
///
/// The builder receives subsolutions in the same order as the subproblems
/// of its alternative. Returning `None` rejects the combination (for
/// example when a final validation check fails); the parent task then waits
/// for another alternative.
pub struct SolutionBuilder {
    arity: usize,
    build: Box<BuildFn>,
}

impl SolutionBuilder {
    pub fn new(arity: usize, build: impl Fn(&[Solution]) -> Option<Solution> + 'static) -> Self {
        Self {
            arity,
            build: Box::new(build),
        }
    }

    /// Builder for a single subproblem
    pub fn unary(build: impl Fn(&Solution) -> Option<Solution> + 'static) -> Self {
        Self::new(1, move |subs| subs.first().and_then(&build))
    }

    /// Builder that passes the single subsolution through unchanged
    pub fn identity() -> Self {
        Self::unary(|s| Some(s.clone()))
    }

    /// Number of subsolutions the builder expects
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Apply the builder; `None` if the slice has the wrong length or the
    /// builder rejects the combination
    pub fn build(&self, subsolutions: &[Solution]) -> Option<Solution> {
        if subsolutions.len() != self.arity {
            return None;
        }
        (self.build)(subsolutions)
    }
}

impl fmt::Debug for SolutionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionBuilder")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// What applying an alternative yields
#[derive(Debug)]
pub enum AlternativeOutcome {
    /// The task is solved outright
    Solved(Solution),
    /// The task is reduced to subproblems, all of which must be solved
    Decompose {
        subproblems: Vec<Problem>,
        builder: SolutionBuilder,
    },
}

/// One way a rule applies to a task
#[derive(Debug)]
pub struct Alternative {
    /// Name of the rule that produced this alternative
    pub rule: String,
    /// Human-readable description for logs and tree export
    pub description: String,
    pub outcome: AlternativeOutcome,
}

impl Alternative {
    /// Immediately successful alternative
    pub fn solved(rule: impl Into<String>, description: impl Into<String>, solution: Solution) -> Self {
        Self {
            rule: rule.into(),
            description: description.into(),
            outcome: AlternativeOutcome::Solved(solution),
        }
    }

    /// Alternative reducing the task to `subproblems`
    pub fn decompose(
        rule: impl Into<String>,
        description: impl Into<String>,
        subproblems: Vec<Problem>,
        builder: SolutionBuilder,
    ) -> Self {
        Self {
            rule: rule.into(),
            description: description.into(),
            outcome: AlternativeOutcome::Decompose {
                subproblems,
                builder,
            },
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self.outcome, AlternativeOutcome::Solved(_))
    }

    /// Subproblems (empty for an immediate success)
    pub fn subproblems(&self) -> &[Problem] {
        match &self.outcome {
            AlternativeOutcome::Solved(_) => &[],
            AlternativeOutcome::Decompose { subproblems, .. } => subproblems,
        }
    }

    /// Check the alternative contract: a decomposition has at least one
    /// subproblem and a builder of matching arity
    pub fn check_contract(&self) -> SynthResult<()> {
        match &self.outcome {
            AlternativeOutcome::Solved(_) => Ok(()),
            AlternativeOutcome::Decompose {
                subproblems,
                builder,
            } => {
                if subproblems.is_empty() {
                    return Err(SynthError::empty_decomposition(&self.rule));
                }
                if builder.arity() != subproblems.len() {
                    return Err(SynthError::arity_mismatch(
                        &self.rule,
                        builder.arity(),
                        subproblems.len(),
                    ));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Expr, Identifier};

    fn leaf(name: &str) -> Problem {
        let y = Identifier::int(name);
        Problem::new(vec![], vec![y.clone()], Expr::eq(y.var(), Expr::IntLit(1)))
    }

    fn marker(v: i64) -> Solution {
        Solution::term(Expr::Tuple(vec![Expr::IntLit(v)]))
    }

    #[test]
    fn test_builder_checks_length() {
        let b = SolutionBuilder::new(2, |subs| Some(subs[0].clone()));
        assert!(b.build(&[marker(1)]).is_none());
        assert_eq!(b.build(&[marker(1), marker(2)]), Some(marker(1)));
    }

    #[test]
    fn test_identity_builder() {
        let b = SolutionBuilder::identity();
        assert_eq!(b.arity(), 1);
        assert_eq!(b.build(&[marker(7)]), Some(marker(7)));
    }

    #[test]
    fn test_contract_arity_mismatch() {
        let alt = Alternative::decompose(
            "split",
            "bad arity",
            vec![leaf("a"), leaf("b")],
            SolutionBuilder::identity(),
        );
        match alt.check_contract() {
            Err(SynthError::ArityMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected arity mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_contract_empty_decomposition() {
        let alt = Alternative::decompose("nothing", "", vec![], SolutionBuilder::new(0, |_| None));
        assert!(matches!(
            alt.check_contract(),
            Err(SynthError::EmptyDecomposition { .. })
        ));
    }

    #[test]
    fn test_immediate_has_no_subproblems() {
        let alt = Alternative::solved("ground", "constant", marker(3));
        assert!(alt.is_immediate());
        assert!(alt.subproblems().is_empty());
        assert!(alt.check_contract().is_ok());
        assert_eq!(format!("{}", alt), "[ground] constant");
    }
}
