//! Move output-free conjuncts into the precondition

use crate::derivation::{Alternative, Problem, Solution, SolutionBuilder};
use crate::ir::Expr;
use crate::rules::{Rule, RuleContext};

/// Conjuncts that mention no output cannot be influenced by the program;
/// they become part of the precondition
#[derive(Debug, Default, Clone, Copy)]
pub struct AssertRule;

impl Rule for AssertRule {
    fn name(&self) -> &str {
        "assert"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        if problem.outputs.is_empty() {
            return Vec::new();
        }
        let (assumed, rest): (Vec<Expr>, Vec<Expr>) = problem
            .constraint
            .conjuncts()
            .into_iter()
            .partition(|c| !c.mentions_any(&problem.outputs));
        if assumed.is_empty() {
            return Vec::new();
        }

        let pre = Expr::and_all(assumed);
        let description = format!("assume {}", pre);
        if rest.is_empty() {
            return vec![Alternative::solved(
                self.name(),
                description,
                Solution::new(pre, problem.default_term()),
            )];
        }

        let sub = problem.with_constraint(Expr::and_all(rest));
        let builder = SolutionBuilder::unary(move |s| {
            Some(Solution::new(
                Expr::and_all(vec![pre.clone(), s.pre.clone()]),
                s.term.clone(),
            ))
        });
        vec![Alternative::decompose(self.name(), description, vec![sub], builder)]
    }
}
