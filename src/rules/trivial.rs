//! Problems with nothing to compute

use crate::derivation::{Alternative, Problem, Solution};
use crate::ir::Expr;
use crate::rules::{Rule, RuleContext};

/// No outputs: the constraint is only a condition on the inputs, so it
/// becomes the precondition of the empty tuple
#[derive(Debug, Default, Clone, Copy)]
pub struct TrivialRule;

impl Rule for TrivialRule {
    fn name(&self) -> &str {
        "trivial"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        if !problem.outputs.is_empty() {
            return Vec::new();
        }
        vec![Alternative::solved(
            self.name(),
            "no outputs",
            Solution::new(problem.constraint.clone(), Expr::unit()),
        )]
    }
}
