//! Drop inputs the constraint never mentions

use crate::derivation::{Alternative, Problem, SolutionBuilder};
use crate::ir::Identifier;
use crate::rules::{Rule, RuleContext, names};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnusedInputRule;

impl Rule for UnusedInputRule {
    fn name(&self) -> &str {
        "unused-input"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        let free = problem.constraint.free_vars();
        let (used, unused): (Vec<Identifier>, Vec<Identifier>) =
            problem.inputs.iter().cloned().partition(|i| free.contains(i));
        if unused.is_empty() {
            return Vec::new();
        }
        vec![Alternative::decompose(
            self.name(),
            format!("drop {}", names(&unused)),
            vec![problem.with_inputs(used)],
            SolutionBuilder::identity(),
        )]
    }
}
