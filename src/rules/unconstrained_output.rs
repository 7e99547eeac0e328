//! Outputs the constraint never mentions take default values

use crate::derivation::{Alternative, Problem, Solution, SolutionBuilder};
use crate::ir::{Expr, Identifier};
use crate::rules::{Rule, RuleContext, bind_outputs, names};

#[derive(Debug, Default, Clone, Copy)]
pub struct UnconstrainedOutputRule;

impl Rule for UnconstrainedOutputRule {
    fn name(&self) -> &str {
        "unconstrained-output"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        let constrained = problem.constrained_outputs();
        if constrained.len() == problem.outputs.len() {
            return Vec::new();
        }
        let unconstrained: Vec<Identifier> = problem
            .outputs
            .iter()
            .filter(|o| !constrained.contains(o))
            .cloned()
            .collect();
        let description = format!("default {}", names(&unconstrained));

        if constrained.is_empty() {
            return vec![Alternative::solved(
                self.name(),
                description,
                Solution::new(problem.constraint.clone(), problem.default_term()),
            )];
        }

        let full = Expr::Tuple(
            problem
                .outputs
                .iter()
                .map(|o| {
                    if constrained.contains(o) {
                        o.var()
                    } else {
                        o.ty.default_value()
                    }
                })
                .collect(),
        );
        let sub = problem.with_outputs(constrained.clone());
        let builder = SolutionBuilder::unary(move |s| {
            Some(Solution::new(
                s.pre.clone(),
                bind_outputs(&constrained, &s.term, full.clone()),
            ))
        });
        vec![Alternative::decompose(self.name(), description, vec![sub], builder)]
    }
}
