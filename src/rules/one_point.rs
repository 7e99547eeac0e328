//! One-point rule: eliminate an output fixed by an equation

use std::collections::BTreeMap;

use crate::derivation::{Alternative, Problem, Solution, SolutionBuilder};
use crate::ir::{Expr, Identifier};
use crate::rules::{Rule, RuleContext, bind_outputs};

/// A conjunct `o == e` (either orientation) where `o` is an output and `e`
/// does not mention `o` lets `o` be computed as `e`
///
/// The subproblem drops `o` and has `e` substituted for it everywhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnePointRule;

/// First defining equation among the conjuncts, with its position
fn find_definition(problem: &Problem, conjuncts: &[Expr]) -> Option<(usize, Identifier, Expr)> {
    conjuncts.iter().enumerate().find_map(|(i, c)| {
        let Expr::Eq(lhs, rhs) = c else {
            return None;
        };
        [(lhs, rhs), (rhs, lhs)].into_iter().find_map(|(side, other)| match side.as_ref() {
            Expr::Var(o) if problem.outputs.contains(o) && !other.mentions(o) => {
                Some((i, o.clone(), other.as_ref().clone()))
            }
            _ => None,
        })
    })
}

impl Rule for OnePointRule {
    fn name(&self) -> &str {
        "one-point"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        let conjuncts = problem.constraint.conjuncts();
        let Some((index, output, value)) = find_definition(problem, &conjuncts) else {
            return Vec::new();
        };

        let rest: Vec<Identifier> = problem
            .outputs
            .iter()
            .filter(|o| **o != output)
            .cloned()
            .collect();
        let map: BTreeMap<Identifier, Expr> =
            std::iter::once((output.clone(), value.clone())).collect();
        let constraint = Expr::and_all(
            conjuncts
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, c)| c.substitute(&map)),
        );
        let sub = Problem::new(problem.inputs.clone(), rest.clone(), constraint);

        let description = format!("{} := {}", output, value);
        let full = Expr::Tuple(
            problem
                .outputs
                .iter()
                .map(|o| if *o == output { value.clone() } else { o.var() })
                .collect(),
        );
        let builder = SolutionBuilder::unary(move |s| {
            Some(Solution::new(s.pre.clone(), bind_outputs(&rest, &s.term, full.clone())))
        });

        vec![Alternative::decompose(self.name(), description, vec![sub], builder)]
    }
}
