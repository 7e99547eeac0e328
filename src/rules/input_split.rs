//! Branch on a boolean input

use std::collections::BTreeMap;

use crate::derivation::{Alternative, Problem, Solution, SolutionBuilder};
use crate::ir::{Expr, Identifier, Type};
use crate::rules::{Rule, RuleContext};

/// Picks the first boolean input the constraint mentions and solves the
/// problem once for each of its values
#[derive(Debug, Default, Clone, Copy)]
pub struct InputSplitRule;

impl Rule for InputSplitRule {
    fn name(&self) -> &str {
        "input-split"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        let free = problem.constraint.free_vars();
        let Some(flag) = problem
            .inputs
            .iter()
            .find(|i| i.ty == Type::Bool && free.contains(*i))
            .cloned()
        else {
            return Vec::new();
        };

        let rest: Vec<Identifier> = problem
            .inputs
            .iter()
            .filter(|i| **i != flag)
            .cloned()
            .collect();
        let fixed = |value: bool| {
            let map = BTreeMap::from([(flag.clone(), Expr::BoolLit(value))]);
            Problem::new(
                rest.clone(),
                problem.outputs.clone(),
                problem.constraint.substitute(&map),
            )
        };
        let subproblems = vec![fixed(true), fixed(false)];

        let description = format!("on {}", flag);
        let cond = flag.var();
        let builder = SolutionBuilder::new(2, move |sols: &[Solution]| {
            let [then, els] = sols else {
                return None;
            };
            Some(Solution::new(
                Expr::ite(cond.clone(), then.pre.clone(), els.pre.clone()),
                Expr::ite(cond.clone(), then.term.clone(), els.term.clone()),
            ))
        });
        vec![Alternative::decompose(self.name(), description, subproblems, builder)]
    }
}
