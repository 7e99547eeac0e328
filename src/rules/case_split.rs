//! Case analysis on a top-level disjunction

use crate::derivation::{Alternative, Problem, Solution, SolutionBuilder};
use crate::ir::Expr;
use crate::rules::{Rule, RuleContext};

/// `c1 || ... || cn` is solved by solving each `ci` separately and
/// dispatching on their preconditions, first match wins
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseSplitRule;

impl Rule for CaseSplitRule {
    fn name(&self) -> &str {
        "case-split"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        let cases = problem.constraint.disjuncts();
        if cases.len() < 2 {
            return Vec::new();
        }
        let subproblems: Vec<Problem> = cases
            .into_iter()
            .map(|c| problem.with_constraint(c))
            .collect();
        let description = format!("{} cases", subproblems.len());
        let builder = SolutionBuilder::new(subproblems.len(), |sols: &[Solution]| {
            let (last, init) = sols.split_last()?;
            let term = init.iter().rev().fold(last.term.clone(), |acc, s| {
                Expr::ite(s.pre.clone(), s.term.clone(), acc)
            });
            let pre = Expr::or_all(sols.iter().map(|s| s.pre.clone()));
            Some(Solution::new(pre, term))
        });
        vec![Alternative::decompose(self.name(), description, subproblems, builder)]
    }
}
