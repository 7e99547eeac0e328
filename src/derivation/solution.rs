//! Synthesized solutions and the placeholder "unknown witness"

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::derivation::Problem;
use crate::ir::Expr;

/// Extra cost charged for each `choose` left in a program
const CHOOSE_COST: u64 = 100;

/// A solution to a [`Problem`]
///
/// Whenever the inputs satisfy `pre`, `term` evaluates to a tuple of output
/// values satisfying the problem's constraint. `cost` only orders solutions
/// for display; it never affects correctness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Solution {
    pub pre: Expr,
    pub term: Expr,
    pub cost: u64,
}

impl Solution {
    pub fn new(pre: Expr, term: Expr) -> Self {
        let cost = expr_cost(&pre) + expr_cost(&term);
        Self { pre, term, cost }
    }

    /// Unconditional solution
    pub fn term(term: Expr) -> Self {
        Self::new(Expr::t(), term)
    }

    /// The placeholder: an unconstrained choice of outputs satisfying the
    /// constraint by existential assumption
    pub fn choose(problem: &Problem) -> Self {
        Self::term(Expr::choose(
            problem.outputs.clone(),
            problem.constraint.clone(),
        ))
    }

    /// Solution for a problem whose constraint has no model
    pub fn unsat(problem: &Problem) -> Self {
        Self::new(Expr::f(), problem.default_term())
    }

    /// Whether this is exactly the placeholder for some problem
    pub fn is_placeholder(&self) -> bool {
        self.pre == Expr::t() && matches!(self.term, Expr::Choose { .. })
    }

    /// Whether the program is fully executable (no `choose` anywhere)
    pub fn is_complete(&self) -> bool {
        !self.term.contains_choose() && !self.pre.contains_choose()
    }

    /// Whole program for `problem`: the term guarded by the precondition,
    /// with the placeholder covering inputs outside it
    pub fn to_program(&self, problem: &Problem) -> Expr {
        Expr::ite(
            self.pre.clone(),
            self.term.clone(),
            Expr::choose(problem.outputs.clone(), problem.constraint.clone()),
        )
    }
}

/// Node count, with placeholders charged extra
pub fn expr_cost(expr: &Expr) -> u64 {
    let mut cost = 0u64;
    expr.visit(&mut |e| {
        cost += if matches!(e, Expr::Choose { .. }) {
            CHOOSE_COST
        } else {
            1
        };
    });
    cost
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let term = match &self.term {
            Expr::Tuple(elems) if elems.len() == 1 => &elems[0],
            other => other,
        };
        if self.pre == Expr::t() {
            write!(f, "{}", term)
        } else {
            write!(f, "{{ {} }} {}", self.pre, term)
        }
    }
}
