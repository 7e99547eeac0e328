//! What rules may consult while generating alternatives

use crate::derivation::{Problem, Solution};
use crate::ir::Expr;
use crate::oracle::{Oracle, Verdict};

/// Services available to a rule during one expansion
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    oracle: &'a Oracle,
}

impl<'a> RuleContext<'a> {
    pub fn new(oracle: &'a Oracle) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &'a Oracle {
        self.oracle
    }

    /// Whether `formula` holds for every assignment of its free variables
    pub fn decide(&self, formula: &Expr) -> Verdict {
        self.oracle.decide(formula)
    }

    /// Check that `solution` solves `problem`:
    /// `pre ==> constraint[outputs := term]`
    pub fn validate(&self, problem: &Problem, solution: &Solution) -> Verdict {
        let formula = Expr::implies(solution.pre.clone(), problem.instantiate(&solution.term));
        self.oracle.decide(&formula)
    }

    /// Look for values of the free variables of `formula` that make it true
    ///
    /// `Refuted(w)` means `w` is a model; `Proved` means no model exists.
    pub fn find_model(&self, formula: &Expr) -> Verdict {
        self.oracle.decide(&Expr::not(formula.clone()))
    }
}
