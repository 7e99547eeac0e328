//! Problems without inputs: ask the oracle for a model

use crate::derivation::{Alternative, Problem, Solution};
use crate::ir::Expr;
use crate::oracle::Verdict;
use crate::rules::{Rule, RuleContext};

/// Solves input-free problems with a model of the constraint
///
/// A model becomes a literal solution once it passes validation; a proof
/// that no model exists becomes the solution with precondition `false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroundRule;

impl Rule for GroundRule {
    fn name(&self) -> &str {
        "ground"
    }

    fn alternatives(&self, problem: &Problem, ctx: &RuleContext<'_>) -> Vec<Alternative> {
        if !problem.inputs.is_empty() || problem.outputs.is_empty() {
            return Vec::new();
        }
        match ctx.find_model(&problem.constraint) {
            Verdict::Refuted(model) => {
                let term = Expr::Tuple(
                    problem
                        .outputs
                        .iter()
                        .map(|o| match model.env().get(o) {
                            Some(v) => v.to_expr(),
                            None => o.ty.default_value(),
                        })
                        .collect(),
                );
                let solution = Solution::term(term);
                if !ctx.validate(problem, &solution).is_proved() {
                    return Vec::new();
                }
                vec![Alternative::solved(
                    self.name(),
                    format!("model {}", model),
                    solution,
                )]
            }
            Verdict::Proved => vec![Alternative::solved(
                self.name(),
                "constraint is unsatisfiable",
                Solution::unsat(problem),
            )],
            Verdict::Unknown => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::AlternativeOutcome;
    use crate::ir::Identifier;
    use crate::oracle::Oracle;

    fn run(problem: &Problem) -> Vec<Alternative> {
        let oracle = Oracle::default();
        GroundRule.alternatives(problem, &RuleContext::new(&oracle))
    }

    #[test]
    fn test_model_becomes_literal_solution() {
        let y = Identifier::int("y");
        let z = Identifier::bool("z");
        let p = Problem::new(
            vec![],
            vec![y.clone(), z],
            Expr::eq(Expr::mul(y.var(), y.var()), Expr::IntLit(9)),
        );
        let alts = run(&p);
        assert_eq!(alts.len(), 1);
        match &alts[0].outcome {
            AlternativeOutcome::Solved(s) => {
                assert_eq!(s.term, Expr::Tuple(vec![Expr::IntLit(3), Expr::f()]));
                assert_eq!(s.pre, Expr::t());
            }
            other => panic!("expected immediate solution, got {:?}", other),
        }
    }

    #[test]
    fn test_unsatisfiable_constraint() {
        let b = Identifier::bool("b");
        let p = Problem::new(
            vec![],
            vec![b.clone()],
            Expr::and_all(vec![b.var(), Expr::not(b.var())]),
        );
        let alts = run(&p);
        match &alts[0].outcome {
            AlternativeOutcome::Solved(s) => assert_eq!(s.pre, Expr::f()),
            other => panic!("expected immediate solution, got {:?}", other),
        }
    }

    #[test]
    fn test_not_applicable_with_inputs_or_unknown() {
        let x = Identifier::int("x");
        let y = Identifier::int("y");
        let with_input = Problem::new(vec![x.clone()], vec![y.clone()], Expr::lt(x.var(), y.var()));
        assert!(run(&with_input).is_empty());

        // No small model and no proof either way
        let far = Problem::new(vec![], vec![y.clone()], Expr::eq(y.var(), Expr::IntLit(1_000_003)));
        let oracle = Oracle::new(std::time::Duration::from_secs(1))
            .with_backend(crate::oracle::EnumerativeBackend::new(4));
        assert!(GroundRule
            .alternatives(&far, &RuleContext::new(&oracle))
            .is_empty());
    }
}
