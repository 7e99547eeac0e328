//! Split a conjunction whose conjuncts constrain disjoint sets of outputs

use std::collections::BTreeSet;

use crate::derivation::{Alternative, Problem, Solution, SolutionBuilder};
use crate::ir::{Expr, Identifier};
use crate::rules::{Rule, RuleContext, bind_outputs};

#[derive(Debug, Default, Clone, Copy)]
pub struct IndependentSplitRule;

/// Conjuncts that transitively share outputs, plus the outputs they mention
#[derive(Debug, Default)]
struct Group {
    outputs: BTreeSet<Identifier>,
    conjuncts: Vec<usize>,
}

/// Partition conjuncts into output-connected groups, ordered by first
/// appearance. Output-free conjuncts share one group of their own.
fn partition(problem: &Problem, conjuncts: &[Expr]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut free_group: Option<usize> = None;

    for (i, c) in conjuncts.iter().enumerate() {
        let vars = c.free_vars();
        let outputs: BTreeSet<Identifier> = problem
            .outputs
            .iter()
            .filter(|o| vars.contains(*o))
            .cloned()
            .collect();

        if outputs.is_empty() {
            match free_group {
                Some(g) => groups[g].conjuncts.push(i),
                None => {
                    free_group = Some(groups.len());
                    groups.push(Group {
                        outputs,
                        conjuncts: vec![i],
                    });
                }
            }
            continue;
        }

        let touching: Vec<usize> = groups
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.outputs.is_disjoint(&outputs))
            .map(|(gi, _)| gi)
            .collect();
        let Some(&target) = touching.first() else {
            groups.push(Group {
                outputs,
                conjuncts: vec![i],
            });
            continue;
        };

        // Merge later groups into the earliest one, back to front so
        // indices stay valid
        for &gi in touching[1..].iter().rev() {
            let merged = groups.remove(gi);
            groups[target].outputs.extend(merged.outputs);
            groups[target].conjuncts.extend(merged.conjuncts);
            if let Some(f) = free_group.as_mut() {
                if *f > gi {
                    *f -= 1;
                }
            }
        }
        groups[target].outputs.extend(outputs);
        groups[target].conjuncts.push(i);
        groups[target].conjuncts.sort_unstable();
    }
    groups
}

impl Rule for IndependentSplitRule {
    fn name(&self) -> &str {
        "independent-split"
    }

    fn alternatives(&self, problem: &Problem, _ctx: &RuleContext<'_>) -> Vec<Alternative> {
        let conjuncts = problem.constraint.conjuncts();
        let groups = partition(problem, &conjuncts);
        if groups.len() < 2 {
            return Vec::new();
        }

        let group_outputs: Vec<Vec<Identifier>> = groups
            .iter()
            .map(|g| {
                problem
                    .outputs
                    .iter()
                    .filter(|o| g.outputs.contains(*o))
                    .cloned()
                    .collect()
            })
            .collect();
        let subproblems: Vec<Problem> = groups
            .iter()
            .zip(&group_outputs)
            .map(|(g, outs)| {
                let constraint = Expr::and_all(g.conjuncts.iter().map(|&i| conjuncts[i].clone()));
                Problem::new(problem.inputs.clone(), outs.clone(), constraint)
            })
            .collect();

        let grouped: BTreeSet<&Identifier> = groups.iter().flat_map(|g| &g.outputs).collect();
        let full = Expr::Tuple(
            problem
                .outputs
                .iter()
                .map(|o| {
                    if grouped.contains(o) {
                        o.var()
                    } else {
                        o.ty.default_value()
                    }
                })
                .collect(),
        );
        let description = format!("{} independent parts", subproblems.len());
        let builder = SolutionBuilder::new(subproblems.len(), move |sols: &[Solution]| {
            let pre = Expr::and_all(sols.iter().map(|s| s.pre.clone()));
            let term = group_outputs
                .iter()
                .zip(sols)
                .fold(full.clone(), |body, (outs, s)| bind_outputs(outs, &s.term, body));
            Some(Solution::new(pre, term))
        });
        vec![Alternative::decompose(self.name(), description, subproblems, builder)]
    }
}
