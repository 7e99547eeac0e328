use std::collections::BTreeSet;
use std::time::Duration;

use proptest::prelude::*;

use dsynth::search::{RecordingObserver, SearchConfig, SearchOutcome};
use dsynth::{
    Alternative, Expr, Identifier, Oracle, Problem, RuleCatalog, SearchEngine, Solution,
    SolutionBuilder,
};

const TAGS: i64 = 7;

fn tagged(tag: i64) -> Problem {
    let y = Identifier::int("y");
    Problem::new(vec![], vec![y.clone()], Expr::eq(y.var(), Expr::IntLit(tag)))
}

fn tag_of(problem: &Problem) -> i64 {
    match &problem.constraint {
        Expr::Eq(_, rhs) => match rhs.as_ref() {
            Expr::IntLit(v) => *v,
            _ => -1,
        },
        _ => -1,
    }
}

/// Per tag: whether it is a leaf, and an optional split into two larger tags
#[derive(Debug, Clone)]
struct Shape {
    leaf: bool,
    split: Option<(i64, i64)>,
}

fn shapes() -> impl Strategy<Value = Vec<Shape>> {
    prop::collection::vec(
        (any::<bool>(), prop::option::of((0..TAGS, 0..TAGS))),
        TAGS as usize,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(tag, (leaf, split))| {
                let tag = tag as i64;
                let span = TAGS - tag - 1;
                let split = split
                    .filter(|_| span > 0)
                    .map(|(a, b)| (tag + 1 + a % span, tag + 1 + b % span));
                Shape { leaf, split }
            })
            .collect()
    })
}

fn catalog(shapes: &[Shape]) -> RuleCatalog {
    let splits = shapes.to_vec();
    let leaves = shapes.to_vec();
    RuleCatalog::new()
        .with_fn("split", move |p, _| {
            let tag = tag_of(p);
            match splits.get(tag as usize).and_then(|s| s.split) {
                Some((a, b)) => vec![Alternative::decompose(
                    "split",
                    "split",
                    vec![tagged(a), tagged(b)],
                    SolutionBuilder::new(2, |subs| {
                        Some(Solution::term(Expr::Tuple(
                            subs.iter().map(|s| s.term.clone()).collect(),
                        )))
                    }),
                )],
                None => Vec::new(),
            }
        })
        .with_fn("leaf", move |p, _| {
            let tag = tag_of(p);
            match leaves.get(tag as usize) {
                Some(s) if s.leaf => vec![Alternative::solved(
                    "leaf",
                    "leaf",
                    Solution::term(Expr::Tuple(vec![Expr::IntLit(tag)])),
                )],
                _ => Vec::new(),
            }
        })
}

proptest! {
    #[test]
    fn prop_tasks_expanded_and_solved_at_most_once(shapes in shapes()) {
        let catalog = catalog(&shapes);
        let oracle = Oracle::new(Duration::ZERO);
        let mut observer = RecordingObserver::new();

        let result = SearchEngine::new(&catalog, &oracle)
            .with_config(SearchConfig::default().unbounded())
            .synthesize_with(&tagged(0), &mut observer)
            .unwrap();

        let expanded = observer.expanded();
        let solved = observer.solved();
        prop_assert_eq!(expanded.iter().collect::<BTreeSet<_>>().len(), expanded.len());
        prop_assert_eq!(solved.iter().collect::<BTreeSet<_>>().len(), solved.len());
        prop_assert!(result.outcome != SearchOutcome::BudgetExceeded);
        if result.outcome == SearchOutcome::Solved {
            prop_assert!(result.tree.root_task().is_solved());
            prop_assert_eq!(result.tree.root_solution(), Some(&result.solution));
        } else {
            prop_assert_eq!(result.solution, Solution::choose(&tagged(0)));
        }
    }

    #[test]
    fn prop_runs_are_reproducible(shapes in shapes()) {
        let catalog = catalog(&shapes);
        let oracle = Oracle::new(Duration::ZERO);
        let engine = SearchEngine::new(&catalog, &oracle);

        let first = engine.synthesize(&tagged(0)).unwrap();
        let second = engine.synthesize(&tagged(0)).unwrap();

        prop_assert_eq!(first.solution, second.solution);
        prop_assert_eq!(first.tree.to_json().unwrap(), second.tree.to_json().unwrap());
    }
}
