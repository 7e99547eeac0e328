use std::time::Duration;

use dsynth::derivation::{SolvedVia, TaskId, TaskStatus};
use dsynth::search::{RecordingObserver, SearchConfig, SearchOutcome};
use dsynth::{
    Alternative, Expr, Identifier, Oracle, Problem, RuleCatalog, SearchEngine, Solution,
    SolutionBuilder, SynthError, synthesize,
};

fn tagged(tag: i64) -> Problem {
    let y = Identifier::int("y");
    Problem::new(vec![], vec![y.clone()], Expr::eq(y.var(), Expr::IntLit(tag)))
}

fn tag_of(problem: &Problem) -> Option<i64> {
    match &problem.constraint {
        Expr::Eq(_, rhs) => match rhs.as_ref() {
            Expr::IntLit(v) => Some(*v),
            _ => None,
        },
        _ => None,
    }
}

fn marker(tag: i64) -> Solution {
    Solution::term(Expr::Tuple(vec![Expr::IntLit(tag * 10)]))
}

fn concat() -> SolutionBuilder {
    SolutionBuilder::new(2, |subs| {
        Some(Solution::term(Expr::Tuple(
            subs.iter().map(|s| s.term.clone()).collect(),
        )))
    })
}

fn oracle() -> Oracle {
    Oracle::new(Duration::ZERO)
}

#[test]
fn test_immediate_rule_solves_root() {
    let catalog = RuleCatalog::new().with_fn("R", |p, _| {
        vec![Alternative::solved("R", "direct", marker(tag_of(p).unwrap_or(0)))]
    });

    let (solution, tree) = synthesize(&tagged(0), &catalog, &oracle()).unwrap();

    assert_eq!(solution, marker(0));
    assert_eq!(tree.len(), 1);
    assert!(tree.root_task().is_solved());
}

#[test]
fn test_decomposition_builds_root_last() {
    let catalog = RuleCatalog::new()
        .with_fn("R1", |p, _| match tag_of(p) {
            Some(0) => vec![Alternative::decompose(
                "R1",
                "split",
                vec![tagged(1), tagged(2)],
                concat(),
            )],
            _ => Vec::new(),
        })
        .with_fn("R2", |p, _| match tag_of(p) {
            Some(1) => vec![Alternative::solved("R2", "leaf", marker(1))],
            _ => Vec::new(),
        })
        .with_fn("R3", |p, _| match tag_of(p) {
            Some(2) => vec![Alternative::solved("R3", "leaf", marker(2))],
            _ => Vec::new(),
        });
    let oracle = oracle();
    let mut observer = RecordingObserver::new();

    let result = SearchEngine::new(&catalog, &oracle)
        .synthesize_with(&tagged(0), &mut observer)
        .unwrap();

    let expected = Solution::term(Expr::Tuple(vec![marker(1).term, marker(2).term]));
    assert_eq!(result.outcome, SearchOutcome::Solved);
    assert_eq!(result.solution, expected);
    assert_eq!(result.tree.len(), 3);
    assert_eq!(observer.solved().last(), Some(&TaskId(0)));
    assert!(matches!(
        result.tree.root_task().solved_via(),
        Some(SolvedVia::Group(_))
    ));
}

#[test]
fn test_immediate_alternative_wins_over_decomposition() {
    let catalog = RuleCatalog::new()
        .with_fn("direct", |p, _| match tag_of(p) {
            Some(0) => vec![Alternative::solved("direct", "leaf", marker(0))],
            _ => Vec::new(),
        })
        .with_fn("split", |p, _| match tag_of(p) {
            Some(0) => vec![Alternative::decompose(
                "split",
                "split",
                vec![tagged(1), tagged(2)],
                concat(),
            )],
            _ => Vec::new(),
        })
        .with_fn("leaf", |p, _| match tag_of(p) {
            Some(t) if t > 0 => vec![Alternative::solved("leaf", "leaf", marker(t))],
            _ => Vec::new(),
        });

    let (solution, tree) = synthesize(&tagged(0), &catalog, &oracle()).unwrap();

    assert_eq!(solution, marker(0));
    assert_eq!(tree.len(), 3);
    for task in &tree.tasks()[1..] {
        assert_eq!(task.status(), TaskStatus::Dormant);
        assert!(task.solution().is_none());
    }
}

#[test]
fn test_empty_catalog_returns_placeholder() {
    let catalog = RuleCatalog::new();
    let problem = tagged(4);

    let (solution, tree) = synthesize(&problem, &catalog, &oracle()).unwrap();

    assert_eq!(solution, Solution::choose(&problem));
    assert!(solution.is_placeholder());
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_unsolvable_group_exhausts() {
    // Subtask 2 is never solved, so the split cannot complete
    let catalog = RuleCatalog::new()
        .with_fn("split", |p, _| match tag_of(p) {
            Some(0) => vec![Alternative::decompose(
                "split",
                "split",
                vec![tagged(1), tagged(2)],
                concat(),
            )],
            Some(2) => vec![Alternative::decompose(
                "split",
                "loop back",
                vec![tagged(3), tagged(3)],
                SolutionBuilder::new(2, |_| None),
            )],
            _ => Vec::new(),
        })
        .with_fn("leaf", |p, _| match tag_of(p) {
            Some(t) if t == 1 || t == 3 => vec![Alternative::solved("leaf", "leaf", marker(t))],
            _ => Vec::new(),
        });
    let oracle = oracle();

    let result = SearchEngine::new(&catalog, &oracle)
        .synthesize(&tagged(0))
        .unwrap();

    assert_eq!(result.outcome, SearchOutcome::Exhausted);
    assert!(result.is_placeholder());
    assert_eq!(result.statistics.groups_rejected, 1);
}

#[test]
fn test_expansion_budget_degrades_to_placeholder() {
    // Every task splits forever
    let catalog = RuleCatalog::new().with_fn("grow", |p, _| {
        let t = tag_of(p).unwrap_or(0);
        vec![Alternative::decompose(
            "grow",
            "grow",
            vec![tagged(t + 1), tagged(t + 2)],
            concat(),
        )]
    });
    let oracle = oracle();

    let result = SearchEngine::new(&catalog, &oracle)
        .with_config(SearchConfig::default().with_max_expansions(10))
        .synthesize(&tagged(0))
        .unwrap();

    assert_eq!(result.outcome, SearchOutcome::BudgetExceeded);
    assert_eq!(result.statistics.expansions, 10);
    assert_eq!(result.solution, Solution::choose(&tagged(0)));
}

#[test]
fn test_contract_violations_abort_the_run() {
    let mismatched = RuleCatalog::new().with_fn("bad", |_, _| {
        vec![Alternative::decompose(
            "bad",
            "split",
            vec![tagged(1), tagged(2), tagged(3)],
            concat(),
        )]
    });
    let empty = RuleCatalog::new().with_fn("empty", |_, _| {
        vec![Alternative::decompose("empty", "nothing", vec![], concat())]
    });

    match synthesize(&tagged(0), &mismatched, &oracle()) {
        Err(SynthError::ArityMismatch { .. }) => {}
        other => panic!("expected arity mismatch, got {:?}", other.map(|(s, _)| s)),
    }
    match synthesize(&tagged(0), &empty, &oracle()) {
        Err(SynthError::EmptyDecomposition { .. }) => {}
        other => panic!("expected empty decomposition, got {:?}", other.map(|(s, _)| s)),
    }
}

#[test]
fn test_runs_are_deterministic() {
    let catalog = || {
        RuleCatalog::new()
            .with_fn("split", |p, _| match tag_of(p) {
                Some(t) if t < 3 => vec![
                    Alternative::decompose(
                        "split",
                        "left",
                        vec![tagged(t + 1), tagged(t + 2)],
                        concat(),
                    ),
                    Alternative::decompose(
                        "split",
                        "right",
                        vec![tagged(t + 2), tagged(t + 1)],
                        concat(),
                    ),
                ],
                _ => Vec::new(),
            })
            .with_fn("leaf", |p, _| match tag_of(p) {
                Some(t) if t >= 3 => vec![Alternative::solved("leaf", "leaf", marker(t))],
                _ => Vec::new(),
            })
    };

    let (first_solution, first_tree) = synthesize(&tagged(0), &catalog(), &oracle()).unwrap();
    let (second_solution, second_tree) = synthesize(&tagged(0), &catalog(), &oracle()).unwrap();

    assert_eq!(first_solution, second_solution);
    assert_eq!(first_tree.to_json().unwrap(), second_tree.to_json().unwrap());
}
