use dsynth::ir::{Env, Value, eval_bool};
use dsynth::parser::parse_problem;
use dsynth::search::SearchOutcome;
use dsynth::{Expr, Oracle, Problem, RuleCatalog, SearchEngine, Solution};

fn solve(source: &str) -> (Problem, Solution, SearchOutcome) {
    let problem = parse_problem(source).unwrap();
    let catalog = RuleCatalog::standard();
    let oracle = Oracle::default();
    let result = SearchEngine::new(&catalog, &oracle)
        .synthesize(&problem)
        .unwrap();
    (problem, result.solution, result.outcome)
}

/// Every input assignment from `values` (one list per input)
fn assignments(problem: &Problem, values: &[Value]) -> Vec<Env> {
    let mut envs = vec![Env::new()];
    for input in &problem.inputs {
        envs = envs
            .into_iter()
            .flat_map(|env| {
                values
                    .iter()
                    .filter(|v| match v {
                        Value::Int(_) => input.ty == dsynth::Type::Int,
                        Value::Bool(_) => input.ty == dsynth::Type::Bool,
                        Value::Tuple(_) => false,
                    })
                    .map(move |v| {
                        let mut env = env.clone();
                        env.insert(input.clone(), v.clone());
                        env
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
    }
    envs
}

/// Where `pre` holds, the term satisfies the constraint
fn assert_sound(problem: &Problem, solution: &Solution) {
    let mut values: Vec<Value> = (-6..=6).map(Value::Int).collect();
    values.push(Value::Bool(true));
    values.push(Value::Bool(false));
    let check = problem.instantiate(&solution.term);
    for env in assignments(problem, &values) {
        if eval_bool(&solution.pre, &env).unwrap() {
            assert!(
                eval_bool(&check, &env).unwrap(),
                "solution {} violates {} under {:?}",
                solution,
                problem,
                env
            );
        }
    }
}

/// `pre` holds for every sampled input
fn assert_total(problem: &Problem, solution: &Solution) {
    let mut values: Vec<Value> = (-6..=6).map(Value::Int).collect();
    values.push(Value::Bool(true));
    values.push(Value::Bool(false));
    for env in assignments(problem, &values) {
        assert!(eval_bool(&solution.pre, &env).unwrap(), "pre fails under {:?}", env);
    }
}

#[test]
fn test_successor_by_one_point() {
    let (problem, solution, outcome) = solve("input x: int\noutput y: int\nconstraint y == x + 1");

    assert_eq!(outcome, SearchOutcome::Solved);
    assert!(solution.is_complete());
    assert_eq!(solution.pre, Expr::t());
    assert_sound(&problem, &solution);
}

#[test]
fn test_absolute_value_by_case_split() {
    let source = "
        input x: int
        output y: int
        constraint (x >= 0 && y == x) || (x < 0 && y == -x)
    ";
    let (problem, solution, outcome) = solve(source);

    assert_eq!(outcome, SearchOutcome::Solved);
    assert!(solution.is_complete());
    assert_sound(&problem, &solution);
    assert_total(&problem, &solution);
}

#[test]
fn test_boolean_input_split() {
    let source = "
        input b: bool
        output y: int
        constraint (b ==> y == 1) && (!b ==> y == 2)
    ";
    let (problem, solution, outcome) = solve(source);

    assert_eq!(outcome, SearchOutcome::Solved);
    assert!(solution.is_complete());
    assert_sound(&problem, &solution);
    assert_total(&problem, &solution);
}

#[test]
fn test_ground_problem_gets_a_model() {
    let (problem, solution, outcome) = solve("output y: int\nconstraint y * y == 9 && 0 < y");

    assert_eq!(outcome, SearchOutcome::Solved);
    assert_eq!(solution.term, Expr::Tuple(vec![Expr::IntLit(3)]));
    assert_sound(&problem, &solution);
}

#[test]
fn test_unsatisfiable_ground_problem() {
    let (_, solution, outcome) = solve("output y: int\nconstraint y < y");

    assert_eq!(outcome, SearchOutcome::Solved);
    assert_eq!(solution.pre, Expr::f());
}

#[test]
fn test_independent_outputs() {
    let source = "
        input x: int
        output a: int, b: int
        constraint a == x && b == 2 * x
    ";
    let (problem, solution, outcome) = solve(source);

    assert_eq!(outcome, SearchOutcome::Solved);
    assert!(solution.is_complete());
    assert_sound(&problem, &solution);
    assert_total(&problem, &solution);
}

#[test]
fn test_unconstrained_output_gets_default() {
    let source = "
        input x: int
        output y: int, z: bool
        constraint y == x
    ";
    let (problem, solution, _) = solve(source);

    assert!(solution.is_complete());
    assert_sound(&problem, &solution);
}

#[test]
fn test_no_rule_yields_placeholder() {
    let (problem, solution, outcome) = solve("input x: int\noutput y: int\nconstraint y * y == x");

    assert_eq!(outcome, SearchOutcome::Solved);
    assert_eq!(solution, Solution::choose(&problem));
}

/// Backend that panics on every query
struct Crashing;

impl dsynth::oracle::SolverBackend for Crashing {
    fn name(&self) -> &str {
        "crashing"
    }

    fn attempt_refute(
        &self,
        _: &Expr,
        _: std::time::Duration,
    ) -> Result<dsynth::oracle::RefuteOutcome, dsynth::OracleError> {
        panic!("internal solver error")
    }
}

#[test]
fn test_crashing_backend_does_not_abort_synthesis() {
    let problem = parse_problem("output y: int\nconstraint y == 3").unwrap();
    let oracle = Oracle::new(std::time::Duration::from_secs(1))
        .with_backend(Crashing)
        .with_backend(dsynth::oracle::EnumerativeBackend::new(4));
    let catalog = RuleCatalog::standard();

    let result = SearchEngine::new(&catalog, &oracle)
        .synthesize(&problem)
        .unwrap();

    assert_eq!(result.outcome, SearchOutcome::Solved);
    assert!(result.is_complete());
    assert_sound(&problem, &result.solution);
    assert!(oracle.statistics().backend_failures > 0);
}
