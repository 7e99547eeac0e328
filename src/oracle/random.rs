//! Random and edge-case sampling for fast refutation

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

use crate::error::OracleError;
use crate::ir::{Env, Expr, Identifier, Type, Value, eval_bool};
use crate::oracle::{RefuteOutcome, SolverBackend, Witness};

const EDGE_VALUES: [i64; 9] = [
    0,
    1,
    -1,
    2,
    -2,
    i64::MAX,
    i64::MIN,
    0x0000_0000_FFFF_FFFF,
    -0x0000_0001_0000_0000,
];

/// Looks for counterexamples by sampling; never proves a formula
///
/// Every query starts from the same seed, so the same formula always gets
/// the same answer.
#[derive(Debug, Clone)]
pub struct RandomBackend {
    seed: u64,
    samples: usize,
}

impl RandomBackend {
    pub fn new(seed: u64, samples: usize) -> Self {
        Self { seed, samples }
    }
}

impl Default for RandomBackend {
    fn default() -> Self {
        Self::new(0, 256)
    }
}

fn edge_value(ty: &Type, round: usize) -> Value {
    match ty {
        Type::Int => Value::Int(EDGE_VALUES[round % EDGE_VALUES.len()]),
        Type::Bool => Value::Bool(round % 2 == 1),
        Type::Tuple(elems) => Value::Tuple(elems.iter().map(|t| edge_value(t, round)).collect()),
    }
}

fn random_value(ty: &Type, rng: &mut ChaCha8Rng) -> Value {
    match ty {
        Type::Int => {
            let v = match rng.random_range(0..4) {
                0 | 1 => rng.random_range(-16..=16),
                2 => EDGE_VALUES[rng.random_range(0..EDGE_VALUES.len())],
                _ => rng.random::<i64>(),
            };
            Value::Int(v)
        }
        Type::Bool => Value::Bool(rng.random_bool(0.5)),
        Type::Tuple(elems) => Value::Tuple(elems.iter().map(|t| random_value(t, rng)).collect()),
    }
}

/// Edge-case assignments: every variable at the same edge value
pub fn edge_case_assignments(vars: &[Identifier]) -> Vec<Env> {
    (0..EDGE_VALUES.len())
        .map(|round| {
            vars.iter()
                .map(|v| (v.clone(), edge_value(&v.ty, round)))
                .collect()
        })
        .collect()
}

/// `count` random assignments drawn from `rng`
pub fn random_assignments(vars: &[Identifier], count: usize, rng: &mut ChaCha8Rng) -> Vec<Env> {
    (0..count)
        .map(|_| {
            vars.iter()
                .map(|v| (v.clone(), random_value(&v.ty, rng)))
                .collect()
        })
        .collect()
}

impl SolverBackend for RandomBackend {
    fn name(&self) -> &str {
        "random"
    }

    fn attempt_refute(&self, formula: &Expr, budget: Duration) -> Result<RefuteOutcome, OracleError> {
        let start_time = Instant::now();
        let vars: Vec<Identifier> = formula.free_vars().into_iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let candidates = edge_case_assignments(&vars)
            .into_iter()
            .chain(random_assignments(&vars, self.samples, &mut rng));
        for env in candidates {
            if start_time.elapsed() >= budget {
                return Ok(RefuteOutcome::inconclusive("time budget exhausted"));
            }
            if !eval_bool(formula, &env)? {
                return Ok(RefuteOutcome::ProvedSat(Witness::new(env)));
            }
        }

        Ok(RefuteOutcome::inconclusive(format!(
            "no counterexample in {} samples",
            EDGE_VALUES.len() + self.samples
        )))
    }
}
