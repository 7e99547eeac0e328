//! Exhaustive evaluation over a bounded domain

use std::time::{Duration, Instant};

use crate::error::OracleError;
use crate::ir::{Env, Expr, Identifier, Type, Value, eval_bool};
use crate::oracle::{RefuteOutcome, SolverBackend, Witness};

/// Upper limit on assignments tried per query
const MAX_ASSIGNMENTS: u128 = 1 << 20;

/// Tries every assignment with integers in `[-bound, bound]`
///
/// Integers are visited by increasing magnitude (0, 1, -1, 2, -2, ...) so
/// the first counterexample found is also a small one. The search proves a
/// formula only when every variable is boolean, since only then is the
/// domain complete.
#[derive(Debug, Clone)]
pub struct EnumerativeBackend {
    bound: i64,
}

impl EnumerativeBackend {
    pub fn new(bound: i64) -> Self {
        Self { bound: bound.max(0) }
    }

    fn int_domain(&self) -> Vec<Value> {
        let mut values = vec![Value::Int(0)];
        for v in 1..=self.bound {
            values.push(Value::Int(v));
            values.push(Value::Int(-v));
        }
        values
    }

    fn domain(&self, ty: &Type) -> Result<Vec<Value>, OracleError> {
        match ty {
            Type::Bool => Ok(vec![Value::Bool(false), Value::Bool(true)]),
            Type::Int => Ok(self.int_domain()),
            Type::Tuple(elems) => {
                // Cartesian product of the element domains
                let mut acc = vec![Vec::new()];
                for elem in elems {
                    let dom = self.domain(elem)?;
                    acc = acc
                        .into_iter()
                        .flat_map(|prefix: Vec<Value>| {
                            dom.iter().map(move |v| {
                                let mut next = prefix.clone();
                                next.push(v.clone());
                                next
                            })
                        })
                        .collect();
                    if acc.len() as u128 > MAX_ASSIGNMENTS {
                        return Err(OracleError::unsupported(self.name(), "large tuple variables"));
                    }
                }
                Ok(acc.into_iter().map(Value::Tuple).collect())
            }
        }
    }
}

impl Default for EnumerativeBackend {
    fn default() -> Self {
        Self::new(8)
    }
}

fn is_finite(ty: &Type) -> bool {
    match ty {
        Type::Bool => true,
        Type::Int => false,
        Type::Tuple(elems) => elems.iter().all(is_finite),
    }
}

impl SolverBackend for EnumerativeBackend {
    fn name(&self) -> &str {
        "enumerative"
    }

    fn attempt_refute(&self, formula: &Expr, budget: Duration) -> Result<RefuteOutcome, OracleError> {
        let start_time = Instant::now();
        let vars: Vec<Identifier> = formula.free_vars().into_iter().collect();
        let domains = vars
            .iter()
            .map(|v| self.domain(&v.ty))
            .collect::<Result<Vec<_>, _>>()?;

        let total = domains
            .iter()
            .try_fold(1u128, |acc, d| acc.checked_mul(d.len() as u128));
        match total {
            Some(n) if n <= MAX_ASSIGNMENTS => {}
            _ => return Ok(RefuteOutcome::inconclusive("domain too large to enumerate")),
        }

        // Odometer over the domains; the first variable varies fastest.
        let mut index = vec![0usize; vars.len()];
        let mut checked: u64 = 0;
        loop {
            let env: Env = vars
                .iter()
                .zip(&domains)
                .zip(&index)
                .map(|((v, d), i)| (v.clone(), d[*i].clone()))
                .collect();
            if !eval_bool(formula, &env)? {
                return Ok(RefuteOutcome::ProvedSat(Witness::new(env)));
            }

            checked += 1;
            if checked % 1024 == 0 && start_time.elapsed() >= budget {
                return Ok(RefuteOutcome::inconclusive("time budget exhausted"));
            }

            let mut pos = 0;
            loop {
                if pos == index.len() {
                    return Ok(if vars.iter().all(|v| is_finite(&v.ty)) {
                        RefuteOutcome::ProvedUnsat
                    } else {
                        RefuteOutcome::inconclusive(format!(
                            "no counterexample with integers in [-{b}, {b}]",
                            b = self.bound
                        ))
                    });
                }
                index[pos] += 1;
                if index[pos] < domains[pos].len() {
                    break;
                }
                index[pos] = 0;
                pos += 1;
            }
        }
    }
}
