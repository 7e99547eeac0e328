//! Z3 backend
//!
//! Integers are encoded as 64-bit bitvectors with signed comparisons, which
//! matches the wrapping semantics of the interpreter exactly.

use std::collections::BTreeMap;
use std::time::Duration;
use z3::ast::{BV, Bool};
use z3::{Model, Params, SatResult, Solver};

use crate::error::OracleError;
use crate::ir::{Env, Expr, Identifier, Type, Value};
use crate::oracle::{RefuteOutcome, SolverBackend, Witness};

const WIDTH: u32 = 64;

/// Encoded value of an expression
#[derive(Clone)]
enum Term {
    Int(BV),
    Bool(Bool),
    Tuple(Vec<Term>),
}

impl Term {
    fn int(self) -> Result<BV, OracleError> {
        match self {
            Term::Int(bv) => Ok(bv),
            _ => Err(OracleError::backend("z3", "expected an integer term")),
        }
    }

    fn bool(self) -> Result<Bool, OracleError> {
        match self {
            Term::Bool(b) => Ok(b),
            _ => Err(OracleError::backend("z3", "expected a boolean term")),
        }
    }

    fn equal(&self, other: &Term) -> Result<Bool, OracleError> {
        match (self, other) {
            (Term::Int(a), Term::Int(b)) => Ok(a.eq(b)),
            (Term::Bool(a), Term::Bool(b)) => Ok(a.eq(b)),
            (Term::Tuple(a), Term::Tuple(b)) if a.len() == b.len() => {
                let parts = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| x.equal(y))
                    .collect::<Result<Vec<_>, _>>()?;
                let refs: Vec<&Bool> = parts.iter().collect();
                Ok(Bool::and(&refs))
            }
            _ => Err(OracleError::backend("z3", "equality between mismatched terms")),
        }
    }

    fn ite(cond: &Bool, then: Term, els: Term) -> Result<Term, OracleError> {
        match (then, els) {
            (Term::Int(a), Term::Int(b)) => Ok(Term::Int(cond.ite(&a, &b))),
            (Term::Bool(a), Term::Bool(b)) => Ok(Term::Bool(cond.ite(&a, &b))),
            (Term::Tuple(a), Term::Tuple(b)) if a.len() == b.len() => Ok(Term::Tuple(
                a.into_iter()
                    .zip(b)
                    .map(|(x, y)| Term::ite(cond, x, y))
                    .collect::<Result<_, _>>()?,
            )),
            _ => Err(OracleError::backend("z3", "conditional branches of different types")),
        }
    }
}

fn fresh(name: &str, ty: &Type) -> Term {
    match ty {
        Type::Int => Term::Int(BV::new_const(name, WIDTH)),
        Type::Bool => Term::Bool(Bool::new_const(name)),
        Type::Tuple(elems) => Term::Tuple(
            elems
                .iter()
                .enumerate()
                .map(|(i, t)| fresh(&format!("{}.{}", name, i), t))
                .collect(),
        ),
    }
}

/// Translates expressions, declaring one constant per free variable
struct Encoder {
    free: BTreeMap<Identifier, Term>,
}

impl Encoder {
    fn encode(&mut self, expr: &Expr, bound: &BTreeMap<Identifier, Term>) -> Result<Term, OracleError> {
        Ok(match expr {
            Expr::Var(id) => match bound.get(id) {
                Some(t) => t.clone(),
                None => self
                    .free
                    .entry(id.clone())
                    .or_insert_with(|| fresh(&id.name, &id.ty))
                    .clone(),
            },
            Expr::IntLit(v) => Term::Int(BV::from_i64(*v, WIDTH)),
            Expr::BoolLit(b) => Term::Bool(Bool::from_bool(*b)),
            Expr::Tuple(elems) => Term::Tuple(
                elems
                    .iter()
                    .map(|e| self.encode(e, bound))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Add(a, b) => Term::Int(self.int(a, bound)?.bvadd(&self.int(b, bound)?)),
            Expr::Sub(a, b) => Term::Int(self.int(a, bound)?.bvsub(&self.int(b, bound)?)),
            Expr::Mul(a, b) => Term::Int(self.int(a, bound)?.bvmul(&self.int(b, bound)?)),
            Expr::Neg(e) => Term::Int(self.int(e, bound)?.bvneg()),
            Expr::Eq(a, b) => {
                let lhs = self.encode(a, bound)?;
                let rhs = self.encode(b, bound)?;
                Term::Bool(lhs.equal(&rhs)?)
            }
            Expr::Lt(a, b) => Term::Bool(self.int(a, bound)?.bvslt(&self.int(b, bound)?)),
            Expr::Le(a, b) => Term::Bool(self.int(a, bound)?.bvsle(&self.int(b, bound)?)),
            Expr::And(elems) => {
                let parts = elems
                    .iter()
                    .map(|e| self.boolean(e, bound))
                    .collect::<Result<Vec<_>, _>>()?;
                let refs: Vec<&Bool> = parts.iter().collect();
                Term::Bool(Bool::and(&refs))
            }
            Expr::Or(elems) => {
                let parts = elems
                    .iter()
                    .map(|e| self.boolean(e, bound))
                    .collect::<Result<Vec<_>, _>>()?;
                let refs: Vec<&Bool> = parts.iter().collect();
                Term::Bool(Bool::or(&refs))
            }
            Expr::Not(e) => Term::Bool(self.boolean(e, bound)?.not()),
            Expr::Implies(a, b) => {
                Term::Bool(self.boolean(a, bound)?.implies(&self.boolean(b, bound)?))
            }
            Expr::Ite(c, t, e) => {
                let cond = self.boolean(c, bound)?;
                let then = self.encode(t, bound)?;
                let els = self.encode(e, bound)?;
                Term::ite(&cond, then, els)?
            }
            Expr::LetTuple {
                binders,
                value,
                body,
            } => {
                let elems = match self.encode(value, bound)? {
                    Term::Tuple(elems) if elems.len() == binders.len() => elems,
                    _ => return Err(OracleError::backend("z3", "let binds a non-tuple value")),
                };
                let mut inner = bound.clone();
                for (id, t) in binders.iter().zip(elems) {
                    inner.insert(id.clone(), t);
                }
                self.encode(body, &inner)?
            }
            Expr::Choose { .. } => {
                return Err(OracleError::unsupported("z3", "choose expressions"));
            }
        })
    }

    fn int(&mut self, expr: &Expr, bound: &BTreeMap<Identifier, Term>) -> Result<BV, OracleError> {
        self.encode(expr, bound)?.int()
    }

    fn boolean(&mut self, expr: &Expr, bound: &BTreeMap<Identifier, Term>) -> Result<Bool, OracleError> {
        self.encode(expr, bound)?.bool()
    }
}

fn read_value(model: &Model, term: &Term) -> Result<Value, OracleError> {
    let missing = || OracleError::backend("z3", "model has no value for a variable");
    match term {
        Term::Int(bv) => {
            let v = model.eval(bv, true).and_then(|v| v.as_u64()).ok_or_else(missing)?;
            Ok(Value::Int(v as i64))
        }
        Term::Bool(b) => {
            let v = model.eval(b, true).and_then(|v| v.as_bool()).ok_or_else(missing)?;
            Ok(Value::Bool(v))
        }
        Term::Tuple(elems) => Ok(Value::Tuple(
            elems
                .iter()
                .map(|t| read_value(model, t))
                .collect::<Result<_, _>>()?,
        )),
    }
}

/// Refutes formulas with the Z3 SMT solver
#[derive(Debug, Clone, Default)]
pub struct Z3Backend;

impl Z3Backend {
    pub fn new() -> Self {
        Z3Backend
    }
}

impl SolverBackend for Z3Backend {
    fn name(&self) -> &str {
        "z3"
    }

    fn attempt_refute(&self, formula: &Expr, budget: Duration) -> Result<RefuteOutcome, OracleError> {
        let mut encoder = Encoder {
            free: BTreeMap::new(),
        };
        let encoded = encoder.boolean(formula, &BTreeMap::new())?;

        let solver = Solver::new();
        let mut params = Params::new();
        params.set_u32("timeout", budget.as_millis().min(u32::MAX as u128) as u32);
        solver.set_params(&params);
        solver.assert(&encoded.not());

        match solver.check() {
            SatResult::Unsat => Ok(RefuteOutcome::ProvedUnsat),
            SatResult::Unknown => Ok(RefuteOutcome::inconclusive(
                solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "solver returned unknown".to_string()),
            )),
            SatResult::Sat => {
                let model = solver
                    .get_model()
                    .ok_or_else(|| OracleError::backend("z3", "sat without a model"))?;
                let mut env = Env::new();
                for (id, term) in &encoder.free {
                    env.insert(id.clone(), read_value(&model, term)?);
                }
                Ok(RefuteOutcome::ProvedSat(Witness::new(env)))
            }
        }
    }
}
