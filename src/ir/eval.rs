//! Concrete interpreter used by testing backends and solution checks

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::ir::{Expr, Identifier};

/// A concrete value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn as_int(&self) -> Result<i64, EvalError> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(EvalError::TypeMismatch {
                expected: "int",
                found: other.to_string(),
            }),
        }
    }

    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::TypeMismatch {
                expected: "bool",
                found: other.to_string(),
            }),
        }
    }

    /// Literal expression denoting this value
    pub fn to_expr(&self) -> Expr {
        match self {
            Value::Int(v) => Expr::IntLit(*v),
            Value::Bool(b) => Expr::BoolLit(*b),
            Value::Tuple(elems) => Expr::Tuple(elems.iter().map(Value::to_expr).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Tuple(elems) => {
                write!(f, "(")?;
                for (i, v) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Variable assignment for evaluation
pub type Env = BTreeMap<Identifier, Value>;

/// Errors raised while evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("tuple arity mismatch: expected {expected}, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("expression is not executable: {0}")]
    Unexecutable(String),
}

/// Evaluate an expression under an environment
pub fn eval(expr: &Expr, env: &Env) -> Result<Value, EvalError> {
    match expr {
        Expr::Var(id) => env
            .get(id)
            .cloned()
            .ok_or_else(|| EvalError::UnboundVariable(id.name.clone())),
        Expr::IntLit(v) => Ok(Value::Int(*v)),
        Expr::BoolLit(b) => Ok(Value::Bool(*b)),
        Expr::Tuple(elems) => Ok(Value::Tuple(
            elems
                .iter()
                .map(|e| eval(e, env))
                .collect::<Result<_, _>>()?,
        )),
        Expr::Add(a, b) => Ok(Value::Int(
            eval(a, env)?.as_int()?.wrapping_add(eval(b, env)?.as_int()?),
        )),
        Expr::Sub(a, b) => Ok(Value::Int(
            eval(a, env)?.as_int()?.wrapping_sub(eval(b, env)?.as_int()?),
        )),
        Expr::Mul(a, b) => Ok(Value::Int(
            eval(a, env)?.as_int()?.wrapping_mul(eval(b, env)?.as_int()?),
        )),
        Expr::Neg(e) => Ok(Value::Int(eval(e, env)?.as_int()?.wrapping_neg())),
        Expr::Eq(a, b) => Ok(Value::Bool(eval(a, env)? == eval(b, env)?)),
        Expr::Lt(a, b) => Ok(Value::Bool(eval(a, env)?.as_int()? < eval(b, env)?.as_int()?)),
        Expr::Le(a, b) => Ok(Value::Bool(eval(a, env)?.as_int()? <= eval(b, env)?.as_int()?)),
        Expr::And(elems) => {
            for e in elems {
                if !eval(e, env)?.as_bool()? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Or(elems) => {
            for e in elems {
                if eval(e, env)?.as_bool()? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Expr::Not(e) => Ok(Value::Bool(!eval(e, env)?.as_bool()?)),
        Expr::Implies(a, b) => {
            if eval(a, env)?.as_bool()? {
                eval(b, env)
            } else {
                Ok(Value::Bool(true))
            }
        }
        Expr::Ite(c, t, e) => {
            if eval(c, env)?.as_bool()? {
                eval(t, env)
            } else {
                eval(e, env)
            }
        }
        Expr::LetTuple {
            binders,
            value,
            body,
        } => {
            let elems = match eval(value, env)? {
                Value::Tuple(elems) => elems,
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "tuple",
                        found: other.to_string(),
                    });
                }
            };
            if elems.len() != binders.len() {
                return Err(EvalError::ArityMismatch {
                    expected: binders.len(),
                    found: elems.len(),
                });
            }
            let mut inner = env.clone();
            for (id, v) in binders.iter().zip(elems) {
                inner.insert(id.clone(), v);
            }
            eval(body, &inner)
        }
        Expr::Choose { .. } => Err(EvalError::Unexecutable(expr.to_string())),
    }
}

/// Evaluate a boolean formula
pub fn eval_bool(expr: &Expr, env: &Env) -> Result<bool, EvalError> {
    eval(expr, env)?.as_bool()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, i64)]) -> Env {
        pairs
            .iter()
            .map(|(n, v)| (Identifier::int(*n), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn test_eval_arithmetic_wraps() {
        let x = Identifier::int("x");
        let e = Expr::add(x.var(), Expr::IntLit(1));
        assert_eq!(
            eval(&e, &env(&[("x", i64::MAX)])).unwrap(),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn test_eval_comparisons_and_logic() {
        let x = Identifier::int("x");
        let y = Identifier::int("y");
        let e = Expr::and_all(vec![
            Expr::lt(x.var(), y.var()),
            Expr::not(Expr::eq(x.var(), Expr::IntLit(0))),
        ]);
        assert!(eval_bool(&e, &env(&[("x", 1), ("y", 2)])).unwrap());
        assert!(!eval_bool(&e, &env(&[("x", 0), ("y", 2)])).unwrap());
    }

    #[test]
    fn test_eval_let_tuple_and_ite() {
        let a = Identifier::int("a");
        let b = Identifier::int("b");
        let e = Expr::LetTuple {
            binders: vec![a.clone(), b.clone()],
            value: Box::new(Expr::Tuple(vec![Expr::IntLit(3), Expr::IntLit(4)])),
            body: Box::new(Expr::ite(
                Expr::lt(a.var(), b.var()),
                a.var(),
                b.var(),
            )),
        };
        assert_eq!(eval(&e, &Env::new()).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_eval_unbound_variable() {
        let e = Identifier::int("z").var();
        assert_eq!(
            eval(&e, &Env::new()),
            Err(EvalError::UnboundVariable("z".to_string()))
        );
    }

    #[test]
    fn test_eval_choose_is_unexecutable() {
        let y = Identifier::int("y");
        let e = Expr::choose(vec![y.clone()], Expr::eq(y.var(), Expr::IntLit(1)));
        assert!(matches!(
            eval(&e, &Env::new()),
            Err(EvalError::Unexecutable(_))
        ));
    }

    #[test]
    fn test_eval_short_circuits() {
        // The unbound variable in the second conjunct is never reached.
        let e = Expr::And(vec![Expr::f(), Identifier::bool("missing").var()]);
        assert!(!eval_bool(&e, &Env::new()).unwrap());
    }

    #[test]
    fn test_value_to_expr() {
        let v = Value::Tuple(vec![Value::Int(1), Value::Bool(true)]);
        assert_eq!(
            v.to_expr(),
            Expr::Tuple(vec![Expr::IntLit(1), Expr::BoolLit(true)])
        );
    }
}
