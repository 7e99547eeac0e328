//! Constraint and program representation

pub mod eval;
pub mod expr;
pub mod types;

pub use eval::{Env, EvalError, Value, eval, eval_bool};
pub use expr::Expr;
pub use types::{Identifier, Type, tuple_type};
