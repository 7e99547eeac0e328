//! Interface implemented by constraint-solving backends

use std::time::Duration;

use crate::error::OracleError;
use crate::ir::Expr;
use crate::oracle::Witness;

/// Answer of one backend to "can this formula be made false?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefuteOutcome {
    /// The negation is unsatisfiable: the formula is valid
    ProvedUnsat,
    /// An assignment under which the formula is false
    ProvedSat(Witness),
    /// No conclusive answer within the budget
    Inconclusive(String),
}

impl RefuteOutcome {
    pub fn inconclusive(reason: impl Into<String>) -> Self {
        RefuteOutcome::Inconclusive(reason.into())
    }

    pub fn is_conclusive(&self) -> bool {
        !matches!(self, RefuteOutcome::Inconclusive(_))
    }
}

/// A decision procedure the oracle can fall back on
///
/// Backends must be sound: a conclusive answer is never wrong. They may be
/// incomplete and answer `Inconclusive` whenever they run out of budget or
/// meet a construct they do not handle.
pub trait SolverBackend {
    fn name(&self) -> &str;

    /// Try to find an assignment of the free variables of `formula` that
    /// makes it false
    fn attempt_refute(&self, formula: &Expr, budget: Duration) -> Result<RefuteOutcome, OracleError>;
}
