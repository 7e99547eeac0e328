//! Error types for synthesis runs and solver backends

use thiserror::Error;

use crate::ir::EvalError;

/// Result type for synthesis operations
pub type SynthResult<T> = Result<T, SynthError>;

/// Contract violations and I/O failures surfaced by a synthesis run
///
/// Running out of rules or budget is not an error: those runs return the
/// placeholder solution instead.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A rule produced a decomposition whose builder expects a different
    /// number of subsolutions than it has subproblems
    #[error("rule '{rule}' built an alternative with {actual} subproblems but a builder of arity {expected}")]
    ArityMismatch {
        rule: String,
        expected: usize,
        actual: usize,
    },

    /// A rule produced a decomposition with no subproblems
    #[error("rule '{rule}' built a decomposition with no subproblems")]
    EmptyDecomposition { rule: String },

    /// Failed to parse a problem description
    #[error("parse error: {0}")]
    Parse(#[from] crate::parser::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SynthError {
    pub fn arity_mismatch(rule: impl Into<String>, expected: usize, actual: usize) -> Self {
        SynthError::ArityMismatch {
            rule: rule.into(),
            expected,
            actual,
        }
    }

    pub fn empty_decomposition(rule: impl Into<String>) -> Self {
        SynthError::EmptyDecomposition { rule: rule.into() }
    }

    /// Whether the error is a rule breaking the alternative contract
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            SynthError::ArityMismatch { .. } | SynthError::EmptyDecomposition { .. }
        )
    }
}

/// Failures inside a single solver backend
///
/// The oracle downgrades these to an inconclusive answer for the backend
/// that raised them.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("backend '{backend}' does not support {feature}")]
    Unsupported { backend: String, feature: String },

    #[error("backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),
}

impl OracleError {
    pub fn unsupported(backend: impl Into<String>, feature: impl Into<String>) -> Self {
        OracleError::Unsupported {
            backend: backend.into(),
            feature: feature.into(),
        }
    }

    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        OracleError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
