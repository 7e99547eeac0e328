//! Validity oracle over constraint formulas
//!
//! The oracle decides whether a formula holds for every assignment of its
//! free variables by asking a chain of backends, in configured order, to
//! refute it. The first conclusive answer wins; backend failures count as
//! inconclusive and never reach the caller.

pub mod backend;
pub mod enumerative;
pub mod random;
#[cfg(feature = "z3")]
pub mod z3_backend;

pub use backend::{RefuteOutcome, SolverBackend};
pub use enumerative::EnumerativeBackend;
pub use random::RandomBackend;
#[cfg(feature = "z3")]
pub use z3_backend::Z3Backend;

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::OracleError;
use crate::ir::{Env, Expr, Value};

/// Variable assignment produced by a backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Witness(Env);

impl Witness {
    pub fn new(env: Env) -> Self {
        Witness(env)
    }

    /// Value of the variable called `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(id, _)| id.name == name)
            .map(|(_, v)| v)
    }

    pub fn env(&self) -> &Env {
        &self.0
    }

    pub fn into_env(self) -> Env {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(no variables)");
        }
        for (i, (id, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", id, value)?;
        }
        Ok(())
    }
}

/// Oracle answer for a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Holds for every assignment
    Proved,
    /// False under the witness
    Refuted(Witness),
    /// No backend was conclusive
    Unknown,
}

impl Verdict {
    pub fn is_proved(&self) -> bool {
        matches!(self, Verdict::Proved)
    }

    pub fn is_refuted(&self) -> bool {
        matches!(self, Verdict::Refuted(_))
    }

    pub fn witness(&self) -> Option<&Witness> {
        match self {
            Verdict::Refuted(w) => Some(w),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Proved => write!(f, "proved"),
            Verdict::Refuted(w) => write!(f, "refuted by {}", w),
            Verdict::Unknown => write!(f, "unknown"),
        }
    }
}

/// Counters for oracle activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleStatistics {
    pub queries: u64,
    pub proved: u64,
    pub refuted: u64,
    pub unknown: u64,
    /// Backend calls that returned an error
    pub backend_failures: u64,
}

impl OracleStatistics {
    /// Activity recorded after `earlier` was taken
    pub fn since(&self, earlier: &OracleStatistics) -> OracleStatistics {
        OracleStatistics {
            queries: self.queries.saturating_sub(earlier.queries),
            proved: self.proved.saturating_sub(earlier.proved),
            refuted: self.refuted.saturating_sub(earlier.refuted),
            unknown: self.unknown.saturating_sub(earlier.unknown),
            backend_failures: self.backend_failures.saturating_sub(earlier.backend_failures),
        }
    }
}

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Exhaustive evaluation over a bounded domain
    Enumerative,
    /// Seeded random and edge-case sampling
    Random,
    /// Z3 SMT solver (requires the `z3` feature)
    Z3,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Enumerative => write!(f, "enumerative"),
            BackendKind::Random => write!(f, "random"),
            BackendKind::Z3 => write!(f, "z3"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enumerative" | "enum" => Ok(BackendKind::Enumerative),
            "random" | "rand" => Ok(BackendKind::Random),
            "z3" | "smt" => Ok(BackendKind::Z3),
            _ => Err(format!(
                "Unknown backend: '{}'. Valid options: enumerative, random, z3",
                s
            )),
        }
    }
}

/// Oracle configuration
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Backends in the order they are consulted
    pub backends: Vec<BackendKind>,
    /// Time budget for each backend call
    pub timeout: Duration,
    /// Seed for the random backend
    pub seed: u64,
    /// Integers are enumerated in `[-bound, bound]`
    pub enumeration_bound: i64,
    /// Random assignments tried per query
    pub random_samples: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let mut backends = Vec::new();
        if cfg!(feature = "z3") {
            backends.push(BackendKind::Z3);
        }
        backends.push(BackendKind::Enumerative);
        backends.push(BackendKind::Random);
        Self {
            backends,
            timeout: Duration::from_secs(5),
            seed: 0,
            enumeration_bound: 8,
            random_samples: 256,
        }
    }
}

impl OracleConfig {
    pub fn with_backends(mut self, backends: Vec<BackendKind>) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_enumeration_bound(mut self, bound: i64) -> Self {
        self.enumeration_bound = bound;
        self
    }

    pub fn with_random_samples(mut self, samples: usize) -> Self {
        self.random_samples = samples;
        self
    }
}

/// Sequential fallback over solver backends
pub struct Oracle {
    backends: Vec<Box<dyn SolverBackend>>,
    timeout: Duration,
    stats: Cell<OracleStatistics>,
}

impl Oracle {
    /// Oracle with no backends; every non-trivial query is `Unknown`
    pub fn new(timeout: Duration) -> Self {
        Self {
            backends: Vec::new(),
            timeout,
            stats: Cell::new(OracleStatistics::default()),
        }
    }

    pub fn with_backend(mut self, backend: impl SolverBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn push_backend(&mut self, backend: Box<dyn SolverBackend>) {
        self.backends.push(backend);
    }

    /// Build the backends named in `config`, in order
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let mut oracle = Oracle::new(config.timeout);
        for kind in &config.backends {
            oracle.push_backend(build_backend(*kind, config)?);
        }
        Ok(oracle)
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Decide whether `formula` holds for every assignment of its free
    /// variables
    pub fn decide(&self, formula: &Expr) -> Verdict {
        let verdict = self.decide_inner(formula);
        let mut stats = self.stats.get();
        stats.queries += 1;
        match verdict {
            Verdict::Proved => stats.proved += 1,
            Verdict::Refuted(_) => stats.refuted += 1,
            Verdict::Unknown => stats.unknown += 1,
        }
        self.stats.set(stats);
        verdict
    }

    fn decide_inner(&self, formula: &Expr) -> Verdict {
        match formula {
            Expr::BoolLit(true) => return Verdict::Proved,
            Expr::BoolLit(false) => return Verdict::Refuted(Witness::default()),
            _ => {}
        }
        for backend in &self.backends {
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                backend.attempt_refute(formula, self.timeout)
            }));
            match attempt {
                Ok(Ok(RefuteOutcome::ProvedUnsat)) => return Verdict::Proved,
                Ok(Ok(RefuteOutcome::ProvedSat(witness))) => return Verdict::Refuted(witness),
                Ok(Ok(RefuteOutcome::Inconclusive(reason))) => {
                    debug!(backend = backend.name(), reason = %reason, "backend_inconclusive");
                }
                Ok(Err(e)) => {
                    warn!(backend = backend.name(), error = %e, "backend_failed");
                    self.count_failure();
                }
                Err(payload) => {
                    warn!(
                        backend = backend.name(),
                        panic = panic_message(payload.as_ref()),
                        "backend_panicked"
                    );
                    self.count_failure();
                }
            }
        }
        Verdict::Unknown
    }

    fn count_failure(&self) {
        let mut stats = self.stats.get();
        stats.backend_failures += 1;
        self.stats.set(stats);
    }

    pub fn statistics(&self) -> OracleStatistics {
        self.stats.get()
    }

    pub fn reset_statistics(&self) {
        self.stats.set(OracleStatistics::default());
    }
}

impl Default for Oracle {
    /// Enumerative then random backends with default settings
    fn default() -> Self {
        let config = OracleConfig::default();
        Oracle::new(config.timeout)
            .with_backend(EnumerativeBackend::new(config.enumeration_bound))
            .with_backend(RandomBackend::new(config.seed, config.random_samples))
    }
}

impl fmt::Debug for Oracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Oracle")
            .field("backends", &self.backend_names())
            .field("timeout", &self.timeout)
            .field("stats", &self.stats.get())
            .finish()
    }
}

/// Text of a caught panic payload
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

fn build_backend(
    kind: BackendKind,
    config: &OracleConfig,
) -> Result<Box<dyn SolverBackend>, OracleError> {
    match kind {
        BackendKind::Enumerative => Ok(Box::new(EnumerativeBackend::new(config.enumeration_bound))),
        BackendKind::Random => Ok(Box::new(RandomBackend::new(
            config.seed,
            config.random_samples,
        ))),
        #[cfg(feature = "z3")]
        BackendKind::Z3 => Ok(Box::new(Z3Backend::new())),
        #[cfg(not(feature = "z3"))]
        BackendKind::Z3 => Err(OracleError::unsupported(
            "z3",
            "this build (enable the `z3` feature)",
        )),
    }
}
