//! dsynth: deductive program synthesis
//!
//! A synthesis problem relates inputs to outputs through a constraint. The
//! engine searches an AND/OR tree of derivation tasks: inference rules
//! either solve a task outright or split it into simpler subproblems whose
//! solutions a builder recombines. Rules consult a pluggable oracle to
//! check validity. When nothing applies, the result degrades to the
//! placeholder `choose` rather than failing.
//!
//! ```no_run
//! use dsynth::oracle::Oracle;
//! use dsynth::parser::parse_problem;
//! use dsynth::rules::RuleCatalog;
//! use dsynth::search::synthesize;
//!
//! let problem = parse_problem("input x: int\noutput y: int\nconstraint y == x + 1")?;
//! let (solution, tree) = synthesize(&problem, &RuleCatalog::standard(), &Oracle::default())?;
//! println!("{}\n{}", solution, tree);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod derivation;
pub mod error;
pub mod ir;
pub mod oracle;
pub mod parser;
pub mod rules;
pub mod search;

pub use derivation::{Alternative, DerivationTree, Problem, Solution, SolutionBuilder};
pub use error::{OracleError, SynthError, SynthResult};
pub use ir::{Expr, Identifier, Type};
pub use oracle::{Oracle, Verdict};
pub use rules::{Rule, RuleCatalog, RuleContext};
pub use search::{SearchConfig, SearchEngine, SynthesisResult, synthesize};
