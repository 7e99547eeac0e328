//! Inference rules and the ordered catalog the engine consults
//!
//! A rule looks at a task's problem and reports every way it applies as an
//! [`Alternative`]: either an immediate solution or a decomposition into
//! strictly simpler subproblems plus a builder that recombines their
//! solutions. Catalog order is the order alternatives are offered to the
//! engine, which makes it the tie-break between competing alternatives.

pub mod assert;
pub mod case_split;
pub mod context;
pub mod ground;
pub mod independent_split;
pub mod input_split;
pub mod one_point;
pub mod trivial;
pub mod unconstrained_output;
pub mod unused_input;

pub use assert::AssertRule;
pub use case_split::CaseSplitRule;
pub use context::RuleContext;
pub use ground::GroundRule;
pub use independent_split::IndependentSplitRule;
pub use input_split::InputSplitRule;
pub use one_point::OnePointRule;
pub use trivial::TrivialRule;
pub use unconstrained_output::UnconstrainedOutputRule;
pub use unused_input::UnusedInputRule;

use std::collections::BTreeMap;
use std::fmt;

use crate::derivation::{Alternative, Problem};
use crate::ir::{Expr, Identifier};

/// An inference rule
pub trait Rule {
    fn name(&self) -> &str;

    /// Every way this rule applies to `problem`, empty when it does not
    ///
    /// Called once per task expansion; the engine never asks again for the
    /// same task.
    fn alternatives(&self, problem: &Problem, ctx: &RuleContext<'_>) -> Vec<Alternative>;
}

type RuleFn = dyn Fn(&Problem, &RuleContext<'_>) -> Vec<Alternative>;

/// Rule backed by a closure
pub struct FnRule {
    name: String,
    f: Box<RuleFn>,
}

impl FnRule {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&Problem, &RuleContext<'_>) -> Vec<Alternative> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Rule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn alternatives(&self, problem: &Problem, ctx: &RuleContext<'_>) -> Vec<Alternative> {
        (self.f)(problem, ctx)
    }
}

/// Ordered collection of rules
#[derive(Default)]
pub struct RuleCatalog {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleCatalog {
    /// Empty catalog; every task falls back to the placeholder
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules, cheapest and most decisive first
    pub fn standard() -> Self {
        Self::new()
            .with_rule(GroundRule)
            .with_rule(TrivialRule)
            .with_rule(OnePointRule)
            .with_rule(AssertRule)
            .with_rule(UnusedInputRule)
            .with_rule(UnconstrainedOutputRule)
            .with_rule(IndependentSplitRule)
            .with_rule(CaseSplitRule)
            .with_rule(InputSplitRule)
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Append a closure-backed rule
    pub fn with_fn(
        self,
        name: impl Into<String>,
        f: impl Fn(&Problem, &RuleContext<'_>) -> Vec<Alternative> + 'static,
    ) -> Self {
        self.with_rule(FnRule::new(name, f))
    }

    pub fn push(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Alternatives of every rule for `problem`, in catalog order
    pub fn alternatives(&self, problem: &Problem, ctx: &RuleContext<'_>) -> Vec<Alternative> {
        self.rules
            .iter()
            .flat_map(|r| r.alternatives(problem, ctx))
            .collect()
    }
}

impl fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// `body` with `binders` bound to the components of `term`
///
/// Substitutes directly when `term` is a tuple of the right arity (solution
/// terms only mention inputs, so nothing can be captured); otherwise
/// emits a `let`.
pub(crate) fn bind_outputs(binders: &[Identifier], term: &Expr, body: Expr) -> Expr {
    match term {
        Expr::Tuple(elems) if elems.len() == binders.len() => {
            let map: BTreeMap<Identifier, Expr> = binders
                .iter()
                .cloned()
                .zip(elems.iter().cloned())
                .collect();
            body.substitute(&map)
        }
        _ => Expr::let_tuple(binders.to_vec(), term.clone(), body),
    }
}

/// Comma-separated identifier names
pub(crate) fn names(ids: &[Identifier]) -> String {
    ids.iter()
        .map(|id| id.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
