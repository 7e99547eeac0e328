//! Expression language shared by constraints and synthesized programs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ir::types::Identifier;

/// Expressions over integers, booleans and tuples
///
/// Constraints are boolean expressions; solution terms are tuples holding
/// one value per output variable. `Choose` is the non-executable "unknown
/// witness": some value for `outputs` that satisfies `constraint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    Var(Identifier),
    IntLit(i64),
    BoolLit(bool),
    Tuple(Vec<Expr>),

    // Arithmetic
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),

    // Comparisons
    Eq(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),

    // Logic
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),

    // Binders
    LetTuple {
        binders: Vec<Identifier>,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    Choose {
        outputs: Vec<Identifier>,
        constraint: Box<Expr>,
    },
}

impl Expr {
    pub fn t() -> Self {
        Expr::BoolLit(true)
    }

    pub fn f() -> Self {
        Expr::BoolLit(false)
    }

    pub fn unit() -> Self {
        Expr::Tuple(Vec::new())
    }

    pub fn var(id: &Identifier) -> Self {
        Expr::Var(id.clone())
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Expr::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Expr::Sub(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Expr::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn neg(e: Expr) -> Self {
        match e {
            Expr::IntLit(v) => Expr::IntLit(v.wrapping_neg()),
            other => Expr::Neg(Box::new(other)),
        }
    }

    /// Equality; literals and syntactically identical operands fold
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        if lhs.is_literal() && rhs.is_literal() {
            return Expr::BoolLit(lhs == rhs);
        }
        if lhs == rhs && !lhs.contains_choose() {
            return Expr::t();
        }
        Expr::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        match (&lhs, &rhs) {
            (Expr::IntLit(a), Expr::IntLit(b)) => Expr::BoolLit(a < b),
            _ if lhs == rhs && !lhs.contains_choose() => Expr::f(),
            _ => Expr::Lt(Box::new(lhs), Box::new(rhs)),
        }
    }

    pub fn le(lhs: Expr, rhs: Expr) -> Self {
        match (&lhs, &rhs) {
            (Expr::IntLit(a), Expr::IntLit(b)) => Expr::BoolLit(a <= b),
            _ if lhs == rhs && !lhs.contains_choose() => Expr::t(),
            _ => Expr::Le(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Negation with constant folding and double-negation elimination
    #[allow(clippy::should_implement_trait)]
    pub fn not(e: Expr) -> Self {
        match e {
            Expr::BoolLit(b) => Expr::BoolLit(!b),
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    pub fn implies(lhs: Expr, rhs: Expr) -> Self {
        match (&lhs, &rhs) {
            (Expr::BoolLit(true), _) => rhs,
            (Expr::BoolLit(false), _) | (_, Expr::BoolLit(true)) => Expr::t(),
            _ => Expr::Implies(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// Conjunction that flattens nested `And`s and folds boolean literals
    pub fn and_all(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut flat = Vec::new();
        for e in exprs {
            match e {
                Expr::BoolLit(true) => {}
                Expr::BoolLit(false) => return Expr::f(),
                Expr::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Expr::t(),
            1 => flat.pop().unwrap_or_else(Expr::t),
            _ => Expr::And(flat),
        }
    }

    /// Disjunction that flattens nested `Or`s and folds boolean literals
    pub fn or_all(exprs: impl IntoIterator<Item = Expr>) -> Self {
        let mut flat = Vec::new();
        for e in exprs {
            match e {
                Expr::BoolLit(false) => {}
                Expr::BoolLit(true) => return Expr::t(),
                Expr::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Expr::f(),
            1 => flat.pop().unwrap_or_else(Expr::f),
            _ => Expr::Or(flat),
        }
    }

    pub fn ite(cond: Expr, then: Expr, els: Expr) -> Self {
        match cond {
            Expr::BoolLit(true) => then,
            Expr::BoolLit(false) => els,
            _ if then == els => then,
            cond => Expr::Ite(Box::new(cond), Box::new(then), Box::new(els)),
        }
    }

    /// `let (binders) = value in body`
    ///
    /// Inlines the binding when `value` is a tuple of literals, since
    /// literals cannot be captured by binders inside `body`.
    pub fn let_tuple(binders: Vec<Identifier>, value: Expr, body: Expr) -> Self {
        if binders.is_empty() {
            return body;
        }
        if let Expr::Tuple(ref elems) = value {
            if elems.len() == binders.len() && elems.iter().all(Expr::is_literal) {
                let map: BTreeMap<Identifier, Expr> =
                    binders.into_iter().zip(elems.iter().cloned()).collect();
                return body.substitute(&map);
            }
        }
        Expr::LetTuple {
            binders,
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    pub fn choose(outputs: Vec<Identifier>, constraint: Expr) -> Self {
        Expr::Choose {
            outputs,
            constraint: Box::new(constraint),
        }
    }

    /// Literal values (possibly nested in tuples)
    pub fn is_literal(&self) -> bool {
        match self {
            Expr::IntLit(_) | Expr::BoolLit(_) => true,
            Expr::Tuple(elems) => elems.iter().all(Expr::is_literal),
            _ => false,
        }
    }

    /// Whether evaluating this expression can reach a `Choose`
    pub fn contains_choose(&self) -> bool {
        let mut found = false;
        self.visit(&mut |e| {
            if matches!(e, Expr::Choose { .. }) {
                found = true;
            }
        });
        found
    }

    /// Visit every sub-expression in pre-order
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Expr::Var(_) | Expr::IntLit(_) | Expr::BoolLit(_) => {}
            Expr::Tuple(elems) | Expr::And(elems) | Expr::Or(elems) => {
                for e in elems {
                    e.visit(f);
                }
            }
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Eq(a, b)
            | Expr::Lt(a, b)
            | Expr::Le(a, b)
            | Expr::Implies(a, b) => {
                a.visit(f);
                b.visit(f);
            }
            Expr::Neg(e) | Expr::Not(e) => e.visit(f),
            Expr::Ite(c, t, e) => {
                c.visit(f);
                t.visit(f);
                e.visit(f);
            }
            Expr::LetTuple { value, body, .. } => {
                value.visit(f);
                body.visit(f);
            }
            Expr::Choose { constraint, .. } => constraint.visit(f),
        }
    }

    /// Number of nodes in the expression tree
    pub fn size(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }

    /// Free variables, in identifier order
    pub fn free_vars(&self) -> BTreeSet<Identifier> {
        let mut out = BTreeSet::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<Identifier>, out: &mut BTreeSet<Identifier>) {
        match self {
            Expr::Var(id) => {
                if !bound.contains(id) {
                    out.insert(id.clone());
                }
            }
            Expr::IntLit(_) | Expr::BoolLit(_) => {}
            Expr::Tuple(elems) | Expr::And(elems) | Expr::Or(elems) => {
                for e in elems {
                    e.collect_free(bound, out);
                }
            }
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Eq(a, b)
            | Expr::Lt(a, b)
            | Expr::Le(a, b)
            | Expr::Implies(a, b) => {
                a.collect_free(bound, out);
                b.collect_free(bound, out);
            }
            Expr::Neg(e) | Expr::Not(e) => e.collect_free(bound, out),
            Expr::Ite(c, t, e) => {
                c.collect_free(bound, out);
                t.collect_free(bound, out);
                e.collect_free(bound, out);
            }
            Expr::LetTuple {
                binders,
                value,
                body,
            } => {
                value.collect_free(bound, out);
                let mark = bound.len();
                bound.extend(binders.iter().cloned());
                body.collect_free(bound, out);
                bound.truncate(mark);
            }
            Expr::Choose {
                outputs,
                constraint,
            } => {
                let mark = bound.len();
                bound.extend(outputs.iter().cloned());
                constraint.collect_free(bound, out);
                bound.truncate(mark);
            }
        }
    }

    pub fn mentions(&self, id: &Identifier) -> bool {
        self.free_vars().contains(id)
    }

    pub fn mentions_any(&self, ids: &[Identifier]) -> bool {
        let free = self.free_vars();
        ids.iter().any(|id| free.contains(id))
    }

    /// Simultaneous substitution of free variables
    ///
    /// Binders shadow the map. Replacements must not mention names bound
    /// inside `self`.
    pub fn substitute(&self, map: &BTreeMap<Identifier, Expr>) -> Expr {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Expr::Var(id) => map.get(id).cloned().unwrap_or_else(|| self.clone()),
            Expr::IntLit(_) | Expr::BoolLit(_) => self.clone(),
            Expr::Tuple(elems) => Expr::Tuple(elems.iter().map(|e| e.substitute(map)).collect()),
            Expr::Add(a, b) => Expr::add(a.substitute(map), b.substitute(map)),
            Expr::Sub(a, b) => Expr::sub(a.substitute(map), b.substitute(map)),
            Expr::Mul(a, b) => Expr::mul(a.substitute(map), b.substitute(map)),
            Expr::Neg(e) => Expr::neg(e.substitute(map)),
            Expr::Eq(a, b) => Expr::eq(a.substitute(map), b.substitute(map)),
            Expr::Lt(a, b) => Expr::lt(a.substitute(map), b.substitute(map)),
            Expr::Le(a, b) => Expr::le(a.substitute(map), b.substitute(map)),
            Expr::And(elems) => Expr::and_all(elems.iter().map(|e| e.substitute(map))),
            Expr::Or(elems) => Expr::or_all(elems.iter().map(|e| e.substitute(map))),
            Expr::Not(e) => Expr::not(e.substitute(map)),
            Expr::Implies(a, b) => Expr::implies(a.substitute(map), b.substitute(map)),
            Expr::Ite(c, t, e) => Expr::ite(c.substitute(map), t.substitute(map), e.substitute(map)),
            Expr::LetTuple {
                binders,
                value,
                body,
            } => {
                let inner = shadowed(map, binders);
                Expr::LetTuple {
                    binders: binders.clone(),
                    value: Box::new(value.substitute(map)),
                    body: Box::new(body.substitute(&inner)),
                }
            }
            Expr::Choose {
                outputs,
                constraint,
            } => {
                let inner = shadowed(map, outputs);
                Expr::choose(outputs.clone(), constraint.substitute(&inner))
            }
        }
    }

    /// Top-level conjuncts (a non-conjunction is a single conjunct)
    pub fn conjuncts(&self) -> Vec<Expr> {
        match self {
            Expr::And(elems) => elems.iter().flat_map(Expr::conjuncts).collect(),
            Expr::BoolLit(true) => Vec::new(),
            other => vec![other.clone()],
        }
    }

    /// Top-level disjuncts (a non-disjunction is a single disjunct)
    pub fn disjuncts(&self) -> Vec<Expr> {
        match self {
            Expr::Or(elems) => elems.iter().flat_map(Expr::disjuncts).collect(),
            Expr::BoolLit(false) => Vec::new(),
            other => vec![other.clone()],
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Implies(..) => 1,
            Expr::Or(_) => 2,
            Expr::And(_) => 3,
            Expr::Eq(..) | Expr::Lt(..) | Expr::Le(..) => 4,
            Expr::Add(..) | Expr::Sub(..) => 5,
            Expr::Mul(..) => 6,
            Expr::Neg(_) | Expr::Not(_) => 7,
            // Open-ended forms extend to the right and need parentheses
            // whenever they appear as an operand.
            Expr::Ite(..) | Expr::LetTuple { .. } => 0,
            _ => 9,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        let prec = self.precedence();
        let paren = prec < min;
        if paren {
            write!(f, "(")?;
        }
        match self {
            Expr::Var(id) => write!(f, "{}", id)?,
            Expr::IntLit(v) => write!(f, "{}", v)?,
            Expr::BoolLit(b) => write!(f, "{}", b)?,
            Expr::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    e.fmt_prec(f, 1)?;
                }
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")?;
            }
            Expr::Add(a, b) => binary(f, a, "+", b, prec)?,
            Expr::Sub(a, b) => binary(f, a, "-", b, prec)?,
            Expr::Mul(a, b) => binary(f, a, "*", b, prec)?,
            Expr::Neg(e) => {
                write!(f, "-")?;
                e.fmt_prec(f, prec + 1)?;
            }
            Expr::Eq(a, b) => binary(f, a, "==", b, prec)?,
            Expr::Lt(a, b) => binary(f, a, "<", b, prec)?,
            Expr::Le(a, b) => binary(f, a, "<=", b, prec)?,
            Expr::And(elems) => nary(f, elems, "&&", prec)?,
            Expr::Or(elems) => nary(f, elems, "||", prec)?,
            Expr::Not(e) => {
                write!(f, "!")?;
                e.fmt_prec(f, prec + 1)?;
            }
            Expr::Implies(a, b) => {
                a.fmt_prec(f, prec + 1)?;
                write!(f, " ==> ")?;
                b.fmt_prec(f, prec)?;
            }
            Expr::Ite(c, t, e) => {
                write!(f, "if ")?;
                c.fmt_prec(f, 1)?;
                write!(f, " then ")?;
                t.fmt_prec(f, 1)?;
                write!(f, " else ")?;
                e.fmt_prec(f, 0)?;
            }
            Expr::LetTuple {
                binders,
                value,
                body,
            } => {
                write!(f, "let (")?;
                for (i, id) in binders.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", id)?;
                }
                write!(f, ") = ")?;
                value.fmt_prec(f, 1)?;
                write!(f, " in ")?;
                body.fmt_prec(f, 0)?;
            }
            Expr::Choose {
                outputs,
                constraint,
            } => {
                write!(f, "choose((")?;
                for (i, id) in outputs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", id, id.ty)?;
                }
                write!(f, ") => ")?;
                constraint.fmt_prec(f, 0)?;
                write!(f, ")")?;
            }
        }
        if paren {
            write!(f, ")")?;
        }
        Ok(())
    }
}

fn shadowed(map: &BTreeMap<Identifier, Expr>, binders: &[Identifier]) -> BTreeMap<Identifier, Expr> {
    map.iter()
        .filter(|(k, _)| !binders.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn binary(f: &mut fmt::Formatter<'_>, a: &Expr, op: &str, b: &Expr, prec: u8) -> fmt::Result {
    a.fmt_prec(f, prec)?;
    write!(f, " {} ", op)?;
    b.fmt_prec(f, prec + 1)
}

fn nary(f: &mut fmt::Formatter<'_>, elems: &[Expr], op: &str, prec: u8) -> fmt::Result {
    for (i, e) in elems.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", op)?;
        }
        e.fmt_prec(f, prec + 1)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}
