//! Synthesis problems: inputs, outputs and the constraint relating them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ir::{Expr, Identifier, Type, tuple_type};

/// A synthesis goal
///
/// Find values for `outputs`, computed from `inputs`, such that
/// `constraint` holds. Problems are values: rules derive new problems
/// rather than modifying existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Problem {
    /// Variables free in the constraint and available to the program
    pub inputs: Vec<Identifier>,
    /// Variables the program must produce, in tuple order
    pub outputs: Vec<Identifier>,
    /// Boolean formula over inputs and outputs
    pub constraint: Expr,
}

impl Problem {
    pub fn new(inputs: Vec<Identifier>, outputs: Vec<Identifier>, constraint: Expr) -> Self {
        Self {
            inputs,
            outputs,
            constraint,
        }
    }

    /// Same variables, different constraint
    pub fn with_constraint(&self, constraint: Expr) -> Self {
        Self {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            constraint,
        }
    }

    pub fn with_inputs(&self, inputs: Vec<Identifier>) -> Self {
        Self {
            inputs,
            outputs: self.outputs.clone(),
            constraint: self.constraint.clone(),
        }
    }

    pub fn with_outputs(&self, outputs: Vec<Identifier>) -> Self {
        Self {
            inputs: self.inputs.clone(),
            outputs,
            constraint: self.constraint.clone(),
        }
    }

    /// Type of a solution term
    pub fn output_type(&self) -> Type {
        tuple_type(&self.outputs)
    }

    /// Tuple of the output variables, in order
    pub fn output_tuple(&self) -> Expr {
        Expr::Tuple(self.outputs.iter().map(Identifier::var).collect())
    }

    /// Tuple of default values for the outputs
    pub fn default_term(&self) -> Expr {
        Expr::Tuple(self.outputs.iter().map(|o| o.ty.default_value()).collect())
    }

    /// Outputs that occur free in the constraint
    pub fn constrained_outputs(&self) -> Vec<Identifier> {
        let free = self.constraint.free_vars();
        self.outputs
            .iter()
            .filter(|o| free.contains(*o))
            .cloned()
            .collect()
    }

    /// Constraint with the outputs replaced by the components of `term`
    ///
    /// `term` must be a tuple expression of the output arity; any other
    /// term is bound with a `let` instead.
    pub fn instantiate(&self, term: &Expr) -> Expr {
        match term {
            Expr::Tuple(elems) if elems.len() == self.outputs.len() => {
                let map: BTreeMap<Identifier, Expr> = self
                    .outputs
                    .iter()
                    .cloned()
                    .zip(elems.iter().cloned())
                    .collect();
                self.constraint.substitute(&map)
            }
            other => Expr::LetTuple {
                binders: self.outputs.clone(),
                value: Box::new(other.clone()),
                body: Box::new(self.constraint.clone()),
            },
        }
    }

    /// Rough size of the problem, used by cost estimates
    pub fn size(&self) -> usize {
        self.constraint.size() + self.outputs.len()
    }
}

fn write_ids(f: &mut fmt::Formatter<'_>, ids: &[Identifier]) -> fmt::Result {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", id)?;
    }
    Ok(())
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "⟦ ")?;
        write_ids(f, &self.inputs)?;
        if !self.inputs.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "⟨ {} ⟩ ", self.constraint)?;
        write_ids(f, &self.outputs)?;
        write!(f, " ⟧")
    }
}
