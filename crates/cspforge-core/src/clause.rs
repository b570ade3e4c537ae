//! Mixed boolean/arithmetic clauses.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::literal::ArithmeticLiteral;
use crate::variable::{BoolLit, BoolVar, IntVar};

/// A disjunction of boolean and arithmetic literals.
///
/// The empty clause is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntegerClause {
    bool_lits: BTreeSet<BoolLit>,
    arith_lits: BTreeSet<ArithmeticLiteral>,
}

impl IntegerClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        bool_lits: impl IntoIterator<Item = BoolLit>,
        arith_lits: impl IntoIterator<Item = ArithmeticLiteral>,
    ) -> Self {
        IntegerClause {
            bool_lits: bool_lits.into_iter().collect(),
            arith_lits: arith_lits.into_iter().collect(),
        }
    }

    pub fn from_bool(lit: BoolLit) -> Self {
        Self::from_parts([lit], [])
    }

    pub fn from_arith(lit: impl Into<ArithmeticLiteral>) -> Self {
        Self::from_parts([], [lit.into()])
    }

    pub fn bool_lits(&self) -> &BTreeSet<BoolLit> {
        &self.bool_lits
    }

    pub fn arith_lits(&self) -> &BTreeSet<ArithmeticLiteral> {
        &self.arith_lits
    }

    pub fn push_bool(&mut self, lit: BoolLit) {
        self.bool_lits.insert(lit);
    }

    pub fn push_arith(&mut self, lit: impl Into<ArithmeticLiteral>) {
        self.arith_lits.insert(lit.into());
    }

    /// Number of literals.
    pub fn len(&self) -> usize {
        self.bool_lits.len() + self.arith_lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bool_lits.is_empty() && self.arith_lits.is_empty()
    }

    /// Disjunction of both clauses.
    pub fn union(&self, other: &Self) -> Self {
        IntegerClause {
            bool_lits: self.bool_lits.union(&other.bool_lits).cloned().collect(),
            arith_lits: self.arith_lits.union(&other.arith_lits).cloned().collect(),
        }
    }

    /// True if an arithmetic literal is valid or a variable occurs with both signs.
    pub fn is_valid(&self) -> bool {
        self.arith_lits.iter().any(|l| l.is_valid())
            || self
                .bool_lits
                .iter()
                .any(|l| self.bool_lits.contains(&l.negate()))
    }

    /// Drops unsatisfiable arithmetic literals. Returns `None` when the
    /// clause is valid.
    pub fn simplified(&self) -> Option<Self> {
        if self.is_valid() {
            return None;
        }
        Some(IntegerClause {
            bool_lits: self.bool_lits.clone(),
            arith_lits: self
                .arith_lits
                .iter()
                .filter(|l| !l.is_unsat())
                .cloned()
                .collect(),
        })
    }

    /// Applies a variable substitution to every arithmetic literal.
    pub fn substitute(&self, substitution: &BTreeMap<IntVar, IntVar>) -> Self {
        IntegerClause {
            bool_lits: self.bool_lits.clone(),
            arith_lits: self
                .arith_lits
                .iter()
                .map(|l| l.substitute(substitution))
                .collect(),
        }
    }

    pub fn int_vars(&self) -> BTreeSet<IntVar> {
        self.arith_lits.iter().flat_map(|l| l.vars()).collect()
    }

    pub fn bool_vars(&self) -> BTreeSet<BoolVar> {
        self.bool_lits.iter().map(|l| l.var().clone()).collect()
    }
}

impl fmt::Display for IntegerClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "false");
        }
        let mut first = true;
        for lit in &self.bool_lits {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{}", lit)?;
            first = false;
        }
        for lit in &self.arith_lits {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "({})", lit)?;
            first = false;
        }
        Ok(())
    }
}
