//! Boundary to the external SAT engine.

use std::collections::BTreeSet;

use crate::variable::{BoolLit, BoolVar};

/// A clause sink backed by a SAT engine.
///
/// Clauses handed to a backend never contain constant literals: encoders
/// drop clauses that are already satisfied and strip literals that are
/// already false.
pub trait SatBackend {
    /// Allocates a fresh propositional variable.
    fn new_aux_var(&mut self) -> BoolVar;

    /// Adds the disjunction of `literals`.
    fn add_clause(&mut self, literals: Vec<BoolLit>);
}

/// A satisfying assignment read back from the SAT engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    positive: BTreeSet<BoolVar>,
    negative: BTreeSet<BoolVar>,
}

impl Model {
    pub fn new(positive: BTreeSet<BoolVar>, negative: BTreeSet<BoolVar>) -> Self {
        debug_assert!(positive.is_disjoint(&negative));
        Model { positive, negative }
    }

    /// `None` if the model does not mention `var`.
    pub fn is_true(&self, var: &BoolVar) -> Option<bool> {
        if self.positive.contains(var) {
            Some(true)
        } else if self.negative.contains(var) {
            Some(false)
        } else {
            None
        }
    }

    pub fn positive(&self) -> &BTreeSet<BoolVar> {
        &self.positive
    }

    pub fn negative(&self) -> &BTreeSet<BoolVar> {
        &self.negative
    }
}
