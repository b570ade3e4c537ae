//! Decoded variable values.

use std::collections::{BTreeMap, BTreeSet};

use crate::clause::IntegerClause;
use crate::variable::{BoolVar, IntVar};

/// Integer values plus the boolean variables known true and false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspAssignment {
    int_values: BTreeMap<IntVar, i64>,
    positive: BTreeSet<BoolVar>,
    negative: BTreeSet<BoolVar>,
}

impl CspAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_int(&mut self, var: &IntVar, value: i64) {
        self.int_values.insert(var.clone(), value);
    }

    pub fn set_bool(&mut self, var: &BoolVar, value: bool) {
        if value {
            self.negative.remove(var);
            self.positive.insert(var.clone());
        } else {
            self.positive.remove(var);
            self.negative.insert(var.clone());
        }
    }

    pub fn int_value(&self, var: &IntVar) -> Option<i64> {
        self.int_values.get(var).copied()
    }

    pub fn bool_value(&self, var: &BoolVar) -> Option<bool> {
        if self.positive.contains(var) {
            Some(true)
        } else if self.negative.contains(var) {
            Some(false)
        } else {
            None
        }
    }

    pub fn int_values(&self) -> &BTreeMap<IntVar, i64> {
        &self.int_values
    }

    pub fn positive(&self) -> &BTreeSet<BoolVar> {
        &self.positive
    }

    pub fn negative(&self) -> &BTreeSet<BoolVar> {
        &self.negative
    }

    /// Truth value of `clause`, or `None` if it depends on unassigned variables.
    pub fn satisfies(&self, clause: &IntegerClause) -> Option<bool> {
        let mut unknown = false;
        for lit in clause.bool_lits() {
            match self.bool_value(lit.var()) {
                Some(v) if v == lit.is_positive() => return Some(true),
                Some(_) => {}
                None => unknown = true,
            }
        }
        for lit in clause.arith_lits() {
            match lit.evaluate(&self.int_values) {
                Some(true) => return Some(true),
                Some(false) => {}
                None => unknown = true,
            }
        }
        if unknown {
            None
        } else {
            Some(false)
        }
    }
}
