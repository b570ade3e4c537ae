//! Decomposition of formulas into mixed boolean/arithmetic clauses.
//!
//! A formula is first put in negation normal form, then each node maps to a
//! [`Decomposition`]: AND unions the children's clause sets, OR expands them
//! distributively, and predicates are decomposed once per factory and
//! memoized.

mod predicate;
mod term;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use crate::clause::IntegerClause;
use crate::error::{CspError, Result};
use crate::formula::Formula;
use crate::term::CspFactory;
use crate::variable::{BoolVar, IntVar};

/// A clause set plus the auxiliary variables its clauses introduced.
///
/// No clauses means true. A set containing the empty clause means false and
/// is kept as exactly `{empty clause}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    pub clauses: BTreeSet<IntegerClause>,
    pub int_vars: BTreeSet<IntVar>,
    pub bool_vars: BTreeSet<BoolVar>,
}

impl Decomposition {
    /// The decomposition of `true`.
    pub fn valid() -> Self {
        Self::default()
    }

    /// The decomposition of `false`.
    pub fn unsat() -> Self {
        Self::from_clause(IntegerClause::new())
    }

    pub fn from_clause(clause: IntegerClause) -> Self {
        Decomposition {
            clauses: BTreeSet::from([clause]),
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn is_unsat(&self) -> bool {
        self.clauses.iter().any(IntegerClause::is_empty)
    }

    /// Conjunction.
    pub fn and(mut self, other: &Decomposition) -> Self {
        self.merge_vars(other);
        if self.is_unsat() || other.is_unsat() {
            self.clauses = BTreeSet::from([IntegerClause::new()]);
        } else {
            self.clauses.extend(other.clauses.iter().cloned());
        }
        self
    }

    /// Disjunction by distributive expansion.
    pub fn or(mut self, other: &Decomposition) -> Self {
        self.merge_vars(other);
        if self.is_valid() || other.is_valid() {
            self.clauses.clear();
        } else if self.is_unsat() {
            self.clauses = other.clauses.clone();
        } else if !other.is_unsat() {
            let mut expanded = BTreeSet::new();
            for left in &self.clauses {
                for right in &other.clauses {
                    expanded.insert(left.union(right));
                }
            }
            self.clauses = expanded;
        }
        self
    }

    fn merge_vars(&mut self, other: &Decomposition) {
        self.int_vars.extend(other.int_vars.iter().cloned());
        self.bool_vars.extend(other.bool_vars.iter().cloned());
    }
}

fn kind_name(formula: &Formula) -> &'static str {
    match formula {
        Formula::Constant(_) => "constant",
        Formula::Literal(_) => "literal",
        Formula::Predicate(_) => "predicate",
        Formula::Not(_) => "not",
        Formula::And(_) => "and",
        Formula::Or(_) => "or",
        Formula::Implies(_, _) => "implies",
        Formula::Equiv(_, _) => "equiv",
    }
}

impl CspFactory {
    /// Decomposes `formula` into clauses.
    ///
    /// # Errors
    ///
    /// Propagates `UnsupportedPredicate` for foreign predicate handles.
    pub fn decompose(&mut self, formula: &Formula) -> Result<Decomposition> {
        let nnf = formula.to_nnf();
        self.decompose_normalized(&nnf)
    }

    /// Decomposes a formula already in negation normal form.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormula` for implications, equivalences, and negations
    /// of anything but a predicate, literal or constant.
    pub fn decompose_normalized(&mut self, formula: &Formula) -> Result<Decomposition> {
        match formula {
            Formula::Constant(true) => Ok(Decomposition::valid()),
            Formula::Constant(false) => Ok(Decomposition::unsat()),
            Formula::Literal(l) => {
                let mut d = Decomposition::from_clause(IntegerClause::from_bool(l.clone()));
                d.bool_vars.insert(l.var().clone());
                Ok(d)
            }
            Formula::Predicate(id) => Ok(self.decompose_predicate(*id)?.as_ref().clone()),
            Formula::Not(inner) => match inner.as_ref() {
                Formula::Predicate(id) => {
                    let negated = self.negate_predicate(*id)?;
                    Ok(self.decompose_predicate(negated)?.as_ref().clone())
                }
                Formula::Literal(l) => self.decompose_normalized(&Formula::Literal(l.negate())),
                Formula::Constant(b) => self.decompose_normalized(&Formula::Constant(!b)),
                other => Err(CspError::UnsupportedFormula(format!(
                    "negation of {} in normalized formula",
                    kind_name(other)
                ))),
            },
            Formula::And(children) => {
                let mut result = Decomposition::valid();
                for child in children {
                    let d = self.decompose_normalized(child)?;
                    result = result.and(&d);
                    if result.is_unsat() {
                        break;
                    }
                }
                Ok(result)
            }
            Formula::Or(children) => {
                let mut result = Decomposition::unsat();
                for child in children {
                    let d = self.decompose_normalized(child)?;
                    result = result.or(&d);
                    if result.is_valid() {
                        break;
                    }
                }
                Ok(result)
            }
            Formula::Implies(_, _) | Formula::Equiv(_, _) => Err(CspError::UnsupportedFormula(
                format!("{} in normalized formula", kind_name(formula)),
            )),
        }
    }
}
