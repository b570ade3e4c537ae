//! Propositional literals and the clause sink in front of the SAT backend.

use std::collections::BTreeSet;
use std::fmt;

use cspforge_core::{BoolLit, BoolVar, CspFactory, IntVar, IntegerDomain, SatBackend};
use smallvec::SmallVec;

use crate::stats::EncodingStats;

/// A propositional literal that may already be decided.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lit {
    Const(bool),
    Bool(BoolLit),
}

impl Lit {
    pub const TRUE: Lit = Lit::Const(true);
    pub const FALSE: Lit = Lit::Const(false);

    pub fn negate(&self) -> Lit {
        match self {
            Lit::Const(b) => Lit::Const(!b),
            Lit::Bool(l) => Lit::Bool(l.negate()),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Lit::Const(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Lit::Const(false))
    }
}

impl From<BoolLit> for Lit {
    fn from(lit: BoolLit) -> Self {
        Lit::Bool(lit)
    }
}

impl From<bool> for Lit {
    fn from(value: bool) -> Self {
        Lit::Const(value)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lit::Const(true) => f.write_str("true"),
            Lit::Const(false) => f.write_str("false"),
            Lit::Bool(l) => write!(f, "{}", l),
        }
    }
}

/// Literal buffer for clauses under construction.
pub type LitBuf = SmallVec<[Lit; 8]>;

/// Forwards clauses to a [`SatBackend`], folding constant literals.
///
/// A clause with a true literal, or with a variable in both signs, is
/// dropped. False literals are stripped, so a clause of only false literals
/// reaches the backend as the empty clause.
pub struct ClauseSink<'a> {
    backend: &'a mut dyn SatBackend,
    stats: &'a mut EncodingStats,
}

impl<'a> ClauseSink<'a> {
    pub fn new(backend: &'a mut dyn SatBackend, stats: &'a mut EncodingStats) -> Self {
        ClauseSink { backend, stats }
    }

    /// A fresh propositional variable from the backend.
    pub fn fresh_bool(&mut self) -> BoolVar {
        self.stats.record_aux_bool();
        self.backend.new_aux_var()
    }

    /// A fresh auxiliary integer variable.
    pub fn aux_int_var(&mut self, factory: &mut CspFactory, domain: IntegerDomain) -> IntVar {
        self.stats.record_aux_int();
        factory.aux_int_var(domain)
    }

    pub fn emit(&mut self, lits: impl IntoIterator<Item = Lit>) {
        let mut clause: BTreeSet<BoolLit> = BTreeSet::new();
        for lit in lits {
            match lit {
                Lit::Const(true) => {
                    self.stats.record_dropped();
                    return;
                }
                Lit::Const(false) => {}
                Lit::Bool(l) => {
                    if clause.contains(&l.negate()) {
                        self.stats.record_dropped();
                        return;
                    }
                    clause.insert(l);
                }
            }
        }
        self.stats.record_clause(clause.len());
        self.backend.add_clause(clause.into_iter().collect());
    }

    pub fn stats(&self) -> &EncodingStats {
        self.stats
    }
}
