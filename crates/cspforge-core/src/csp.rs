//! Constraint problems in clausal form.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::clause::IntegerClause;
use crate::error::Result;
use crate::formula::Formula;
use crate::term::CspFactory;
use crate::variable::{BoolVar, IntVar};

/// Variables and clauses of a decomposed problem.
///
/// `substitution` maps an original variable to the variable that replaced
/// it during propagation. `propagated` is set once propagation has run,
/// even if it narrowed nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Csp {
    pub int_vars: BTreeSet<IntVar>,
    pub internal_int_vars: BTreeSet<IntVar>,
    pub bool_vars: BTreeSet<BoolVar>,
    pub internal_bool_vars: BTreeSet<BoolVar>,
    pub clauses: BTreeSet<IntegerClause>,
    pub substitution: BTreeMap<IntVar, IntVar>,
    pub propagated: bool,
}

impl Csp {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once propagation has run over this problem.
    pub fn is_propagated(&self) -> bool {
        self.propagated
    }

    /// The variable currently standing for `var`.
    pub fn resolve<'a>(&'a self, var: &'a IntVar) -> &'a IntVar {
        let mut current = var;
        while let Some(next) = self.substitution.get(current) {
            current = next;
        }
        current
    }

    /// True if some clause is empty.
    pub fn is_unsat(&self) -> bool {
        self.clauses.iter().any(IntegerClause::is_empty)
    }

    /// Every integer variable, visible and internal.
    pub fn all_int_vars(&self) -> impl Iterator<Item = &IntVar> {
        self.int_vars.iter().chain(self.internal_int_vars.iter())
    }

    /// Adds a clause, registering the variables it mentions.
    pub fn add_clause(&mut self, clause: IntegerClause) {
        for v in clause.int_vars() {
            self.register_int_var(v);
        }
        for b in clause.bool_vars() {
            self.register_bool_var(b);
        }
        self.clauses.insert(clause);
    }

    fn register_int_var(&mut self, var: IntVar) {
        if var.is_aux() {
            if !self.int_vars.contains(&var) {
                self.internal_int_vars.insert(var);
            }
        } else {
            self.int_vars.insert(var);
        }
    }

    fn register_bool_var(&mut self, var: BoolVar) {
        if var.is_aux() {
            if !self.bool_vars.contains(&var) {
                self.internal_bool_vars.insert(var);
            }
        } else {
            self.bool_vars.insert(var);
        }
    }
}

/// Accumulates variables and formulas into a [`Csp`].
///
/// # Examples
///
/// ```
/// use cspforge_core::{CspBuilder, CspFactory};
///
/// let mut factory = CspFactory::new();
/// let a = factory.int_var_range("a", 0, 3).unwrap();
/// let at = factory.variable(&a);
/// let two = factory.constant(2);
/// let formula = factory.eq(at, two);
///
/// let mut builder = CspBuilder::new();
/// builder.add_formula(&mut factory, &formula).unwrap();
/// let csp = builder.build();
/// assert_eq!(csp.clauses.len(), 1);
/// assert!(csp.int_vars.contains(&a));
/// ```
#[derive(Debug, Default)]
pub struct CspBuilder {
    csp: Csp,
}

impl CspBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable even if no constraint mentions it.
    pub fn add_int_var(&mut self, var: &IntVar) -> &mut Self {
        self.csp.register_int_var(var.clone());
        self
    }

    pub fn add_bool_var(&mut self, var: &BoolVar) -> &mut Self {
        self.csp.register_bool_var(var.clone());
        self
    }

    /// Decomposes `formula` and adds its clauses.
    pub fn add_formula(&mut self, factory: &mut CspFactory, formula: &Formula) -> Result<&mut Self> {
        let d = factory.decompose(formula)?;
        debug!(
            event = "decompose_end",
            clauses = d.clauses.len(),
            aux_int_vars = d.int_vars.len(),
            aux_bool_vars = d.bool_vars.len(),
        );
        for v in d.int_vars {
            self.csp.register_int_var(v);
        }
        for b in d.bool_vars {
            self.csp.register_bool_var(b);
        }
        for clause in d.clauses {
            self.csp.add_clause(clause);
        }
        Ok(self)
    }

    pub fn add_clause(&mut self, clause: IntegerClause) -> &mut Self {
        self.csp.add_clause(clause);
        self
    }

    pub fn build(self) -> Csp {
        self.csp
    }
}
