//! Bound propagation over a decomposed problem.
//!
//! Clauses without boolean literals whose arithmetic literals all mention
//! the same variables bound each of those variables: in every solution some
//! literal holds, so the variable lies in the hull of the per-literal
//! intervals. A variable whose domain shrinks is replaced by a fresh
//! auxiliary over the narrowed domain, and the scan repeats until nothing
//! moves.
//!
//! # Examples
//!
//! ```
//! use cspforge_core::{CspBuilder, CspFactory, IntegerDomain};
//! use cspforge_encoder::propagate;
//!
//! let mut factory = CspFactory::new();
//! let x = factory.int_var_range("x", 0, 10).unwrap();
//! let xt = factory.variable(&x);
//! let three = factory.constant(3);
//! let formula = factory.le(xt, three);
//!
//! let mut builder = CspBuilder::new();
//! builder.add_formula(&mut factory, &formula).unwrap();
//! let csp = builder.build();
//!
//! let (propagated, report) = propagate(&mut factory, &csp).unwrap();
//! assert_eq!(report.narrowed, 1);
//! assert_eq!(propagated.resolve(&x).domain(), &IntegerDomain::range(0, 3));
//! ```


use std::collections::{BTreeMap, BTreeSet};

use cspforge_core::domain::{ceil_div, floor_div};
use cspforge_core::{
    Csp, CspError, CspFactory, IntVar, IntegerClause, IntegerDomain, LinearExpression,
    LinearLiteral, LinearOp, Result,
};
use tracing::{debug, info};

/// Outcome counters of one propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Passes over the candidate clauses, including the final quiet one.
    pub rounds: usize,
    /// Variable replacements made.
    pub narrowed: usize,
    /// Some variable lost every value.
    pub unsat: bool,
}

/// A clause the propagator reads bounds from.
struct Candidate {
    literals: Vec<LinearLiteral>,
    vars: BTreeSet<IntVar>,
}

impl Candidate {
    fn from_clause(clause: &IntegerClause) -> Option<Self> {
        if !clause.bool_lits().is_empty() || clause.arith_lits().is_empty() {
            return None;
        }
        let literals = clause
            .arith_lits()
            .iter()
            .map(|l| l.as_linear())
            .collect::<Option<Vec<_>>>()?;
        let vars: BTreeSet<IntVar> = literals[0].expr().vars().cloned().collect();
        if vars.is_empty() {
            return None;
        }
        let shared = literals[1..]
            .iter()
            .all(|l| l.expr().vars().cloned().collect::<BTreeSet<_>>() == vars);
        shared.then_some(Candidate { literals, vars })
    }
}

/// Narrows variable domains to a fixpoint and returns the rewritten problem.
///
/// The returned `Csp` keeps the original visible variables and records in
/// its substitution which variable now stands for each narrowed one. When
/// nothing narrows the input comes back with only its propagated flag set.
///
/// # Errors
///
/// Returns [`CspError::AlreadyPropagated`] if `csp` was already propagated.
pub fn propagate(factory: &mut CspFactory, csp: &Csp) -> Result<(Csp, PropagationReport)> {
    if csp.is_propagated() {
        return Err(CspError::AlreadyPropagated);
    }
    let candidates: Vec<Candidate> = csp.clauses.iter().filter_map(Candidate::from_clause).collect();
    info!(
        event = "propagate_start",
        clauses = csp.clauses.len(),
        candidates = candidates.len(),
    );

    let mut report = PropagationReport::default();
    let mut current: BTreeMap<IntVar, IntVar> = BTreeMap::new();
    'fixpoint: loop {
        report.rounds += 1;
        let mut changed = false;
        for candidate in &candidates {
            let mut literals = substitute_all(&candidate.literals, &current);
            for v in &candidate.vars {
                let cur = current.get(v).unwrap_or(v).clone();
                let narrowed = narrow(&literals, &cur);
                if narrowed.size() == cur.domain().size() {
                    continue;
                }
                if narrowed.is_empty() {
                    debug!(event = "propagate_wipeout", var = %v);
                    report.unsat = true;
                    break 'fixpoint;
                }
                let aux = factory.aux_int_var(narrowed);
                debug!(event = "propagate_narrow", var = %v, domain = %aux.domain());
                current.insert(v.clone(), aux);
                report.narrowed += 1;
                changed = true;
                literals = substitute_all(&candidate.literals, &current);
            }
        }
        if !changed {
            break;
        }
    }

    info!(
        event = "propagate_end",
        rounds = report.rounds,
        narrowed = report.narrowed,
        unsat = report.unsat,
    );
    if report.narrowed == 0 && !report.unsat {
        let mut out = csp.clone();
        out.propagated = true;
        return Ok((out, report));
    }
    Ok((rewrite(csp, current, report.unsat), report))
}

fn substitute_all(
    literals: &[LinearLiteral],
    substitution: &BTreeMap<IntVar, IntVar>,
) -> Vec<LinearLiteral> {
    literals.iter().map(|l| l.substitute(substitution)).collect()
}

/// Domain of `var` restricted to the hull of what each literal allows.
fn narrow(literals: &[LinearLiteral], var: &IntVar) -> IntegerDomain {
    let domain = var.domain();
    let hull = literals
        .iter()
        .filter_map(|l| derive_interval(l, var))
        .map(|(lb, ub)| (lb.max(domain.lb()), ub.min(domain.ub())))
        .filter(|(lb, ub)| lb <= ub)
        .reduce(|(l1, u1), (l2, u2)| (l1.min(l2), u1.max(u2)));
    match hull {
        Some((lb, ub)) => domain.bound(lb, ub),
        None => IntegerDomain::EMPTY,
    }
}

/// Interval of `var` consistent with `literal` given the bounds of the
/// other variables, or `None` if `var` does not occur in it.
///
/// The interval is not intersected with the domain of `var`, and may be
/// empty (`lb > ub`).
///
/// ```
/// use cspforge_core::{CspFactory, LinearExpression, LinearLiteral};
/// use cspforge_encoder::propagate::derive_interval;
///
/// let mut factory = CspFactory::new();
/// let a = factory.int_var_range("a", 1, 2).unwrap();
/// let b = factory.int_var_range("b", 10, 12).unwrap();
/// let c = factory.int_var_range("c", -5, 12).unwrap();
/// // a + b - c = 0
/// let expr = LinearExpression::from_var(&a)
///     .add(&LinearExpression::from_var(&b))
///     .sub(&LinearExpression::from_var(&c));
/// assert_eq!(derive_interval(&LinearLiteral::eq(expr), &c), Some((11, 14)));
/// ```
pub fn derive_interval(literal: &LinearLiteral, var: &IntVar) -> Option<(i64, i64)> {
    let expr = literal.expr();
    let a = expr.coef(var);
    if a == 0 {
        return None;
    }
    let domain = var.domain();
    let rest = LinearExpression::new(
        expr.coefs()
            .iter()
            .filter(|(v, _)| *v != var)
            .map(|(v, b)| (v.clone(), *b))
            .collect(),
        0,
    );
    let (rl, ru) = rest.wide_bounds();
    let k = expr.constant() as i128;
    let (lb, ub) = (domain.lb() as i128, domain.ub() as i128);
    let a = a as i128;
    // a*var lies in [-k - ru, -k - rl]
    let (lo, hi) = ((-k).saturating_sub(ru), (-k).saturating_sub(rl));
    let interval = match literal.op() {
        LinearOp::Le => {
            if a > 0 {
                (lb, floor_div(hi, a))
            } else {
                (ceil_div(hi, a), ub)
            }
        }
        LinearOp::Eq => {
            if a > 0 {
                (ceil_div(lo, a), floor_div(hi, a))
            } else {
                (ceil_div(hi, a), floor_div(lo, a))
            }
        }
        LinearOp::Ne => (lb, ub),
    };
    let interval = (narrow_to_i64(interval.0), narrow_to_i64(interval.1));
    Some(interval)
}

fn narrow_to_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

fn rewrite(csp: &Csp, substitution: BTreeMap<IntVar, IntVar>, unsat: bool) -> Csp {
    let mut out = Csp {
        int_vars: csp.int_vars.clone(),
        internal_int_vars: csp.internal_int_vars.clone(),
        bool_vars: csp.bool_vars.clone(),
        internal_bool_vars: csp.internal_bool_vars.clone(),
        clauses: BTreeSet::new(),
        substitution: BTreeMap::new(),
        propagated: true,
    };
    for clause in &csp.clauses {
        if let Some(clause) = clause.substitute(&substitution).simplified() {
            out.add_clause(clause);
        }
    }
    if unsat {
        out.add_clause(IntegerClause::new());
    }
    for aux in substitution.values() {
        out.internal_int_vars.insert(aux.clone());
    }
    out.substitution = substitution;
    out
}
