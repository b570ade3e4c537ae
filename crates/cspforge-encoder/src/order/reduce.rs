//! Reduction of integer clauses to the order encoder's input form.

use std::collections::BTreeMap;

use cspforge_core::{
    ArithmeticLiteral, BoolLit, CspError, CspFactory, IntVar, IntegerClause, LinearExpression,
    LinearLiteral, LinearOp, ProductLiteral, Result,
};
use tracing::trace;

use super::{term_order, OrderEncoder};
use crate::emit::ClauseSink;

/// A clause of boolean literals and `<=` literals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LeClause {
    pub bools: Vec<BoolLit>,
    pub les: Vec<LinearLiteral>,
}

impl LeClause {
    fn unit(literal: LinearLiteral) -> Self {
        LeClause {
            bools: Vec::new(),
            les: vec![literal],
        }
    }

    fn complex_count(&self) -> usize {
        self.les.iter().filter(|l| !l.is_simple()).count()
    }
}

/// Conjunction of disjunctions of `<=` literals.
type Cnf = Vec<Vec<LinearLiteral>>;

impl OrderEncoder {
    /// Rewrites `clause` into clauses of `<=` literals with at most one
    /// non-simple literal each. Definitions of auxiliary variables come
    /// first in the result.
    pub(crate) fn reduce(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        sink: &mut ClauseSink<'_>,
    ) -> Result<Vec<LeClause>> {
        let Some(clause) = clause.simplified() else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        let mut bools: Vec<BoolLit> = clause.bool_lits().iter().cloned().collect();
        let mut les = Vec::new();
        let mut pending: Vec<Cnf> = Vec::new();
        for literal in clause.arith_lits() {
            let cnf = self.literal_cnf(factory, literal, sink, &mut out)?;
            match cnf.len() {
                0 => return Ok(out),
                1 => les.extend(cnf.into_iter().flatten()),
                _ => pending.push(cnf),
            }
        }

        // One multi-clause literal is distributed over the rest of the
        // clause, the others hide behind fresh booleans.
        let last = pending.pop();
        for cnf in pending {
            let p = sink.fresh_bool();
            bools.push(p.positive());
            for disjunction in cnf {
                out.push(LeClause {
                    bools: vec![p.negative()],
                    les: disjunction,
                });
            }
        }
        match last {
            None => out.push(LeClause { bools, les }),
            Some(cnf) => {
                for disjunction in cnf {
                    let mut merged = les.clone();
                    merged.extend(disjunction);
                    out.push(LeClause {
                        bools: bools.clone(),
                        les: merged,
                    });
                }
            }
        }

        let mut guarded = Vec::with_capacity(out.len());
        for c in out {
            self.guard(c, sink, &mut guarded);
        }
        Ok(guarded)
    }

    /// Keeps the first non-simple literal and moves every other one behind
    /// a fresh boolean.
    fn guard(&mut self, clause: LeClause, sink: &mut ClauseSink<'_>, out: &mut Vec<LeClause>) {
        if clause.complex_count() <= 1 {
            out.push(clause);
            return;
        }
        let mut bools = clause.bools;
        let mut les = Vec::with_capacity(clause.les.len());
        let mut kept = false;
        for literal in clause.les {
            if literal.is_simple() {
                les.push(literal);
            } else if !kept {
                kept = true;
                les.push(literal);
            } else {
                let p = sink.fresh_bool();
                trace!(event = "order_guard", literal = %literal, guard = %p);
                bools.push(p.positive());
                out.push(LeClause {
                    bools: vec![p.negative()],
                    les: vec![literal],
                });
            }
        }
        out.push(LeClause { bools, les });
    }

    fn literal_cnf(
        &mut self,
        factory: &mut CspFactory,
        literal: &ArithmeticLiteral,
        sink: &mut ClauseSink<'_>,
        side: &mut Vec<LeClause>,
    ) -> Result<Cnf> {
        let cnf = if let Some(linear) = literal.as_linear() {
            self.linear_cnf(factory, &linear, sink, side)
        } else if let Some(product) = literal.as_product() {
            product_cnf(&product)
        } else {
            return Err(CspError::InvalidState(format!(
                "literal has neither a linear nor a product form: {}",
                literal
            )));
        };
        Ok(normalize(cnf))
    }

    fn linear_cnf(
        &mut self,
        factory: &mut CspFactory,
        literal: &LinearLiteral,
        sink: &mut ClauseSink<'_>,
        side: &mut Vec<LeClause>,
    ) -> Cnf {
        let e = self.split(factory, literal.expr(), true, sink, side);
        match literal.op() {
            LinearOp::Le => vec![vec![LinearLiteral::le(e)]],
            LinearOp::Eq => vec![
                vec![LinearLiteral::le(e.clone())],
                vec![LinearLiteral::le(e.negate())],
            ],
            // e != 0  iff  e <= -1 or e >= 1
            LinearOp::Ne => vec![vec![
                LinearLiteral::le(e.add_constant(1)),
                LinearLiteral::le(e.negate().add_constant(1)),
            ]],
        }
    }

    /// Replaces groups of terms by auxiliary variables until the case split
    /// of `expr` stays within the threshold: three groups at the top level,
    /// two below.
    pub(crate) fn split(
        &mut self,
        factory: &mut CspFactory,
        expr: &LinearExpression,
        first: bool,
        sink: &mut ClauseSink<'_>,
        side: &mut Vec<LeClause>,
    ) -> LinearExpression {
        if expr.len() < 3 || case_split_size(expr) <= self.split_threshold {
            return expr.clone();
        }
        let mut terms: Vec<(IntVar, i64)> =
            expr.coefs().iter().map(|(v, a)| (v.clone(), *a)).collect();
        terms.sort_by_key(term_order);
        let parts = if first { 3 } else { 2 };
        let chunk = terms.len().div_ceil(parts);
        trace!(event = "order_split", terms = terms.len(), parts);

        let mut result = LinearExpression::from_constant(expr.constant());
        for group in terms.chunks(chunk) {
            let sum = LinearExpression::new(group.iter().cloned().collect(), 0);
            if group.len() == 1 {
                result = result.add(&sum);
                continue;
            }
            let sum = self.split(factory, &sum, false, sink, side);
            let g = sum.gcd();
            let reduced = LinearExpression::new(
                sum.coefs()
                    .iter()
                    .map(|(v, a)| (v.clone(), a / g))
                    .collect::<BTreeMap<_, _>>(),
                0,
            );
            let v = sink.aux_int_var(factory, reduced.domain().clone());
            let defined = LinearExpression::from_var(&v);
            side.push(LeClause::unit(LinearLiteral::le(reduced.sub(&defined))));
            side.push(LeClause::unit(LinearLiteral::le(defined.sub(&reduced))));
            result = result.add(&LinearExpression::from_term(&v, g));
        }
        result
    }
}

/// `z = x * y` as a case split on the smaller factor:
/// for every value `a` of it, `f != a or z = a * other`.
fn product_cnf(product: &ProductLiteral) -> Cnf {
    let (small, large) = if product.x.domain().size() <= product.y.domain().size() {
        (&product.x, &product.y)
    } else {
        (&product.y, &product.x)
    };
    let f = LinearExpression::from_var(small);
    let mut cnf = Vec::new();
    for a in small.domain().values() {
        let below = LinearLiteral::le(f.add_constant(1 - a));
        let above = LinearLiteral::le(f.negate().add_constant(a + 1));
        let eq = LinearExpression::from_var(&product.z).sub(&LinearExpression::from_term(large, a));
        for part in [eq.clone(), eq.negate()] {
            cnf.push(vec![below.clone(), above.clone(), LinearLiteral::le(part)]);
        }
    }
    cnf
}

/// Drops false literals and true disjunctions.
fn normalize(cnf: Cnf) -> Cnf {
    cnf.into_iter()
        .filter(|d| !d.iter().any(LinearLiteral::is_valid))
        .map(|d| d.into_iter().filter(|l| !l.is_unsat()).collect())
        .collect()
}

/// Number of clauses a case split over `expr` emits, saturating.
pub(crate) fn case_split_size(expr: &LinearExpression) -> u64 {
    let mut sizes: Vec<u64> = expr.vars().map(|v| v.domain().size()).collect();
    sizes.sort_unstable();
    sizes.pop();
    sizes.into_iter().fold(1u64, |acc, s| acc.saturating_mul(s))
}
