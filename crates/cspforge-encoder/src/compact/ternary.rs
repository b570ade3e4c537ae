//! Splits linear literals down to three terms.

use cspforge_core::domain::gcd;
use cspforge_core::{
    ArithmeticLiteral, CspFactory, IntVar, IntegerClause, IntegerDomain, LinearExpression,
    LinearLiteral,
};

use super::{bools_only, CompactOrderEncoder};
use crate::emit::ClauseSink;

impl CompactOrderEncoder {
    pub(super) fn ternary(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        sink: &mut ClauseSink<'_>,
    ) -> Vec<IntegerClause> {
        let mut out = Vec::new();
        let mut rewritten = bools_only(clause);
        for literal in clause.arith_lits() {
            match literal {
                ArithmeticLiteral::Linear(l) if l.expr().len() > 3 => {
                    let expr = split_ternary(factory, l.expr(), sink, &mut out);
                    rewritten.push_arith(LinearLiteral::new(expr, l.op()));
                }
                other => rewritten.push_arith(other.clone()),
            }
        }
        out.push(rewritten);
        out
    }
}

/// Replaces pairs of same-sign terms by auxiliaries until three terms remain.
///
/// The pair comes from the larger sign group and has the smallest
/// `|a| * ub` products, `a1*x1 + a2*x2` becoming `g * v` with
/// `v = (a1/g)*x1 + (a2/g)*x2`. Merging within one sign keeps every
/// auxiliary's domain the sum of its parts, never a difference spanning
/// both signs, and the larger group is the one guaranteed to hold a pair.
fn split_ternary(
    factory: &mut CspFactory,
    expr: &LinearExpression,
    sink: &mut ClauseSink<'_>,
    defs: &mut Vec<IntegerClause>,
) -> LinearExpression {
    let mut expr = expr.clone();
    while expr.len() > 3 {
        let (pos, neg): (Vec<(IntVar, i64)>, Vec<(IntVar, i64)>) = expr
            .coefs()
            .iter()
            .map(|(v, a)| (v.clone(), *a))
            .partition(|(_, a)| *a > 0);
        let mut group = if pos.len() >= neg.len() { pos } else { neg };
        group.sort_by_key(|(v, a)| {
            (
                a.unsigned_abs().saturating_mul(v.domain().ub().unsigned_abs()),
                v.id(),
            )
        });
        let (x1, a1) = group[0].clone();
        let (x2, a2) = group[1].clone();
        let g = gcd(a1.abs(), a2.abs());
        let (c1, c2) = (a1.abs() / g, a2.abs() / g);
        let ub = c1 * x1.domain().ub() + c2 * x2.domain().ub();
        let v = sink.aux_int_var(factory, IntegerDomain::range(0, ub));
        let def = LinearExpression::from_term(&x1, c1)
            .add(&LinearExpression::from_term(&x2, c2))
            .sub(&LinearExpression::from_var(&v));
        defs.push(IntegerClause::from_arith(LinearLiteral::eq(def)));
        expr = expr
            .sub(&LinearExpression::from_term(&x1, a1))
            .sub(&LinearExpression::from_term(&x2, a2))
            .add(&LinearExpression::from_term(&v, a1.signum() * g));
    }
    expr
}
