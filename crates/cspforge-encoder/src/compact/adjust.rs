//! Shifts every variable to a zero-based range.

use std::collections::BTreeMap;

use cspforge_core::{
    ArithmeticLiteral, CspError, CspFactory, EqMul, IntVar, IntegerClause, IntegerDomain,
    LinearExpression, LinearLiteral, Operand, Result,
};
use tracing::trace;

use super::{bools_only, CompactOrderEncoder};
use crate::emit::ClauseSink;

impl CompactOrderEncoder {
    pub(super) fn adjust(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        sink: &mut ClauseSink<'_>,
    ) -> Result<Vec<IntegerClause>> {
        let mut out = Vec::new();
        let mut rewritten = bools_only(clause);
        for literal in clause.arith_lits() {
            let adjusted = self.adjust_literal(factory, literal, sink, &mut out)?;
            rewritten.push_arith(adjusted);
        }
        out.push(rewritten);
        Ok(out)
    }

    fn adjust_literal(
        &mut self,
        factory: &mut CspFactory,
        literal: &ArithmeticLiteral,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Result<ArithmeticLiteral> {
        if let Some(linear) = literal.as_linear() {
            let expr = linear.expr();
            let mut constant = expr.constant();
            let mut coefs = BTreeMap::new();
            for (v, a) in expr.coefs() {
                let (shifted, offset) = self.adjusted_var(factory, v, sink, defs);
                constant += a * offset;
                *coefs.entry(shifted).or_insert(0) += a;
            }
            let expr = LinearExpression::new(coefs, constant);
            return Ok(LinearLiteral::new(expr, linear.op()).into());
        }
        let Some(product) = literal.as_product() else {
            return Err(CspError::InvalidState(format!(
                "literal has neither a linear nor a product form: {}",
                literal
            )));
        };
        let (z, oz) = self.adjusted_var(factory, &product.z, sink, defs);
        let (x, ox) = self.adjusted_var(factory, &product.x, sink, defs);
        let (y, oy) = self.adjusted_var(factory, &product.y, sink, defs);
        if oz == 0 && ox == 0 && oy == 0 {
            return Ok(ArithmeticLiteral::EqMul(EqMul {
                z,
                x,
                y: Operand::Var(y),
            }));
        }

        // z' + oz = (x' + ox)(y' + oy) = w + oy*x' + ox*y' + ox*oy
        let w = sink.aux_int_var(
            factory,
            IntegerDomain::range(0, x.domain().ub() * y.domain().ub()),
        );
        defs.push(IntegerClause::from_arith(ArithmeticLiteral::EqMul(EqMul {
            z: w.clone(),
            x: x.clone(),
            y: Operand::Var(y.clone()),
        })));
        let expr = LinearExpression::from_var(&z)
            .sub(&LinearExpression::from_var(&w))
            .sub(&LinearExpression::from_term(&x, oy))
            .sub(&LinearExpression::from_term(&y, ox))
            .add_constant(oz - ox * oy);
        Ok(LinearLiteral::eq(expr).into())
    }

    /// The zero-based stand-in for `var`, created with its gap clauses on
    /// first use.
    fn adjusted_var(
        &mut self,
        factory: &mut CspFactory,
        var: &IntVar,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> (IntVar, i64) {
        if let Some(entry) = self.context.adjusted.get(var) {
            return entry.clone();
        }
        let domain = var.domain();
        let entry = if domain.is_contiguous() && domain.lb() == 0 {
            (var.clone(), 0)
        } else {
            let offset = domain.lb();
            let shifted = sink.aux_int_var(factory, IntegerDomain::range(0, domain.ub() - offset));
            if !domain.is_contiguous() {
                let x = LinearExpression::from_var(&shifted);
                let values: Vec<i64> = domain.values().collect();
                for pair in values.windows(2) {
                    let (lo, hi) = (pair[0] + 1 - offset, pair[1] - 1 - offset);
                    if lo > hi {
                        continue;
                    }
                    let clause = if lo == hi {
                        IntegerClause::from_arith(LinearLiteral::ne(x.add_constant(-lo)))
                    } else {
                        // x' < lo or x' > hi
                        IntegerClause::from_parts(
                            [],
                            [
                                LinearLiteral::le(x.add_constant(1 - lo)).into(),
                                LinearLiteral::le(x.negate().add_constant(hi + 1)).into(),
                            ],
                        )
                    };
                    defs.push(clause);
                }
            }
            trace!(event = "compact_shift", var = %var, offset);
            (shifted, offset)
        };
        self.context.adjusted.insert(var.clone(), entry.clone());
        entry
    }
}
