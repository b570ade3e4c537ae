//! Decomposition of comparison, all-different and pigeonhole predicates.

use std::sync::Arc;

use tracing::trace;

use super::Decomposition;
use crate::clause::IntegerClause;
use crate::error::Result;
use crate::formula::{CompareOp, Formula, Predicate, PredicateId};
use crate::literal::LinearLiteral;
use crate::term::{CspFactory, TermId, TermKind};

impl CspFactory {
    /// Memoized decomposition of one predicate.
    pub fn decompose_predicate(&mut self, id: PredicateId) -> Result<Arc<Decomposition>> {
        if let Some(d) = self.predicate_memo.get(&id) {
            return Ok(d.clone());
        }
        let d = match self.predicate(id)?.clone() {
            Predicate::Comparison { op, left, right } => {
                self.decompose_comparison(op, left, right)?
            }
            Predicate::AllDifferent(terms) => self.decompose_all_different(&terms)?,
            Predicate::Pigeonhole(terms) => self.decompose_pigeonhole(&terms)?,
        };
        let d = Arc::new(d);
        self.predicate_memo.insert(id, d.clone());
        Ok(d)
    }

    fn decompose_comparison(
        &mut self,
        op: CompareOp,
        left: TermId,
        right: TermId,
    ) -> Result<Decomposition> {
        if let TermKind::Abs(inner) = *self.kind(left) {
            return self.decompose_abs_comparison(op, inner, right);
        }
        if matches!(self.kind(right), TermKind::Abs(_)) {
            return self.decompose_comparison(op.flip(), right, left);
        }
        if let Some(formula) = self.product_sign_formula(op, left, right) {
            return self.decompose_normalized(&formula);
        }
        if self.as_constant(left) == Some(0) && matches!(self.kind(right), TermKind::Product(..)) {
            return self.decompose_comparison(op.flip(), right, left);
        }
        self.decompose_linear_comparison(op, left, right)
    }

    /// `|inner| op right`, split over the two signs of `inner`.
    fn decompose_abs_comparison(
        &mut self,
        op: CompareOp,
        inner: TermId,
        right: TermId,
    ) -> Result<Decomposition> {
        let negated = self.negate(inner);
        let zero = self.constant(0);
        let formula = match op {
            CompareOp::Le | CompareOp::Lt => {
                let pos = self.compare(op, inner, right);
                let neg = self.compare(op, negated, right);
                Formula::and([pos, neg])
            }
            CompareOp::Ge | CompareOp::Gt => {
                let pos = self.compare(op, inner, right);
                let neg = self.compare(op, negated, right);
                Formula::or([pos, neg])
            }
            CompareOp::Eq => {
                let pos = self.eq(inner, right);
                let neg = self.eq(negated, right);
                let non_negative = self.ge(right, zero);
                Formula::and([Formula::or([pos, neg]), non_negative])
            }
            CompareOp::Ne => {
                let pos = self.ne(inner, right);
                let neg = self.ne(negated, right);
                let negative = self.lt(right, zero);
                Formula::or([Formula::and([pos, neg]), negative])
            }
        };
        self.decompose_normalized(&formula)
    }

    /// Sign reasoning for `a * b op 0`.
    fn product_sign_formula(&mut self, op: CompareOp, left: TermId, right: TermId) -> Option<Formula> {
        let TermKind::Product(a, b) = *self.kind(left) else {
            return None;
        };
        if self.as_constant(right) != Some(0) {
            return None;
        }
        let zero = right;
        let formula = match op {
            CompareOp::Eq => {
                let (a0, b0) = (self.eq(a, zero), self.eq(b, zero));
                Formula::or([a0, b0])
            }
            CompareOp::Ne => {
                let (a0, b0) = (self.ne(a, zero), self.ne(b, zero));
                Formula::and([a0, b0])
            }
            CompareOp::Le | CompareOp::Gt => {
                let (a_le, b_le) = (self.le(a, zero), self.le(b, zero));
                let (a_ge, b_ge) = (self.ge(a, zero), self.ge(b, zero));
                let le = Formula::and([Formula::or([a_le, b_le]), Formula::or([a_ge, b_ge])]);
                if op == CompareOp::Le {
                    le
                } else {
                    Formula::not(le).to_nnf()
                }
            }
            CompareOp::Ge | CompareOp::Lt => {
                let (a_le, b_ge) = (self.le(a, zero), self.ge(b, zero));
                let (b_le, a_ge) = (self.le(b, zero), self.ge(a, zero));
                let ge = Formula::and([Formula::or([a_le, b_ge]), Formula::or([b_le, a_ge])]);
                if op == CompareOp::Ge {
                    ge
                } else {
                    Formula::not(ge).to_nnf()
                }
            }
        };
        Some(formula)
    }

    fn decompose_linear_comparison(
        &mut self,
        op: CompareOp,
        left: TermId,
        right: TermId,
    ) -> Result<Decomposition> {
        let l = self.decompose_term(left)?;
        let r = self.decompose_term(right)?;
        let diff = l.linear.sub(&r.linear);
        let literal = match op {
            CompareOp::Le => LinearLiteral::le(diff),
            CompareOp::Lt => LinearLiteral::le(diff.add_constant(1)),
            CompareOp::Ge => LinearLiteral::le(diff.negate()),
            CompareOp::Gt => LinearLiteral::le(diff.negate().add_constant(1)),
            CompareOp::Eq => LinearLiteral::eq(diff),
            CompareOp::Ne => LinearLiteral::ne(diff),
        };
        if literal.is_valid() {
            trace!(event = "literal_valid", literal = %literal);
            return Ok(Decomposition::valid());
        }
        if literal.is_unsat() {
            trace!(event = "literal_unsat", literal = %literal);
            return Ok(Decomposition::unsat());
        }
        Ok(l.side
            .clone()
            .and(&r.side)
            .and(&Decomposition::from_clause(IntegerClause::from_arith(literal))))
    }

    fn decompose_all_different(&mut self, terms: &[TermId]) -> Result<Decomposition> {
        if terms.len() < 2 {
            return Ok(Decomposition::valid());
        }
        let mut parts = Vec::new();
        for (i, &a) in terms.iter().enumerate() {
            for &b in &terms[i + 1..] {
                parts.push(self.ne(a, b));
            }
        }
        if self.options().all_different_bounds {
            let n = terms.len() as i64;
            let lb = terms.iter().map(|&t| self.domain_of(t).lb()).min().unwrap_or(0);
            let ub = terms.iter().map(|&t| self.domain_of(t).ub()).max().unwrap_or(0);
            let high = self.constant(lb + n - 1);
            let low = self.constant(ub - n + 1);
            let reaches_high: Vec<Formula> = terms.iter().map(|&t| self.ge(t, high)).collect();
            let reaches_low: Vec<Formula> = terms.iter().map(|&t| self.le(t, low)).collect();
            parts.push(Formula::Or(reaches_high));
            parts.push(Formula::Or(reaches_low));
        }
        self.decompose_normalized(&Formula::And(parts))
    }

    fn decompose_pigeonhole(&mut self, terms: &[TermId]) -> Result<Decomposition> {
        let mut parts = Vec::new();
        for (i, &a) in terms.iter().enumerate() {
            for &b in &terms[i + 1..] {
                parts.push(self.eq(a, b));
            }
        }
        self.decompose_normalized(&Formula::Or(parts))
    }
}
