//! Linearization of terms.

use std::sync::Arc;

use super::Decomposition;
use crate::clause::IntegerClause;
use crate::error::Result;
use crate::formula::Formula;
use crate::literal::{ArithmeticLiteral, ProductLiteral};
use crate::term::{CspFactory, LinearExpression, TermDecomposition, TermId, TermKind};
use crate::variable::IntVar;

impl CspFactory {
    /// Linear form of `term` plus the clauses defining any auxiliaries.
    ///
    /// Memoized per term, so repeated occurrences share their auxiliaries.
    pub fn decompose_term(&mut self, term: TermId) -> Result<Arc<TermDecomposition>> {
        if let Some(d) = self.term_memo.get(&term) {
            return Ok(d.clone());
        }
        let d = match self.kind(term).clone() {
            TermKind::Constant(c) => TermDecomposition::linear(LinearExpression::from_constant(c)),
            TermKind::Variable(v) => TermDecomposition::linear(LinearExpression::from_var(&v)),
            TermKind::Add(children) => {
                let mut acc = TermDecomposition::linear(LinearExpression::from_constant(0));
                for child in children {
                    let d = self.decompose_term(child)?;
                    acc.linear = acc.linear.add(&d.linear);
                    acc.side = acc.side.and(&d.side);
                }
                acc
            }
            TermKind::Sub(a, b) => {
                let da = self.decompose_term(a)?;
                let db = self.decompose_term(b)?;
                TermDecomposition {
                    linear: da.linear.sub(&db.linear),
                    side: da.side.clone().and(&db.side),
                }
            }
            TermKind::Mul(c, a) => self.scaled(a, c)?,
            TermKind::Neg(a) => self.scaled(a, -1)?,
            TermKind::Abs(a) => self.decompose_abs(a)?,
            TermKind::Min(a, b) => self.decompose_min_max(a, b, true)?,
            TermKind::Max(a, b) => self.decompose_min_max(a, b, false)?,
            TermKind::Div(a, c) => {
                let (q, _, side) = self.divmod(a, c)?;
                TermDecomposition {
                    linear: LinearExpression::from_var(&q),
                    side: side.as_ref().clone(),
                }
            }
            TermKind::Mod(a, c) => {
                let (_, r, side) = self.divmod(a, c)?;
                TermDecomposition {
                    linear: LinearExpression::from_var(&r),
                    side: side.as_ref().clone(),
                }
            }
            TermKind::Product(a, b) => self.decompose_product(a, b)?,
        };
        let d = Arc::new(d);
        self.term_memo.insert(term, d.clone());
        Ok(d)
    }

    fn scaled(&mut self, term: TermId, k: i64) -> Result<TermDecomposition> {
        let d = self.decompose_term(term)?;
        Ok(TermDecomposition {
            linear: d.linear.scale(k),
            side: d.side.clone(),
        })
    }

    fn decompose_abs(&mut self, a: TermId) -> Result<TermDecomposition> {
        let domain = self.domain_of(a).clone();
        if domain.lb() >= 0 {
            return self.scaled(a, 1);
        }
        if domain.ub() <= 0 {
            return self.scaled(a, -1);
        }
        let aux = self.aux_int_var(domain.abs());
        let v = self.variable(&aux);
        let neg = self.negate(a);
        let positive = self.eq(v, a);
        let negative = self.eq(v, neg);
        self.defined_by(aux, Formula::or([positive, negative]))
    }

    fn decompose_min_max(&mut self, a: TermId, b: TermId, is_min: bool) -> Result<TermDecomposition> {
        let da = self.domain_of(a).clone();
        let db = self.domain_of(b).clone();
        // One side always wins
        let (a_wins, b_wins) = if is_min {
            (da.ub() <= db.lb(), db.ub() <= da.lb())
        } else {
            (da.lb() >= db.ub(), db.lb() >= da.ub())
        };
        if a_wins {
            return self.scaled(a, 1);
        }
        if b_wins {
            return self.scaled(b, 1);
        }
        let cap = self.options().max_set_size;
        let domain = if is_min {
            da.min_domain_with_cap(&db, cap)
        } else {
            da.max_domain_with_cap(&db, cap)
        };
        let aux = self.aux_int_var(domain);
        let m = self.variable(&aux);
        let formula = if is_min {
            let bound_a = self.le(m, a);
            let bound_b = self.le(m, b);
            let reach_a = self.ge(m, a);
            let reach_b = self.ge(m, b);
            Formula::and([bound_a, bound_b, Formula::or([reach_a, reach_b])])
        } else {
            let bound_a = self.ge(m, a);
            let bound_b = self.ge(m, b);
            let reach_a = self.le(m, a);
            let reach_b = self.le(m, b);
            Formula::and([bound_a, bound_b, Formula::or([reach_a, reach_b])])
        };
        self.defined_by(aux, formula)
    }

    /// Quotient and remainder auxiliaries of `a` by `c`, shared by div and mod.
    pub(crate) fn divmod(&mut self, a: TermId, c: i64) -> Result<(IntVar, IntVar, Arc<Decomposition>)> {
        if let Some(entry) = self.divmod_memo.get(&(a, c)) {
            return Ok(entry.clone());
        }
        let domain = self.domain_of(a).clone();
        let q = self.aux_int_var(domain.div(c));
        let r = self.aux_int_var(domain.modulo(c));
        let qt = self.variable(&q);
        let rt = self.variable(&r);
        let scaled = self.mul(c, qt);
        let rhs = self.add(scaled, rt);
        let zero = self.constant(0);
        let modulus = self.constant(c.abs());
        let definition = self.eq(a, rhs);
        let lower = self.ge(rt, zero);
        let upper = self.lt(rt, modulus);
        let mut side = self.decompose_normalized(&Formula::and([definition, lower, upper]))?;
        side.int_vars.insert(q.clone());
        side.int_vars.insert(r.clone());
        let entry = (q, r, Arc::new(side));
        self.divmod_memo.insert((a, c), entry.clone());
        Ok(entry)
    }

    fn decompose_product(&mut self, a: TermId, b: TermId) -> Result<TermDecomposition> {
        let (x, side_x) = self.bind_to_var(a)?;
        let (y, side_y) = self.bind_to_var(b)?;
        let cap = self.options().max_set_size;
        let z = self.aux_int_var(x.domain().mul_domain_with_cap(y.domain(), cap));
        let clause = IntegerClause::from_arith(ArithmeticLiteral::Product(ProductLiteral::new(
            z.clone(),
            x,
            y,
        )));
        let mut side = side_x.and(&side_y).and(&Decomposition::from_clause(clause));
        side.int_vars.insert(z.clone());
        Ok(TermDecomposition {
            linear: LinearExpression::from_var(&z),
            side,
        })
    }

    /// A variable equal to `term`, introducing an auxiliary when needed.
    fn bind_to_var(&mut self, term: TermId) -> Result<(IntVar, Decomposition)> {
        if let TermKind::Variable(v) = self.kind(term) {
            return Ok((v.clone(), Decomposition::valid()));
        }
        let aux = self.aux_int_var(self.domain_of(term).clone());
        let v = self.variable(&aux);
        let equality = self.eq(v, term);
        let mut side = self.decompose_normalized(&equality)?;
        side.int_vars.insert(aux.clone());
        Ok((aux, side))
    }

    fn defined_by(&mut self, aux: IntVar, formula: Formula) -> Result<TermDecomposition> {
        let mut side = self.decompose_normalized(&formula)?;
        side.int_vars.insert(aux.clone());
        Ok(TermDecomposition {
            linear: LinearExpression::from_var(&aux),
            side,
        })
    }
}
