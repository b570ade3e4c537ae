//! Digit-wise rewriting of canonical relations.
//!
//! Relations whose operands stay below the base go to the order encoder
//! as they are. The others are guarded by a fresh boolean `p` and rewritten
//! as `p -> relation` over digits: comparisons ripple from the most
//! significant digit down, sums carry through booleans, and products sum
//! shifted partial products of digit-by-digit multiplications.

use cspforge_core::domain::arith::{digit_count, to_digits};
use cspforge_core::{
    ArithmeticLiteral, BoolLit, BoolVar, CspError, CspFactory, EqMul, IntVar, IntegerClause,
    IntegerDomain, LinearExpression, LinearLiteral, OpAdd, OpXY, Operand, RelOp, Result,
};
use tracing::trace;

use super::{bools_only, CompactOrderEncoder};
use crate::emit::ClauseSink;

type Digits = Vec<Operand>;

impl CompactOrderEncoder {
    pub(super) fn to_ccsp(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        sink: &mut ClauseSink<'_>,
    ) -> Result<Vec<IntegerClause>> {
        let mut out = Vec::new();
        let mut rewritten = bools_only(clause);
        for literal in clause.arith_lits() {
            if let ArithmeticLiteral::Linear(_) = literal {
                rewritten.push_arith(literal.clone());
                continue;
            }
            if literal.upper_bound() < self.base {
                for v in literal.vars() {
                    self.digits(factory, &v, sink, &mut out)?;
                }
                rewritten.push_arith(literal.clone());
                continue;
            }
            let p = sink.fresh_bool();
            rewritten.push_bool(p.positive());
            let relation = self.relation(factory, literal, Some(p.negative()), sink, &mut out)?;
            out.extend(relation);
        }
        out.push(rewritten);
        Ok(out)
    }

    /// Clauses of `guard | relation` over digits. Definitions of the digit
    /// sums and products go to `defs` unguarded.
    fn relation(
        &mut self,
        factory: &mut CspFactory,
        literal: &ArithmeticLiteral,
        guard: Option<BoolLit>,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Result<Vec<IntegerClause>> {
        match literal {
            ArithmeticLiteral::OpXY(OpXY { op, x, y }) => {
                let xs = self.operand_digits(factory, x, sink, defs)?;
                let ys = self.operand_digits(factory, y, sink, defs)?;
                Ok(compare(*op, &xs, &ys, guard, sink))
            }
            ArithmeticLiteral::OpAdd(OpAdd { op, z, x, y }) => {
                let zs = self.operand_digits(factory, z, sink, defs)?;
                let xs = self.operand_digits(factory, x, sink, defs)?;
                let ys = self.operand_digits(factory, y, sink, defs)?;
                let sum = self.add_digits(factory, &xs, &ys, sink, defs);
                Ok(compare(*op, &zs, &sum, guard, sink))
            }
            ArithmeticLiteral::EqMul(EqMul { z, x, y }) => {
                let zs = self.var_digits(factory, z, sink, defs)?;
                let xs = self.var_digits(factory, x, sink, defs)?;
                let product = match y {
                    Operand::Const(c) if *c < 0 => {
                        return Err(CspError::InvalidState(format!(
                            "negative factor in digit product: {}",
                            literal
                        )))
                    }
                    Operand::Const(c) => {
                        let factors: Digits = to_digits(*c, self.base).into_iter().map(Operand::Const).collect();
                        self.mul_digits(factory, &xs, &factors, sink, defs)
                    }
                    Operand::Var(y) => {
                        let ys = self.var_digits(factory, y, sink, defs)?;
                        self.mul_digits(factory, &xs, &ys, sink, defs)
                    }
                };
                Ok(compare(RelOp::Eq, &zs, &product, guard, sink))
            }
            other => Err(CspError::InvalidState(format!(
                "literal is not a canonical relation: {}",
                other
            ))),
        }
    }

    /// Digits of `var`, created on first use.
    ///
    /// Variables below the base are their own single digit. Otherwise the
    /// top digit ranges over `[0, ub / B^(m-1)]`, and when the digits can
    /// spell a number above `ub` an unconditional comparison bounds them.
    pub(super) fn digits(
        &mut self,
        factory: &mut CspFactory,
        var: &IntVar,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Result<Vec<IntVar>> {
        if let Some(digits) = self.context.digits.get(var) {
            return Ok(digits.clone());
        }
        let domain = var.domain();
        if domain.lb() < 0 {
            return Err(CspError::InvalidState(format!(
                "digits of {} with negative lower bound {}",
                var,
                domain.lb()
            )));
        }
        let base = self.base;
        let ub = domain.ub();
        let digits = if ub < base {
            vec![var.clone()]
        } else {
            let m = digit_count(ub, base);
            let pow = base.checked_pow((m - 1) as u32).ok_or_else(|| {
                CspError::InvalidState(format!("{} has too many digits in base {}", var, base))
            })?;
            let top = ub / pow;
            let mut digits: Vec<IntVar> = (0..m - 1)
                .map(|_| sink.aux_int_var(factory, IntegerDomain::range(0, base - 1)))
                .collect();
            digits.push(sink.aux_int_var(factory, IntegerDomain::range(0, top)));
            if top * pow + (pow - 1) > ub {
                let xs: Digits = digits.iter().cloned().map(Operand::Var).collect();
                let bound: Digits = to_digits(ub, base).into_iter().map(Operand::Const).collect();
                defs.extend(le_digits(&xs, &bound, None, sink));
            }
            trace!(event = "compact_digits", var = %var, digits = m);
            digits
        };
        self.context.digits.insert(var.clone(), digits.clone());
        Ok(digits)
    }

    fn var_digits(
        &mut self,
        factory: &mut CspFactory,
        var: &IntVar,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Result<Digits> {
        Ok(self
            .digits(factory, var, sink, defs)?
            .into_iter()
            .map(Operand::Var)
            .collect())
    }

    fn operand_digits(
        &mut self,
        factory: &mut CspFactory,
        operand: &Operand,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Result<Digits> {
        match operand {
            Operand::Var(v) => self.var_digits(factory, v, sink, defs),
            Operand::Const(c) if *c < 0 => Err(CspError::InvalidState(format!(
                "negative constant operand {}",
                c
            ))),
            Operand::Const(c) => Ok(to_digits(*c, self.base).into_iter().map(Operand::Const).collect()),
        }
    }

    /// Digits of `x + y`, one longer than the longer operand.
    fn add_digits(
        &mut self,
        factory: &mut CspFactory,
        xs: &[Operand],
        ys: &[Operand],
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Digits {
        let base = self.base;
        let n = xs.len().max(ys.len());
        let mut sum = Vec::with_capacity(n + 1);
        let mut carry: Option<BoolVar> = None;
        for i in 0..n {
            let s = sink.aux_int_var(factory, IntegerDomain::range(0, base - 1));
            let c = sink.fresh_bool();
            // x_i + y_i + carry_in - s_i - B * carry_out = 0
            let e = digit(xs, i)
                .to_linear()
                .add(&digit(ys, i).to_linear())
                .sub(&LinearExpression::from_var(&s));
            let carry_in: Vec<(Option<BoolLit>, i64)> = match &carry {
                None => vec![(None, 0)],
                Some(cin) => vec![(Some(cin.positive()), 0), (Some(cin.negative()), 1)],
            };
            for (cin, cin_value) in carry_in {
                for (cout, cout_value) in [(c.positive(), 0), (c.negative(), 1)] {
                    let expr = e.add_constant(cin_value - base * cout_value);
                    defs.push(IntegerClause::from_parts(
                        cin.iter().cloned().chain([cout]),
                        [LinearLiteral::eq(expr).into()],
                    ));
                }
            }
            sum.push(Operand::Var(s));
            carry = Some(c);
        }
        if let Some(c) = carry {
            let top = sink.aux_int_var(factory, IntegerDomain::range(0, 1));
            let t = LinearExpression::from_var(&top);
            defs.push(IntegerClause::from_parts(
                [c.negative()],
                [LinearLiteral::le(t.negate().add_constant(1)).into()],
            ));
            defs.push(IntegerClause::from_parts(
                [c.positive()],
                [LinearLiteral::le(t).into()],
            ));
            sum.push(Operand::Var(top));
        }
        sum
    }

    /// Digits of `x * y`: the sum of `x * y_j` shifted by `j` places.
    fn mul_digits(
        &mut self,
        factory: &mut CspFactory,
        xs: &[Operand],
        ys: &[Operand],
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Digits {
        let mut total: Option<Digits> = None;
        for (j, y) in ys.iter().enumerate() {
            if matches!(y, Operand::Const(0)) {
                continue;
            }
            let mut row: Digits = vec![Operand::Const(0); j];
            row.extend(self.mul_digit(factory, xs, y, sink, defs));
            total = Some(match total {
                None => row,
                Some(acc) => self.add_digits(factory, &acc, &row, sink, defs),
            });
        }
        total.unwrap_or_else(|| vec![Operand::Const(0)])
    }

    /// Digits of `x * f` for a single digit `f`.
    fn mul_digit(
        &mut self,
        factory: &mut CspFactory,
        xs: &[Operand],
        f: &Operand,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Digits {
        match f {
            Operand::Const(0) => return vec![Operand::Const(0)],
            Operand::Const(1) => return xs.to_vec(),
            _ => {}
        }
        let base = self.base;
        let f_max = f.ub();
        let mut out = Vec::with_capacity(xs.len() + 1);
        let mut carry: Option<IntVar> = None;
        for x in xs {
            let term = match (x, f) {
                (Operand::Const(a), Operand::Const(c)) => LinearExpression::from_constant(a * c),
                (Operand::Var(v), Operand::Const(c)) => LinearExpression::from_term(v, *c),
                (Operand::Const(a), Operand::Var(y)) => LinearExpression::from_term(y, *a),
                (Operand::Var(v), Operand::Var(y)) => {
                    let p = sink.aux_int_var(
                        factory,
                        IntegerDomain::range(0, v.domain().ub() * y.domain().ub()),
                    );
                    defs.push(IntegerClause::from_arith(ArithmeticLiteral::EqMul(EqMul {
                        z: p.clone(),
                        x: v.clone(),
                        y: Operand::Var(y.clone()),
                    })));
                    LinearExpression::from_var(&p)
                }
            };
            // term + k_in - t - B * k_out = 0
            let t = sink.aux_int_var(factory, IntegerDomain::range(0, base - 1));
            let k = sink.aux_int_var(factory, IntegerDomain::range(0, f_max));
            let mut e = term
                .sub(&LinearExpression::from_var(&t))
                .sub(&LinearExpression::from_term(&k, base));
            if let Some(k_in) = &carry {
                e = e.add(&LinearExpression::from_var(k_in));
            }
            defs.push(IntegerClause::from_arith(LinearLiteral::eq(e)));
            out.push(Operand::Var(t));
            carry = Some(k);
        }
        if let Some(k) = carry {
            out.push(Operand::Var(k));
        }
        out
    }
}

fn digit(digits: &[Operand], i: usize) -> Operand {
    digits.get(i).cloned().unwrap_or(Operand::Const(0))
}

fn difference(xs: &[Operand], ys: &[Operand], i: usize) -> LinearExpression {
    digit(xs, i).to_linear().sub(&digit(ys, i).to_linear())
}

fn clause(bools: impl IntoIterator<Item = BoolLit>, literals: Vec<LinearLiteral>) -> IntegerClause {
    IntegerClause::from_parts(bools, literals.into_iter().map(ArithmeticLiteral::from))
}

/// `guard | x op y` over digit sequences.
fn compare(
    op: RelOp,
    xs: &[Operand],
    ys: &[Operand],
    guard: Option<BoolLit>,
    sink: &mut ClauseSink<'_>,
) -> Vec<IntegerClause> {
    let n = xs.len().max(ys.len());
    match op {
        RelOp::Le => le_digits(xs, ys, guard, sink),
        RelOp::Ge => le_digits(ys, xs, guard, sink),
        RelOp::Eq => (0..n)
            .map(|i| clause(guard.clone(), vec![LinearLiteral::eq(difference(xs, ys, i))]))
            .collect(),
        RelOp::Ne => vec![clause(
            guard,
            (0..n).map(|i| LinearLiteral::ne(difference(xs, ys, i))).collect(),
        )],
    }
}

/// `guard | x <= y` over digit sequences.
///
/// `r_k` stands for "digits `0..=k` of x spell at most those of y";
/// `r_{n-1}` is the guard's complement, the others are fresh booleans.
fn le_digits(
    xs: &[Operand],
    ys: &[Operand],
    guard: Option<BoolLit>,
    sink: &mut ClauseSink<'_>,
) -> Vec<IntegerClause> {
    let n = xs.len().max(ys.len());
    // negated r_k, as it appears in clauses
    let mut not_r: Vec<Option<BoolLit>> = (0..n.saturating_sub(1))
        .map(|_| Some(sink.fresh_bool().negative()))
        .collect();
    not_r.push(guard);
    let mut out = Vec::with_capacity(2 * n);
    for k in 0..n {
        let d = difference(xs, ys, k);
        out.push(clause(not_r[k].clone(), vec![LinearLiteral::le(d.clone())]));
        if k > 0 {
            // r_k -> x_k < y_k or r_{k-1}
            let lower = not_r[k - 1].as_ref().map(BoolLit::negate);
            out.push(clause(
                not_r[k].iter().cloned().chain(lower),
                vec![LinearLiteral::le(d.add_constant(1))],
            ));
        }
    }
    out
}
