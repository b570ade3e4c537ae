//! Rewrites literals into canonical relations over unit-coefficient operands.

use cspforge_core::{
    ArithmeticLiteral, CspError, CspFactory, EqMul, IntVar, IntegerClause, IntegerDomain,
    LinearLiteral, LinearOp, OpAdd, OpXY, Operand, RelOp, Result,
};

use super::{bools_only, CompactOrderEncoder};
use crate::emit::ClauseSink;

impl CompactOrderEncoder {
    pub(super) fn to_rcsp(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        sink: &mut ClauseSink<'_>,
    ) -> Result<Vec<IntegerClause>> {
        let mut out = Vec::new();
        let mut rewritten = bools_only(clause);
        for literal in clause.arith_lits() {
            let relation = match literal {
                ArithmeticLiteral::Linear(l) => self.linear_relation(factory, l, sink, &mut out)?,
                ArithmeticLiteral::Product(p) => ArithmeticLiteral::EqMul(EqMul {
                    z: p.z.clone(),
                    x: p.x.clone(),
                    y: Operand::Var(p.y.clone()),
                }),
                other => other.clone(),
            };
            rewritten.push_arith(relation);
        }
        out.push(rewritten);
        Ok(out)
    }

    /// `sum(lhs) op sum(rhs)` with positive terms on the left, negated
    /// negative terms on the right and at most three operands in total.
    fn linear_relation(
        &mut self,
        factory: &mut CspFactory,
        literal: &LinearLiteral,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> Result<ArithmeticLiteral> {
        let expr = literal.expr();
        if expr.is_constant() {
            return Ok(literal.clone().into());
        }
        if expr.len() > 3 {
            return Err(CspError::InvalidState(format!(
                "linear literal with more than three terms after splitting: {}",
                literal
            )));
        }
        let op = match literal.op() {
            LinearOp::Le => RelOp::Le,
            LinearOp::Eq => RelOp::Eq,
            LinearOp::Ne => RelOp::Ne,
        };
        let mut lhs: Vec<Operand> = Vec::new();
        let mut rhs: Vec<Operand> = Vec::new();
        for (v, &a) in expr.coefs() {
            let operand = Operand::Var(self.weighted(factory, v, a.abs(), sink, defs));
            if a > 0 {
                lhs.push(operand);
            } else {
                rhs.push(operand);
            }
        }
        let k = expr.constant();
        if k > 0 {
            lhs.push(Operand::Const(k));
        } else if k < 0 {
            rhs.push(Operand::Const(-k));
        }
        if lhs.is_empty() {
            lhs.push(Operand::Const(0));
        }
        if rhs.is_empty() {
            rhs.push(Operand::Const(0));
        }

        while lhs.len() + rhs.len() > 3 {
            let side = if lhs.len() >= rhs.len() { &mut lhs } else { &mut rhs };
            let (Some(y), Some(x)) = (side.pop(), side.pop()) else {
                return Err(CspError::InvalidState(format!(
                    "cannot collapse operands of {}",
                    literal
                )));
            };
            let s = sum_var(factory, x, y, sink, defs);
            side.push(Operand::Var(s));
        }

        let relation = match (lhs.as_slice(), rhs.as_slice()) {
            ([x], [y]) => ArithmeticLiteral::OpXY(OpXY {
                op,
                x: x.clone(),
                y: y.clone(),
            }),
            ([z], [x, y]) => ArithmeticLiteral::OpAdd(OpAdd {
                op,
                z: z.clone(),
                x: x.clone(),
                y: y.clone(),
            }),
            ([x, y], [z]) => ArithmeticLiteral::OpAdd(OpAdd {
                op: op.flip(),
                z: z.clone(),
                x: x.clone(),
                y: y.clone(),
            }),
            _ => {
                return Err(CspError::InvalidState(format!(
                    "no canonical relation for {}",
                    literal
                )))
            }
        };
        Ok(relation)
    }

    /// The variable defined as `c * var`, shared across clauses.
    fn weighted(
        &mut self,
        factory: &mut CspFactory,
        var: &IntVar,
        c: i64,
        sink: &mut ClauseSink<'_>,
        defs: &mut Vec<IntegerClause>,
    ) -> IntVar {
        if c == 1 {
            return var.clone();
        }
        if let Some(w) = self.context.weighted.get(&(var.clone(), c)) {
            return w.clone();
        }
        let w = sink.aux_int_var(factory, IntegerDomain::range(0, c * var.domain().ub()));
        defs.push(IntegerClause::from_arith(ArithmeticLiteral::EqMul(EqMul {
            z: w.clone(),
            x: var.clone(),
            y: Operand::Const(c),
        })));
        self.context.weighted.insert((var.clone(), c), w.clone());
        w
    }
}

/// A fresh `s` with `s = x + y`.
fn sum_var(
    factory: &mut CspFactory,
    x: Operand,
    y: Operand,
    sink: &mut ClauseSink<'_>,
    defs: &mut Vec<IntegerClause>,
) -> IntVar {
    let s = sink.aux_int_var(factory, IntegerDomain::range(0, x.ub() + y.ub()));
    defs.push(IntegerClause::from_arith(ArithmeticLiteral::OpAdd(OpAdd {
        op: RelOp::Eq,
        z: Operand::Var(s.clone()),
        x,
        y,
    })));
    s
}
