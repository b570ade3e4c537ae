//! Order encoding.
//!
//! Every integer variable becomes a monotone chain of `x <= c` indicators
//! (see [`OrderContext`]). A clause is first reduced to `<=` literals with
//! at most one literal spanning several variables; that literal is then
//! encoded by case splitting on its variables, the rest map to single
//! indicators.
//!
//! # Examples
//!
//! ```
//! use cspforge_core::{BoolLit, BoolVar, CspFactory, IntegerClause, LinearExpression, LinearLiteral, SatBackend};
//! use cspforge_encoder::emit::ClauseSink;
//! use cspforge_encoder::order::OrderEncoder;
//! use cspforge_encoder::stats::EncodingStats;
//! use cspforge_encoder::ClauseEncoder;
//!
//! #[derive(Default)]
//! struct Collect(usize, Vec<Vec<BoolLit>>);
//!
//! impl SatBackend for Collect {
//!     fn new_aux_var(&mut self) -> BoolVar {
//!         self.0 += 1;
//!         BoolVar::new(format!("@S{}", self.0))
//!     }
//!     fn add_clause(&mut self, literals: Vec<BoolLit>) {
//!         self.1.push(literals);
//!     }
//! }
//!
//! let mut factory = CspFactory::new();
//! let x = factory.int_var_range("x", 0, 3).unwrap();
//! // x <= 1
//! let clause = IntegerClause::from_arith(LinearLiteral::le(
//!     LinearExpression::from_var(&x).add_constant(-1),
//! ));
//!
//! let mut backend = Collect::default();
//! let mut stats = EncodingStats::default();
//! let mut sink = ClauseSink::new(&mut backend, &mut stats);
//! let mut encoder = OrderEncoder::new(1024);
//! encoder.encode_clauses(&mut factory, &[clause], &mut sink).unwrap();
//!
//! // three indicators, two chain clauses, one unit clause
//! assert_eq!(backend.0, 3);
//! assert_eq!(backend.1.len(), 3);
//! ```

mod context;
mod reduce;

#[cfg(test)]
mod tests;

use cspforge_core::domain::{ceil_div, floor_div};
use cspforge_core::{CspError, CspFactory, IntVar, IntegerClause, LinearLiteral, Model, Result};
use tracing::debug;

pub use context::OrderContext;
pub(crate) use reduce::LeClause;

use crate::emit::{ClauseSink, Lit, LitBuf};
use crate::traits::ClauseEncoder;

/// Order encoder state: the indicator table and the split threshold.
#[derive(Debug, Clone)]
pub struct OrderEncoder {
    context: OrderContext,
    split_threshold: u64,
}

impl OrderEncoder {
    /// Creates an encoder that splits linear literals whose case split
    /// would enumerate more than `split_threshold` combinations.
    pub fn new(split_threshold: u64) -> Self {
        OrderEncoder {
            context: OrderContext::new(),
            split_threshold,
        }
    }

    pub fn context(&self) -> &OrderContext {
        &self.context
    }

    pub fn split_threshold(&self) -> u64 {
        self.split_threshold
    }

    /// Encodes one integer clause.
    pub fn encode_clause(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        sink: &mut ClauseSink<'_>,
    ) -> Result<()> {
        for reduced in self.reduce(factory, clause, sink)? {
            self.emit_reduced(&reduced, sink)?;
        }
        Ok(())
    }

    /// The single propositional literal of a simple literal.
    ///
    /// # Errors
    ///
    /// Returns [`CspError::NonSimpleLiteral`] for anything but a `<=`
    /// literal over at most one variable.
    pub fn simple_lit(&mut self, literal: &LinearLiteral, sink: &mut ClauseSink<'_>) -> Result<Lit> {
        if !literal.is_simple() {
            return Err(CspError::NonSimpleLiteral(literal.to_string()));
        }
        let expr = literal.expr();
        Ok(match expr.coefs().iter().next() {
            None => Lit::Const(expr.constant() <= 0),
            Some((x, &a)) => self.context.le_ax(a, x, -expr.constant(), sink),
        })
    }

    pub fn decode(&self, var: &IntVar, model: &Model) -> i64 {
        self.context.decode(var, model)
    }

    fn emit_reduced(&mut self, clause: &LeClause, sink: &mut ClauseSink<'_>) -> Result<()> {
        let mut base: LitBuf = clause.bools.iter().cloned().map(Lit::from).collect();
        let mut complex: Option<&LinearLiteral> = None;
        for literal in &clause.les {
            if literal.is_simple() {
                let lit = self.simple_lit(literal, sink)?;
                if lit.is_true() {
                    return Ok(());
                }
                base.push(lit);
            } else if complex.is_none() {
                complex = Some(literal);
            } else {
                return Err(CspError::NonSimpleLiteral(literal.to_string()));
            }
        }
        match complex {
            None => sink.emit(base),
            Some(literal) => {
                let mut terms: Vec<(IntVar, i64)> = literal
                    .expr()
                    .coefs()
                    .iter()
                    .map(|(v, a)| (v.clone(), *a))
                    .collect();
                terms.sort_by_key(term_order);
                self.encode_le(&terms, -literal.expr().constant(), &mut base, sink);
            }
        }
        Ok(())
    }

    /// Emits clauses for `clause0 | sum(a_i * x_i) <= c`.
    fn encode_le(
        &mut self,
        terms: &[(IntVar, i64)],
        c: i64,
        clause0: &mut LitBuf,
        sink: &mut ClauseSink<'_>,
    ) {
        match terms {
            [] => {
                if c < 0 {
                    sink.emit(clause0.iter().cloned());
                }
            }
            [(x, a)] => {
                let lit = self.context.le_ax(*a, x, c, sink);
                self.emit_with(clause0, lit, sink);
            }
            [(x, a), rest @ ..] => {
                let rest_lb: i64 = rest.iter().map(|(v, b)| lb_ax(*b, v)).sum();
                let domain = x.domain();
                if *a > 0 {
                    let ub0 = floor_div(c - rest_lb, *a);
                    let values: Vec<i64> = domain.values_between(domain.lb(), ub0).collect();
                    for b in values {
                        // x >= b implies rest <= c - a*b
                        let lit = self.context.le(x, b - 1, sink);
                        if lit.is_true() {
                            continue;
                        }
                        clause0.push(lit);
                        self.encode_le(rest, c - a * b, clause0, sink);
                        clause0.pop();
                    }
                    if domain.ub() > ub0 {
                        let lit = self.context.le(x, ub0, sink);
                        self.emit_with(clause0, lit, sink);
                    }
                } else {
                    let lb0 = ceil_div(c - rest_lb, *a);
                    let values: Vec<i64> = domain.values_between(lb0, domain.ub()).collect();
                    for b in values {
                        // x <= b implies rest <= c - a*b
                        let lit = self.context.le(x, b, sink).negate();
                        if lit.is_true() {
                            continue;
                        }
                        clause0.push(lit);
                        self.encode_le(rest, c - a * b, clause0, sink);
                        clause0.pop();
                    }
                    if domain.lb() < lb0 {
                        let lit = self.context.le(x, lb0 - 1, sink).negate();
                        self.emit_with(clause0, lit, sink);
                    }
                }
            }
        }
    }

    fn emit_with(&mut self, clause0: &mut LitBuf, lit: Lit, sink: &mut ClauseSink<'_>) {
        clause0.push(lit);
        sink.emit(clause0.iter().cloned());
        clause0.pop();
    }
}

impl ClauseEncoder for OrderEncoder {
    fn name(&self) -> &'static str {
        "order"
    }

    fn encode_clauses(
        &mut self,
        factory: &mut CspFactory,
        clauses: &[IntegerClause],
        sink: &mut ClauseSink<'_>,
    ) -> Result<()> {
        for clause in clauses {
            self.encode_clause(factory, clause, sink)?;
        }
        debug!(
            event = "order_encoded",
            clauses = clauses.len(),
            encoded_vars = self.context.encoded_vars().count(),
        );
        Ok(())
    }

    fn decode_int(&self, var: &IntVar, model: &Model) -> i64 {
        self.decode(var, model)
    }
}

/// Case split order: smaller domains first, then smaller coefficients.
pub(crate) fn term_order((var, coef): &(IntVar, i64)) -> (u64, u64, u32) {
    (var.domain().size(), coef.unsigned_abs(), var.id())
}

fn lb_ax(a: i64, x: &IntVar) -> i64 {
    if a > 0 {
        a * x.domain().lb()
    } else {
        a * x.domain().ub()
    }
}
