//! Compact order encoding.
//!
//! Integer variables are written in base `B` as least-significant-first
//! digits, each digit order encoded on its own. A clause passes four
//! stages before it reaches the inner [`OrderEncoder`]:
//!
//! 1. adjust: every variable is shifted to start at 0, gaps become clauses
//! 2. ternary: linear literals are cut down to at most three terms
//! 3. rcsp: literals become `x op y`, `z op x + y` or `z = x * y` over
//!    unit-coefficient operands
//! 4. ccsp: relations whose operands reach `B` are rewritten digit by digit
//!    with carries, behind a fresh boolean
//!
//! Each stage returns the definitions of the auxiliaries it introduced
//! ahead of the rewritten clause; definitions run through the later stages
//! too.

mod adjust;
mod ccsp;
mod rcsp;
mod ternary;


use std::collections::BTreeMap;

use cspforge_core::{CspError, CspFactory, IntVar, IntegerClause, Model, Result};
use tracing::{debug, trace};

use crate::emit::ClauseSink;
use crate::order::OrderEncoder;
use crate::traits::ClauseEncoder;

/// Per-variable tables of the compact encoding.
#[derive(Debug, Clone, Default)]
pub struct CompactContext {
    /// Original variable to its zero-based stand-in and offset.
    adjusted: BTreeMap<IntVar, (IntVar, i64)>,
    /// Zero-based variable to its digits, least significant first.
    digits: BTreeMap<IntVar, Vec<IntVar>>,
    /// `(x, c)` to the variable defined as `c * x`.
    weighted: BTreeMap<(IntVar, i64), IntVar>,
}

impl CompactContext {
    /// The zero-based variable standing for `var` and its offset.
    pub fn adjusted(&self, var: &IntVar) -> Option<(&IntVar, i64)> {
        self.adjusted.get(var).map(|(v, offset)| (v, *offset))
    }

    pub fn digits(&self, var: &IntVar) -> Option<&[IntVar]> {
        self.digits.get(var).map(Vec::as_slice)
    }

    pub fn adjusted_count(&self) -> usize {
        self.adjusted.len()
    }
}

/// Compact order encoder over a fixed base.
#[derive(Debug, Clone)]
pub struct CompactOrderEncoder {
    base: i64,
    inner: OrderEncoder,
    context: CompactContext,
}

impl CompactOrderEncoder {
    /// Creates an encoder for `base`; digit-level literals are handed to an
    /// order encoder with `split_threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`CspError::UnsupportedAlgorithm`] if `base < 2`.
    pub fn new(base: i64, split_threshold: u64) -> Result<Self> {
        if base < 2 {
            return Err(CspError::UnsupportedAlgorithm(format!(
                "compact order encoding needs a base of at least 2, got {}",
                base
            )));
        }
        Ok(CompactOrderEncoder {
            base,
            inner: OrderEncoder::new(split_threshold),
            context: CompactContext::default(),
        })
    }

    pub fn base(&self) -> i64 {
        self.base
    }

    pub fn context(&self) -> &CompactContext {
        &self.context
    }

    pub fn inner(&self) -> &OrderEncoder {
        &self.inner
    }

    /// Encodes one integer clause.
    pub fn encode_clause(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        sink: &mut ClauseSink<'_>,
    ) -> Result<()> {
        let Some(clause) = clause.simplified() else {
            return Ok(());
        };
        let adjusted = self.adjust(factory, &clause, sink)?;
        let mut ternary = Vec::with_capacity(adjusted.len());
        for c in &adjusted {
            ternary.extend(self.ternary(factory, c, sink));
        }
        let mut rcsp = Vec::with_capacity(ternary.len());
        for c in &ternary {
            rcsp.extend(self.to_rcsp(factory, c, sink)?);
        }
        let mut ccsp = Vec::with_capacity(rcsp.len());
        for c in &rcsp {
            ccsp.extend(self.to_ccsp(factory, c, sink)?);
        }
        trace!(
            event = "compact_clause",
            adjusted = adjusted.len(),
            ternary = ternary.len(),
            rcsp = rcsp.len(),
            ccsp = ccsp.len(),
        );
        for c in &ccsp {
            self.inner.encode_clause(factory, c, sink)?;
        }
        Ok(())
    }

    /// `offset + sum(d_i * B^i)` over the decoded digits of `var`.
    pub fn decode(&self, var: &IntVar, model: &Model) -> i64 {
        let Some((shifted, offset)) = self.context.adjusted.get(var) else {
            return var.domain().ub();
        };
        let Some(digits) = self.context.digits.get(shifted) else {
            return offset + shifted.domain().ub();
        };
        let value = digits
            .iter()
            .rev()
            .fold(0i64, |acc, d| acc * self.base + self.inner.decode(d, model));
        offset + value
    }
}

impl ClauseEncoder for CompactOrderEncoder {
    fn name(&self) -> &'static str {
        "compact_order"
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
            event = "compact_encoded",
            clauses = clauses.len(),
            base = self.base,
            adjusted_vars = self.context.adjusted.len(),
            digit_vars = self.context.digits.len(),
        );
        Ok(())
    }

    fn decode_int(&self, var: &IntVar, model: &Model) -> i64 {
        self.decode(var, model)
    }
}

/// A clause of `bools` and nothing else, to collect rewritten literals into.
fn bools_only(clause: &IntegerClause) -> IntegerClause {
    IntegerClause::from_parts(clause.bool_lits().iter().cloned(), [])
}
