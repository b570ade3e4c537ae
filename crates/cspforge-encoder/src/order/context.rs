//! Threshold indicators of the order encoding.

use std::collections::BTreeMap;

use cspforge_core::domain::{ceil_div, floor_div};
use cspforge_core::{BoolVar, IntVar, Model};
use tracing::trace;

use crate::emit::{ClauseSink, Lit};

/// Indicator table of the order encoding.
///
/// For a variable with domain values `v_0 < v_1 < ... < v_{n-1}`, indicator
/// `i` stands for `x <= v_i`. The last value needs no indicator. Chains are
/// allocated the first time a literal mentions the variable.
#[derive(Debug, Clone, Default)]
pub struct OrderContext {
    indicators: BTreeMap<IntVar, Vec<BoolVar>>,
}

impl OrderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_encoded(&self, var: &IntVar) -> bool {
        self.indicators.contains_key(var)
    }

    /// Variables whose chain has been allocated.
    pub fn encoded_vars(&self) -> impl Iterator<Item = &IntVar> {
        self.indicators.keys()
    }

    /// Indicators of `var`, allocating the chain and its clauses on first use.
    pub fn indicators(&mut self, var: &IntVar, sink: &mut ClauseSink<'_>) -> &[BoolVar] {
        self.indicators
            .entry(var.clone())
            .or_insert_with(|| {
                let n = var.domain().size().saturating_sub(1) as usize;
                let chain: Vec<BoolVar> = (0..n).map(|_| sink.fresh_bool()).collect();
                // x <= v_i implies x <= v_{i+1}
                for pair in chain.windows(2) {
                    sink.emit([Lit::from(pair[0].negative()), Lit::from(pair[1].positive())]);
                }
                trace!(event = "order_chain", var = %var, indicators = n);
                chain
            })
            .as_slice()
    }

    /// The literal for `x <= c`.
    pub fn le(&mut self, x: &IntVar, c: i64, sink: &mut ClauseSink<'_>) -> Lit {
        let domain = x.domain();
        if domain.is_empty() || c < domain.lb() {
            return Lit::FALSE;
        }
        if c >= domain.ub() {
            return Lit::TRUE;
        }
        let index = (domain.count_below(c + 1) - 1) as usize;
        Lit::Bool(self.indicators(x, sink)[index].positive())
    }

    /// The literal for `a * x <= b`.
    pub fn le_ax(&mut self, a: i64, x: &IntVar, b: i64, sink: &mut ClauseSink<'_>) -> Lit {
        if a > 0 {
            self.le(x, floor_div(b, a), sink)
        } else if a < 0 {
            self.le(x, ceil_div(b, a) - 1, sink).negate()
        } else {
            Lit::Const(b >= 0)
        }
    }

    /// Smallest value whose indicator is true, or the domain maximum.
    pub fn decode(&self, x: &IntVar, model: &Model) -> i64 {
        let domain = x.domain();
        let Some(chain) = self.indicators.get(x) else {
            return domain.ub();
        };
        domain
            .values()
            .zip(chain)
            .find(|(_, p)| model.is_true(p) == Some(true))
            .map(|(v, _)| v)
            .unwrap_or_else(|| domain.ub())
    }
}
