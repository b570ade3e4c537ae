//! Encoding session: propagation, encoding and decoding behind one
//! configured driver.
//!
//! # Examples
//!
//! ```
//! use cspforge_config::{AlgorithmConfig, EncoderConfig};
//! use cspforge_core::{CspBuilder, CspFactory};
//! use cspforge_encoder::EncodingSession;
//! use cspforge_test::DpllSolver;
//!
//! let mut factory = CspFactory::new();
//! let x = factory.int_var_range("x", 0, 9).unwrap();
//! let y = factory.int_var_range("y", 0, 9).unwrap();
//! let (tx, ty) = (factory.variable(&x), factory.variable(&y));
//! let sum = factory.add(tx, ty);
//! let twelve = factory.constant(12);
//! let formula = factory.eq(sum, twelve);
//!
//! let mut builder = CspBuilder::new();
//! builder.add_int_var(&x).add_int_var(&y);
//! builder.add_formula(&mut factory, &formula).unwrap();
//! let csp = builder.build();
//!
//! let config = EncoderConfig::new().with_algorithm(AlgorithmConfig::compact_order(3));
//! let mut session = EncodingSession::new(&config).unwrap();
//! let mut solver = DpllSolver::new();
//! session.encode(&mut factory, &csp, &mut solver).unwrap();
//!
//! let model = solver.solve().unwrap();
//! let assignment = session.decode(&model).unwrap();
//! let (vx, vy) = (assignment.int_value(&x).unwrap(), assignment.int_value(&y).unwrap());
//! assert_eq!(vx + vy, 12);
//! ```

use cspforge_config::{AlgorithmConfig, EncoderConfig};
use cspforge_core::{
    Csp, CspAssignment, CspError, CspFactory, FactoryOptions, IntegerClause, Model, Result,
    SatBackend,
};
use tracing::{debug, info};

use crate::compact::CompactOrderEncoder;
use crate::decode::decode_assignment;
use crate::emit::ClauseSink;
use crate::order::OrderEncoder;
use crate::propagate::{propagate, PropagationReport};
use crate::stats::EncodingStats;
use crate::traits::ClauseEncoder;

/// Factory options matching the limits of `config`.
pub fn factory_options(config: &EncoderConfig) -> FactoryOptions {
    FactoryOptions {
        max_set_size: config.limits.max_set_size,
        all_different_bounds: config.limits.all_different_bounds,
    }
}

/// Drives one problem through the encoder selected by an [`EncoderConfig`].
///
/// A session encodes a single `Csp` once. Further clauses, such as clauses
/// blocking a model already found, go through [`EncodingSession::add_clause`]
/// and reuse the encoder's variable tables.
pub struct EncodingSession {
    encoder: Box<dyn ClauseEncoder>,
    propagate: bool,
    stats: EncodingStats,
    report: Option<PropagationReport>,
    csp: Option<Csp>,
}

impl EncodingSession {
    /// Builds the encoder named by `config`.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` for a compact base below 2, `InvalidArgument`
    /// for any other invalid limit.
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        if let Some(base) = config.algorithm.base() {
            if base < 2 {
                return Err(CspError::UnsupportedAlgorithm(format!(
                    "compact_order with base {}",
                    base
                )));
            }
        }
        config
            .validate()
            .map_err(|e| CspError::InvalidArgument(e.to_string()))?;

        let split_threshold = config.limits.split_threshold;
        let encoder: Box<dyn ClauseEncoder> = match config.algorithm {
            AlgorithmConfig::Order => Box::new(OrderEncoder::new(split_threshold)),
            AlgorithmConfig::CompactOrder(compact) => {
                Box::new(CompactOrderEncoder::new(compact.base, split_threshold)?)
            }
        };
        debug!(event = "session_new", algorithm = encoder.name(), propagate = config.propagate);
        Ok(EncodingSession {
            encoder,
            propagate: config.propagate,
            stats: EncodingStats::default(),
            report: None,
            csp: None,
        })
    }

    pub fn algorithm(&self) -> &'static str {
        self.encoder.name()
    }

    /// Propagates `csp` if configured, then encodes every clause into
    /// `backend`.
    ///
    /// # Errors
    ///
    /// `InvalidState` if this session already encoded a problem,
    /// `AlreadyPropagated` if propagation is enabled and `csp` was already
    /// propagated, and any error of the encoder.
    pub fn encode(
        &mut self,
        factory: &mut CspFactory,
        csp: &Csp,
        backend: &mut dyn SatBackend,
    ) -> Result<()> {
        if self.csp.is_some() {
            return Err(CspError::InvalidState(
                "session has already encoded a problem".to_string(),
            ));
        }
        info!(
            event = "encode_start",
            algorithm = self.encoder.name(),
            int_vars = csp.int_vars.len(),
            bool_vars = csp.bool_vars.len(),
            clauses = csp.clauses.len(),
        );

        let encoded = if self.propagate {
            let (propagated, report) = propagate(factory, csp)?;
            self.report = Some(report);
            propagated
        } else {
            csp.clone()
        };

        let clauses: Vec<IntegerClause> = encoded.clauses.iter().cloned().collect();
        let mut sink = ClauseSink::new(backend, &mut self.stats);
        self.encoder.encode_clauses(factory, &clauses, &mut sink)?;
        self.csp = Some(encoded);

        info!(
            event = "encode_end",
            algorithm = self.encoder.name(),
            clauses = self.stats.clauses,
            literals = self.stats.literals,
            dropped = self.stats.dropped_clauses,
            aux_bool_vars = self.stats.aux_bool_vars,
            aux_int_vars = self.stats.aux_int_vars,
        );
        Ok(())
    }

    /// Encodes one more clause over the problem's variables.
    ///
    /// Variables replaced during propagation are substituted first.
    pub fn add_clause(
        &mut self,
        factory: &mut CspFactory,
        clause: &IntegerClause,
        backend: &mut dyn SatBackend,
    ) -> Result<()> {
        let csp = self.encoded()?;
        let clause = clause.substitute(&csp.substitution);
        let mut sink = ClauseSink::new(backend, &mut self.stats);
        self.encoder.encode_clauses(factory, &[clause], &mut sink)?;
        debug!(event = "session_clause", clauses = self.stats.clauses);
        Ok(())
    }

    /// Values of the original problem's visible variables under `model`.
    pub fn decode(&self, model: &Model) -> Result<CspAssignment> {
        let csp = self.encoded()?;
        Ok(decode_assignment(self.encoder.as_ref(), csp, model))
    }

    pub fn stats(&self) -> &EncodingStats {
        &self.stats
    }

    /// Outcome of propagation, `None` if it did not run.
    pub fn propagation(&self) -> Option<&PropagationReport> {
        self.report.as_ref()
    }

    /// The problem as encoded, after propagation.
    pub fn csp(&self) -> Option<&Csp> {
        self.csp.as_ref()
    }

    fn encoded(&self) -> Result<&Csp> {
        self.csp
            .as_ref()
            .ok_or_else(|| CspError::InvalidState("session has not encoded a problem".to_string()))
    }
}

impl std::fmt::Debug for EncodingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodingSession")
            .field("algorithm", &self.encoder.name())
            .field("propagate", &self.propagate)
            .field("stats", &self.stats)
            .field("encoded", &self.csp.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
