//! CspForge - Compile finite-domain integer constraints to SAT clauses
//!
//! Declare variables and build formulas with a `CspFactory`, collect them in
//! a `Csp`, then hand the problem to an `EncodingSession` together with any
//! `SatBackend`. Models found by the SAT engine decode back into integer
//! assignments.
//!
//! # Example
//!
//! ```rust
//! use cspforge::prelude::*;
//!
//! let mut factory = CspFactory::new();
//! let x = factory.int_var_range("x", 0, 3).unwrap();
//! let tx = factory.variable(&x);
//! let two = factory.constant(2);
//! let formula = factory.eq(tx, two);
//!
//! let mut builder = CspBuilder::new();
//! builder.add_int_var(&x);
//! builder.add_formula(&mut factory, &formula).unwrap();
//! let csp = builder.build();
//!
//! # #[derive(Default)]
//! # struct Unit(usize, Vec<Vec<BoolLit>>);
//! # impl SatBackend for Unit {
//! #     fn new_aux_var(&mut self) -> BoolVar { self.0 += 1; BoolVar::new(format!("@S{}", self.0)) }
//! #     fn add_clause(&mut self, literals: Vec<BoolLit>) { self.1.push(literals) }
//! # }
//! let mut backend = Unit::default();
//! let session = cspforge::encode(&EncoderConfig::default(), &mut factory, &csp, &mut backend).unwrap();
//! assert_eq!(session.algorithm(), "order");
//! ```

pub mod logging;

pub use cspforge_config::{AlgorithmConfig, CompactOrderConfig, ConfigError, EncoderConfig, LimitsConfig};
pub use cspforge_core::{
    BoolLit, BoolVar, CompareOp, Csp, CspAssignment, CspBuilder, CspError, CspFactory,
    FactoryOptions, Formula, IntVar, IntegerClause, IntegerDomain, LinearExpression,
    LinearLiteral, Model, Result, SatBackend, TermId,
};
pub use cspforge_encoder::{
    decode_assignment, factory_options, propagate, ClauseEncoder, CompactOrderEncoder,
    EncodingSession, EncodingStats, OrderEncoder, PropagationReport,
};

/// Encodes `csp` into `backend` with a fresh session configured by `config`.
///
/// The returned session decodes models and accepts further clauses.
pub fn encode(
    config: &EncoderConfig,
    factory: &mut CspFactory,
    csp: &Csp,
    backend: &mut dyn SatBackend,
) -> Result<EncodingSession> {
    let mut session = EncodingSession::new(config)?;
    session.encode(factory, csp, backend)?;
    Ok(session)
}

pub mod prelude {
    pub use super::{
        AlgorithmConfig, BoolLit, BoolVar, Csp, CspAssignment, CspBuilder, CspError, CspFactory,
        EncoderConfig, EncodingSession, Formula, IntVar, IntegerClause, IntegerDomain, Model,
        SatBackend,
    };
}
