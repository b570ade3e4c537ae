//! The seam between the session and the two clause encoders.

use cspforge_core::{CspFactory, IntVar, IntegerClause, Model, Result};

use crate::emit::ClauseSink;

/// Compiles integer clauses to propositional clauses and reads integer
/// values back from a model.
///
/// Encoders keep per-variable state across calls, so clauses can be added
/// after a model has been found.
pub trait ClauseEncoder {
    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Encodes every clause of `clauses` into `sink`.
    ///
    /// Auxiliary integer variables are allocated from `factory`.
    fn encode_clauses(
        &mut self,
        factory: &mut CspFactory,
        clauses: &[IntegerClause],
        sink: &mut ClauseSink<'_>,
    ) -> Result<()>;

    /// Value of `var` under `model`. Variables the encoder never saw decode
    /// to their domain maximum.
    fn decode_int(&self, var: &IntVar, model: &Model) -> i64;
}
