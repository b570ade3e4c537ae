//! CspForge Encoder - From clausal integer problems to SAT clauses
//!
//! This crate provides the back half of the CspForge pipeline:
//! - Bound propagation over single-variable-set clauses
//! - The order encoding
//! - The compact order encoding in a configurable base
//! - Decoding SAT models back to integer assignments
//! - `EncodingSession`, which drives the above from an `EncoderConfig`

pub mod compact;
pub mod decode;
pub mod emit;
pub mod order;
pub mod propagate;
pub mod session;
pub mod stats;
pub mod traits;

#[cfg(test)]
mod testing;

pub use compact::{CompactContext, CompactOrderEncoder};
pub use decode::decode_assignment;
pub use emit::{ClauseSink, Lit};
pub use order::{OrderContext, OrderEncoder};
pub use propagate::{propagate, PropagationReport};
pub use session::{factory_options, EncodingSession};
pub use stats::EncodingStats;
pub use traits::ClauseEncoder;
