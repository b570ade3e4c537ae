//! Encoding statistics.
//!
//! Counters updated by the clause sink while encoders run.

/// Aggregate counts for one encoding session.
///
/// # Example
///
/// ```
/// use cspforge_encoder::stats::EncodingStats;
///
/// let mut stats = EncodingStats::default();
/// stats.record_clause(3);
/// stats.record_clause(1);
/// stats.record_dropped();
/// stats.record_aux_bool();
///
/// assert_eq!(stats.clauses, 2);
/// assert_eq!(stats.literals, 4);
/// assert_eq!(stats.dropped_clauses, 1);
/// assert_eq!(stats.aux_bool_vars, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingStats {
    /// Clauses handed to the SAT backend.
    pub clauses: u64,
    /// Literals across those clauses.
    pub literals: u64,
    /// Clauses discarded because a literal was already true.
    pub dropped_clauses: u64,
    /// Fresh propositional variables requested from the backend.
    pub aux_bool_vars: u64,
    /// Auxiliary integer variables created while encoding.
    pub aux_int_vars: u64,
}

impl EncodingStats {
    /// Records a clause of `len` literals.
    pub fn record_clause(&mut self, len: usize) {
        self.clauses += 1;
        self.literals += len as u64;
    }

    /// Records a clause that never reached the backend.
    pub fn record_dropped(&mut self) {
        self.dropped_clauses += 1;
    }

    pub fn record_aux_bool(&mut self) {
        self.aux_bool_vars += 1;
    }

    pub fn record_aux_int(&mut self) {
        self.aux_int_vars += 1;
    }
}
