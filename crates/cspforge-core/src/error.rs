//! Error types for CspForge

use thiserror::Error;

/// Main error type for CspForge operations.
///
/// Every variant is fatal for the operation that produced it. Unsatisfiable
/// problems are not errors: they surface as the empty clause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CspError {
    /// A Csp that already carries a propagation substitution was propagated again.
    #[error("Csp has already been propagated")]
    AlreadyPropagated,

    /// A formula node that the decomposer cannot handle at this point.
    #[error("Unsupported formula: {0}")]
    UnsupportedFormula(String),

    /// A predicate handle that was not created by this factory.
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// The requested encoding algorithm is unknown or misconfigured.
    #[error("Unsupported encoding algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A variable was declared with an empty domain.
    #[error("Variable {0} has an empty domain")]
    EmptyDomain(String),

    /// A variable name was registered twice in one factory.
    #[error("Variable {0} is already defined")]
    DuplicateVariable(String),

    /// A literal that needs case-splitting reached direct clause emission.
    #[error("Non-simple literal reached clause emission: {0}")]
    NonSimpleLiteral(String),

    /// An argument outside the supported range (zero divisor, reserved name, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for CspForge operations
pub type Result<T> = std::result::Result<T, CspError>;
