//! Hash-consed arithmetic terms.
//!
//! Terms live in an arena owned by [`CspFactory`] and are referred to by
//! [`TermId`] handles. Requesting a structure that already exists returns
//! the existing handle, so structural equality is handle equality.
//!
//! # Examples
//!
//! ```
//! use cspforge_core::{CspFactory, IntegerDomain};
//!
//! let mut factory = CspFactory::new();
//! let a = factory.int_var("a", IntegerDomain::range(0, 3)).unwrap();
//! let b = factory.int_var("b", IntegerDomain::range(0, 3)).unwrap();
//! let (a, b) = (factory.variable(&a), factory.variable(&b));
//!
//! assert_eq!(factory.add(a, b), factory.add(b, a));
//! let twice = factory.add(a, a);
//! assert_eq!(twice, factory.mul(2, a));
//! ```

mod factory;
mod linear;

#[cfg(test)]
mod tests;

pub use factory::{CspFactory, FactoryOptions, TermDisplay};
pub use linear::LinearExpression;

use crate::decompose::Decomposition;
use crate::variable::IntVar;

/// Handle of a term inside one [`CspFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub(crate) u32);

impl TermId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structure of a term. Operands are already canonical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    Constant(i64),
    Variable(IntVar),
    /// Sum of at least two operands, sorted.
    Add(Vec<TermId>),
    Sub(TermId, TermId),
    /// Scalar multiple `c * t` with `c` not in `{0, 1, -1}`.
    Mul(i64, TermId),
    Neg(TermId),
    Min(TermId, TermId),
    Max(TermId, TermId),
    Abs(TermId),
    /// Euclidean quotient by a nonzero constant.
    Div(TermId, i64),
    /// Euclidean remainder by a nonzero constant.
    Mod(TermId, i64),
    /// Product of two non-constant terms.
    Product(TermId, TermId),
}

/// Linear form of a term plus the side constraints defining its auxiliaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDecomposition {
    pub linear: LinearExpression,
    pub side: Decomposition,
}

impl TermDecomposition {
    pub fn linear(linear: LinearExpression) -> Self {
        TermDecomposition {
            linear,
            side: Decomposition::valid(),
        }
    }
}
