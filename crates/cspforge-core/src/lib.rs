//! CspForge Core - Core types for compiling integer constraints to clauses
//!
//! This crate provides the front half of the CspForge pipeline:
//! - Finite integer domains and their arithmetic
//! - Hash-consed terms and canonical linear expressions
//! - Arithmetic literals and mixed boolean/arithmetic clauses
//! - Formula decomposition into clauses
//! - The boundary trait to an external SAT engine

pub mod assignment;
pub mod clause;
pub mod csp;
pub mod decompose;
pub mod domain;
pub mod error;
pub mod formula;
pub mod literal;
pub mod sat;
pub mod term;
pub mod variable;


pub use assignment::CspAssignment;
pub use clause::IntegerClause;
pub use csp::{Csp, CspBuilder};
pub use decompose::Decomposition;
pub use domain::{IntegerDomain, DEFAULT_MAX_SET_SIZE};
pub use error::{CspError, Result};
pub use formula::{CompareOp, Formula, Predicate, PredicateId};
pub use literal::{
    ArithmeticLiteral, EqMul, LinearLiteral, LinearOp, OpAdd, OpXY, Operand, ProductLiteral, RelOp,
};
pub use sat::{Model, SatBackend};
pub use term::{CspFactory, FactoryOptions, LinearExpression, TermDecomposition, TermId, TermKind};
pub use variable::{BoolLit, BoolVar, IntVar};
