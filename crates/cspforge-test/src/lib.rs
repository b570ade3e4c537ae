//! Shared test utilities for CspForge crates.
//!
//! - [`sat`] - A small CDCL solver implementing `SatBackend`
//! - [`brute`] - Brute-force solution enumeration of a `Csp`
//! - [`fixtures`] - Decomposed problems with known solution sets
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cspforge-test = { workspace = true }
//! ```
//!
//! Then import what you need:
//!
//! ```ignore
//! use cspforge_test::{brute_force_solutions, fixtures, DpllSolver};
//! ```

pub mod brute;
pub mod fixtures;
pub mod sat;

pub use brute::{brute_force_solutions, project, Projection};
pub use fixtures::Fixture;
pub use sat::DpllSolver;
