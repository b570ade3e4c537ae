//! Integer and boolean variable handles.
//!
//! Integer variables are allocated by [`CspFactory`](crate::CspFactory) and
//! are identified by a factory-unique id. Boolean variables are identified
//! by name. Names starting with [`AUX_PREFIX`] are reserved for variables
//! introduced by decomposition and encoding.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::domain::IntegerDomain;

/// Prefix reserved for auxiliary variable names.
pub const AUX_PREFIX: char = '@';

struct IntVarData {
    id: u32,
    name: Arc<str>,
    domain: IntegerDomain,
    aux: bool,
}

/// A finite-domain integer variable.
///
/// Cloning is cheap. Equality, hashing and ordering use the id only.
#[derive(Clone)]
pub struct IntVar(Arc<IntVarData>);

impl IntVar {
    pub(crate) fn new(id: u32, name: Arc<str>, domain: IntegerDomain, aux: bool) -> Self {
        IntVar(Arc::new(IntVarData {
            id,
            name,
            domain,
            aux,
        }))
    }

    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn domain(&self) -> &IntegerDomain {
        &self.0.domain
    }

    /// Returns true for variables introduced by decomposition or encoding.
    pub fn is_aux(&self) -> bool {
        self.0.aux
    }
}

impl PartialEq for IntVar {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for IntVar {}

impl Hash for IntVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl Ord for IntVar {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.id.cmp(&other.0.id)
    }
}

impl PartialOrd for IntVar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IntVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl fmt::Debug for IntVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.name, self.0.domain)
    }
}

/// A propositional variable, identified by its name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(Arc<str>);

impl BoolVar {
    /// Creates a boolean variable handle.
    ///
    /// SAT backends use this for their own fresh variables; user-facing
    /// variables should come from [`CspFactory::bool_var`](crate::CspFactory::bool_var).
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        BoolVar(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_aux(&self) -> bool {
        self.0.starts_with(AUX_PREFIX)
    }

    pub fn positive(&self) -> BoolLit {
        BoolLit::new(self.clone(), true)
    }

    pub fn negative(&self) -> BoolLit {
        BoolLit::new(self.clone(), false)
    }
}

impl fmt::Display for BoolVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BoolVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A boolean variable or its negation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolLit {
    var: BoolVar,
    positive: bool,
}

impl BoolLit {
    pub fn new(var: BoolVar, positive: bool) -> Self {
        BoolLit { var, positive }
    }

    pub fn var(&self) -> &BoolVar {
        &self.var
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    pub fn negate(&self) -> Self {
        BoolLit {
            var: self.var.clone(),
            positive: !self.positive,
        }
    }
}

impl fmt::Display for BoolLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}", self.var)
        } else {
            write!(f, "!{}", self.var)
        }
    }
}

impl fmt::Debug for BoolLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
