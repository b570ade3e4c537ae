//! Canonical linear sums.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::domain::{gcd, IntegerDomain};
use crate::variable::IntVar;

/// `sum(coef_i * var_i) + constant`, without zero coefficients.
///
/// The domain is computed on first use and cached.
#[derive(Clone, Default)]
pub struct LinearExpression {
    coefs: BTreeMap<IntVar, i64>,
    constant: i64,
    domain: OnceLock<IntegerDomain>,
}

impl LinearExpression {
    /// Builds an expression, dropping zero coefficients.
    pub fn new(coefs: BTreeMap<IntVar, i64>, constant: i64) -> Self {
        let coefs = coefs.into_iter().filter(|(_, a)| *a != 0).collect();
        LinearExpression {
            coefs,
            constant,
            domain: OnceLock::new(),
        }
    }

    pub fn from_constant(constant: i64) -> Self {
        Self::new(BTreeMap::new(), constant)
    }

    pub fn from_var(var: &IntVar) -> Self {
        Self::from_term(var, 1)
    }

    /// `coef * var`.
    pub fn from_term(var: &IntVar, coef: i64) -> Self {
        let mut coefs = BTreeMap::new();
        coefs.insert(var.clone(), coef);
        Self::new(coefs, 0)
    }

    pub fn coefs(&self) -> &BTreeMap<IntVar, i64> {
        &self.coefs
    }

    pub fn coef(&self, var: &IntVar) -> i64 {
        self.coefs.get(var).copied().unwrap_or(0)
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    pub fn vars(&self) -> impl Iterator<Item = &IntVar> {
        self.coefs.keys()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.coefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefs.is_empty()
    }

    /// Returns true if the expression has no variables.
    pub fn is_constant(&self) -> bool {
        self.coefs.is_empty()
    }

    /// Range of values the expression can take.
    pub fn domain(&self) -> &IntegerDomain {
        self.domain.get_or_init(|| {
            self.coefs
                .iter()
                .fold(IntegerDomain::singleton(self.constant), |acc, (v, a)| {
                    acc.add_domain(&v.domain().mul(*a))
                })
        })
    }

    /// Cheap interval bounds `(lb, ub)` computed from the variable bounds.
    pub fn bounds(&self) -> (i64, i64) {
        let (lb, ub) = self.wide_bounds();
        (clamp(lb), clamp(ub))
    }

    /// [`LinearExpression::bounds`] in `i128`, saturating at its limits.
    pub fn wide_bounds(&self) -> (i128, i128) {
        let mut lb = self.constant as i128;
        let mut ub = self.constant as i128;
        for (v, &a) in &self.coefs {
            let x = a as i128 * v.domain().lb() as i128;
            let y = a as i128 * v.domain().ub() as i128;
            lb = lb.saturating_add(x.min(y));
            ub = ub.saturating_add(x.max(y));
        }
        (lb, ub)
    }

    pub fn add(&self, other: &Self) -> Self {
        let mut coefs = self.coefs.clone();
        for (v, a) in &other.coefs {
            *coefs.entry(v.clone()).or_insert(0) += a;
        }
        Self::new(coefs, self.constant + other.constant)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    pub fn add_constant(&self, c: i64) -> Self {
        Self::new(self.coefs.clone(), self.constant + c)
    }

    pub fn scale(&self, k: i64) -> Self {
        let coefs = self.coefs.iter().map(|(v, a)| (v.clone(), a * k)).collect();
        Self::new(coefs, self.constant * k)
    }

    pub fn negate(&self) -> Self {
        self.scale(-1)
    }

    /// Divides every coefficient and the constant by `k`, which must divide them exactly.
    pub(crate) fn divide_exact(&self, k: i64) -> Self {
        let coefs = self.coefs.iter().map(|(v, a)| (v.clone(), a / k)).collect();
        Self::new(coefs, self.constant / k)
    }

    /// GCD of the coefficients (0 for a constant expression).
    pub fn gcd(&self) -> i64 {
        self.coefs.values().fold(0, |g, &a| gcd(g, a))
    }

    /// Replaces variables according to `substitution`, merging coefficients.
    pub fn substitute(&self, substitution: &BTreeMap<IntVar, IntVar>) -> Self {
        if !self.coefs.keys().any(|v| substitution.contains_key(v)) {
            return self.clone();
        }
        let mut coefs = BTreeMap::new();
        for (v, a) in &self.coefs {
            let target = substitution.get(v).unwrap_or(v);
            *coefs.entry(target.clone()).or_insert(0) += a;
        }
        Self::new(coefs, self.constant)
    }

    /// Value under `values`, or `None` if a variable is unassigned.
    pub fn evaluate(&self, values: &BTreeMap<IntVar, i64>) -> Option<i64> {
        self.coefs.iter().try_fold(self.constant, |acc, (v, a)| {
            values.get(v).map(|x| acc + a * x)
        })
    }
}

fn clamp(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl PartialEq for LinearExpression {
    fn eq(&self, other: &Self) -> bool {
        self.constant == other.constant && self.coefs == other.coefs
    }
}

impl Eq for LinearExpression {}

impl Hash for LinearExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coefs.hash(state);
        self.constant.hash(state);
    }
}

impl Ord for LinearExpression {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coefs
            .cmp(&other.coefs)
            .then(self.constant.cmp(&other.constant))
    }
}

impl PartialOrd for LinearExpression {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LinearExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (v, &a) in &self.coefs {
            let sign = if a < 0 { "-" } else { "+" };
            if first {
                if a < 0 {
                    write!(f, "-")?;
                }
            } else {
                write!(f, " {} ", sign)?;
            }
            if a.abs() != 1 {
                write!(f, "{}*", a.abs())?;
            }
            write!(f, "{}", v)?;
            first = false;
        }
        if first {
            write!(f, "{}", self.constant)
        } else if self.constant > 0 {
            write!(f, " + {}", self.constant)
        } else if self.constant < 0 {
            write!(f, " - {}", -(self.constant as i128))
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for LinearExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
