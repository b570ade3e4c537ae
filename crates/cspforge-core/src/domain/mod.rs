//! Finite integer domains.
//!
//! An [`IntegerDomain`] is either a contiguous range or an explicit sparse
//! set of values. Sets are normalized eagerly: a set that covers every
//! integer between its bounds becomes a range, and a set that grows beyond
//! the cardinality cap is over-approximated by its bounding range.
//!
//! # Examples
//!
//! ```
//! use cspforge_core::IntegerDomain;
//!
//! let d = IntegerDomain::from_values([1, 3, 5]);
//! assert_eq!(d.size(), 3);
//! assert!(!d.contains(2));
//!
//! // Contiguous sets collapse to ranges
//! assert_eq!(IntegerDomain::from_values([2, 3, 4]), IntegerDomain::range(2, 4));
//! ```

pub mod arith;


use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub use arith::{ceil_div, floor_div, gcd};

/// Default cardinality cap above which sparse sets become ranges.
pub const DEFAULT_MAX_SET_SIZE: usize = 128;

/// A finite set of integers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum IntegerDomain {
    /// All integers in `[lb, ub]`. `lb > ub` only for the empty domain.
    Range { lb: i64, ub: i64 },
    /// Sorted, distinct, non-contiguous values.
    Set(Arc<[i64]>),
}

impl IntegerDomain {
    /// The empty domain.
    pub const EMPTY: IntegerDomain = IntegerDomain::Range { lb: 1, ub: 0 };

    /// Creates the range `[lb, ub]`, or the empty domain when `lb > ub`.
    pub fn range(lb: i64, ub: i64) -> Self {
        if lb > ub {
            Self::EMPTY
        } else {
            IntegerDomain::Range { lb, ub }
        }
    }

    /// Creates the domain containing only `value`.
    pub fn singleton(value: i64) -> Self {
        IntegerDomain::Range {
            lb: value,
            ub: value,
        }
    }

    /// Creates a domain from arbitrary values using the default cap.
    pub fn from_values<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self::from_values_with_cap(values, DEFAULT_MAX_SET_SIZE)
    }

    /// Creates a domain from arbitrary values, over-approximating to a range
    /// once more than `cap` distinct values are present.
    pub fn from_values_with_cap<I: IntoIterator<Item = i64>>(values: I, cap: usize) -> Self {
        let set: BTreeSet<i64> = values.into_iter().collect();
        Self::from_sorted(set.into_iter().collect(), cap)
    }

    fn from_sorted(values: Vec<i64>, cap: usize) -> Self {
        match (values.first(), values.last()) {
            (Some(&lb), Some(&ub)) => {
                let span = ub as i128 - lb as i128 + 1;
                if span == values.len() as i128 || values.len() > cap {
                    IntegerDomain::Range { lb, ub }
                } else {
                    IntegerDomain::Set(values.into())
                }
            }
            _ => Self::EMPTY,
        }
    }

    /// Returns true if the domain has no values.
    pub fn is_empty(&self) -> bool {
        matches!(self, IntegerDomain::Range { lb, ub } if lb > ub)
    }

    /// Returns true for range domains (no internal gaps).
    pub fn is_contiguous(&self) -> bool {
        matches!(self, IntegerDomain::Range { .. })
    }

    /// Smallest value. Meaningless for the empty domain.
    pub fn lb(&self) -> i64 {
        match self {
            IntegerDomain::Range { lb, .. } => *lb,
            IntegerDomain::Set(values) => values[0],
        }
    }

    /// Largest value. Meaningless for the empty domain.
    pub fn ub(&self) -> i64 {
        match self {
            IntegerDomain::Range { ub, .. } => *ub,
            IntegerDomain::Set(values) => values[values.len() - 1],
        }
    }

    /// Number of values, saturating at `u64::MAX`.
    pub fn size(&self) -> u64 {
        match self {
            IntegerDomain::Range { lb, ub } => {
                if lb > ub {
                    0
                } else {
                    let span = *ub as i128 - *lb as i128 + 1;
                    u64::try_from(span).unwrap_or(u64::MAX)
                }
            }
            IntegerDomain::Set(values) => values.len() as u64,
        }
    }

    /// Returns true if `value` belongs to the domain.
    pub fn contains(&self, value: i64) -> bool {
        match self {
            IntegerDomain::Range { lb, ub } => *lb <= value && value <= *ub,
            IntegerDomain::Set(values) => values.binary_search(&value).is_ok(),
        }
    }

    /// Number of domain values strictly below `x`.
    ///
    /// For a value `v` of the domain this is its position in ascending order.
    pub fn count_below(&self, x: i64) -> u64 {
        match self {
            IntegerDomain::Range { lb, ub } => {
                if lb > ub || x <= *lb {
                    0
                } else if x > *ub {
                    self.size()
                } else {
                    (x as i128 - *lb as i128) as u64
                }
            }
            IntegerDomain::Set(values) => values.partition_point(|&v| v < x) as u64,
        }
    }

    /// Iterates all values in ascending order.
    pub fn values(&self) -> Values<'_> {
        self.values_between(i64::MIN, i64::MAX)
    }

    /// Iterates the values within `[lb, ub]` in ascending order.
    pub fn values_between(&self, lb: i64, ub: i64) -> Values<'_> {
        match self {
            IntegerDomain::Range { lb: dlb, ub: dub } => {
                Values(ValuesInner::Range((*dlb).max(lb)..=(*dub).min(ub)))
            }
            IntegerDomain::Set(values) => {
                let start = values.partition_point(|&v| v < lb);
                let end = values.partition_point(|&v| v <= ub).max(start);
                Values(ValuesInner::Set(values[start..end].iter().copied()))
            }
        }
    }

    /// Intersects the domain with the interval `[lb, ub]`.
    pub fn bound(&self, lb: i64, ub: i64) -> Self {
        match self {
            IntegerDomain::Range { lb: dlb, ub: dub } => {
                if dlb > dub {
                    Self::EMPTY
                } else {
                    Self::range((*dlb).max(lb), (*dub).min(ub))
                }
            }
            IntegerDomain::Set(_) => {
                Self::from_sorted(self.values_between(lb, ub).collect(), usize::MAX)
            }
        }
    }

    /// Set union. Disjoint results beyond the default cap become the
    /// bounding range.
    pub fn union(&self, other: &Self) -> Self {
        self.union_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    /// Set union, collapsing to the bounding range beyond `cap` values.
    pub fn union_with_cap(&self, other: &Self, cap: usize) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let lb = self.lb().min(other.lb());
        let ub = self.ub().max(other.ub());
        if let (IntegerDomain::Range { .. }, IntegerDomain::Range { .. }) = (self, other) {
            let gap_free = self.lb().max(other.lb()) as i128 <= self.ub().min(other.ub()) as i128 + 1;
            if gap_free {
                return Self::range(lb, ub);
            }
        }
        if self.size().saturating_add(other.size()) <= cap as u64 {
            Self::from_values_with_cap(self.values().chain(other.values()), cap)
        } else {
            Self::range(lb, ub)
        }
    }

    /// Set intersection.
    pub fn intersection(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        match (self, other) {
            (IntegerDomain::Range { .. }, IntegerDomain::Range { .. }) => {
                Self::range(self.lb().max(other.lb()), self.ub().min(other.ub()))
            }
            (IntegerDomain::Set(values), rhs) | (rhs, IntegerDomain::Set(values)) => {
                let kept = values.iter().copied().filter(|&v| rhs.contains(v)).collect();
                Self::from_sorted(kept, usize::MAX)
            }
        }
    }

    /// `{-v | v in self}`.
    pub fn negate(&self) -> Self {
        match self {
            IntegerDomain::Range { lb, ub } => {
                if lb > ub {
                    Self::EMPTY
                } else {
                    Self::range(ub.saturating_neg(), lb.saturating_neg())
                }
            }
            IntegerDomain::Set(values) => {
                let negated = values.iter().rev().map(|v| v.saturating_neg()).collect();
                Self::from_sorted(negated, usize::MAX)
            }
        }
    }

    /// `{|v| | v in self}`.
    pub fn abs(&self) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        match self {
            IntegerDomain::Range { lb, ub } => {
                if *lb >= 0 {
                    self.clone()
                } else if *ub <= 0 {
                    self.negate()
                } else {
                    Self::range(0, lb.saturating_neg().max(*ub))
                }
            }
            IntegerDomain::Set(values) => {
                Self::from_values_with_cap(values.iter().map(|v| v.saturating_abs()), usize::MAX)
            }
        }
    }

    /// `{v + c | v in self}`.
    pub fn add(&self, c: i64) -> Self {
        if c == 0 {
            return self.clone();
        }
        self.map_monotone(|v| v.saturating_add(c))
    }

    /// `{v - c | v in self}`.
    pub fn sub(&self, c: i64) -> Self {
        self.add(c.saturating_neg())
    }

    /// `{v * c | v in self}`.
    pub fn mul(&self, c: i64) -> Self {
        self.mul_with_cap(c, DEFAULT_MAX_SET_SIZE)
    }

    /// `{v * c | v in self}`, a range once more than `cap` values would be
    /// listed.
    pub fn mul_with_cap(&self, c: i64, cap: usize) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        match c {
            0 => Self::singleton(0),
            1 => self.clone(),
            -1 => self.negate(),
            _ => {
                if self.size() <= cap as u64 {
                    Self::from_values_with_cap(self.values().map(|v| v.saturating_mul(c)), cap)
                } else {
                    let a = self.lb().saturating_mul(c);
                    let b = self.ub().saturating_mul(c);
                    Self::range(a.min(b), a.max(b))
                }
            }
        }
    }

    /// Quotients of division by the nonzero constant `c`.
    ///
    /// The quotient is the Euclidean one, so that the remainder lies in
    /// `[0, |c|)`; for positive `c` this rounds toward negative infinity.
    ///
    /// # Panics
    ///
    /// Panics if `c` is zero.
    pub fn div(&self, c: i64) -> Self {
        assert!(c != 0, "division of a domain by zero");
        if self.is_empty() {
            return Self::EMPTY;
        }
        match self {
            IntegerDomain::Range { lb, ub } => {
                let a = lb.div_euclid(c);
                let b = ub.div_euclid(c);
                Self::range(a.min(b), a.max(b))
            }
            IntegerDomain::Set(values) => {
                Self::from_values_with_cap(values.iter().map(|v| v.div_euclid(c)), usize::MAX)
            }
        }
    }

    /// Remainders of division by the nonzero constant `c`, all in `[0, |c|)`.
    ///
    /// # Panics
    ///
    /// Panics if `c` is zero.
    pub fn modulo(&self, c: i64) -> Self {
        self.modulo_with_cap(c, DEFAULT_MAX_SET_SIZE)
    }

    /// [`IntegerDomain::modulo`] with an explicit cardinality cap.
    ///
    /// # Panics
    ///
    /// Panics if `c` is zero.
    pub fn modulo_with_cap(&self, c: i64, cap: usize) -> Self {
        assert!(c != 0, "modulo of a domain by zero");
        if self.is_empty() {
            return Self::EMPTY;
        }
        let m = c.saturating_abs();
        match self {
            IntegerDomain::Range { lb, ub } => {
                if self.size() >= m as u64 {
                    return Self::range(0, m - 1);
                }
                let lr = lb.rem_euclid(m);
                let ur = ub.rem_euclid(m);
                if lr <= ur {
                    Self::range(lr, ur)
                } else {
                    Self::range(0, ur).union_with_cap(&Self::range(lr, m - 1), cap)
                }
            }
            IntegerDomain::Set(values) => {
                Self::from_values_with_cap(values.iter().map(|v| v.rem_euclid(m)), usize::MAX)
            }
        }
    }

    /// `{a + b | a in self, b in other}`.
    pub fn add_domain(&self, other: &Self) -> Self {
        self.add_domain_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    pub fn add_domain_with_cap(&self, other: &Self, cap: usize) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        self.cross(other, cap, |a, b| a.checked_add(b)).unwrap_or_else(|| {
            Self::range(
                self.lb().saturating_add(other.lb()),
                self.ub().saturating_add(other.ub()),
            )
        })
    }

    /// `{a - b | a in self, b in other}`.
    pub fn sub_domain(&self, other: &Self) -> Self {
        self.sub_domain_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    pub fn sub_domain_with_cap(&self, other: &Self, cap: usize) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        self.cross(other, cap, |a, b| a.checked_sub(b)).unwrap_or_else(|| {
            Self::range(
                self.lb().saturating_sub(other.ub()),
                self.ub().saturating_sub(other.lb()),
            )
        })
    }

    /// `{a * b | a in self, b in other}` (over-approximated for large inputs).
    pub fn mul_domain(&self, other: &Self) -> Self {
        self.mul_domain_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    pub fn mul_domain_with_cap(&self, other: &Self, cap: usize) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        self.cross(other, cap, |a, b| a.checked_mul(b)).unwrap_or_else(|| {
            let corners = [
                self.lb().saturating_mul(other.lb()),
                self.lb().saturating_mul(other.ub()),
                self.ub().saturating_mul(other.lb()),
                self.ub().saturating_mul(other.ub()),
            ];
            Self::range(min_of(&corners), max_of(&corners))
        })
    }

    /// Euclidean quotients by every nonzero divisor in `other`.
    pub fn div_domain(&self, other: &Self) -> Self {
        self.div_domain_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    pub fn div_domain_with_cap(&self, other: &Self, cap: usize) -> Self {
        let divisors = other.without_zero();
        if self.is_empty() || divisors.iter().all(|d| d.is_empty()) {
            return Self::EMPTY;
        }
        let exact = self.cross(other, cap, |a, b| if b == 0 { None } else { Some(a.div_euclid(b)) });
        if let Some(domain) = exact {
            return domain;
        }
        let mut hull = Self::EMPTY;
        for part in divisors.iter().filter(|d| !d.is_empty()) {
            let corners = [
                self.lb().div_euclid(part.lb()),
                self.lb().div_euclid(part.ub()),
                self.ub().div_euclid(part.lb()),
                self.ub().div_euclid(part.ub()),
            ];
            hull = hull.union(&Self::range(min_of(&corners), max_of(&corners)));
        }
        Self::range(hull.lb(), hull.ub())
    }

    /// Euclidean remainders by every nonzero divisor in `other`.
    pub fn mod_domain(&self, other: &Self) -> Self {
        self.mod_domain_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    pub fn mod_domain_with_cap(&self, other: &Self, cap: usize) -> Self {
        let divisors = other.without_zero();
        if self.is_empty() || divisors.iter().all(|d| d.is_empty()) {
            return Self::EMPTY;
        }
        let exact = self.cross(other, cap, |a, b| if b == 0 { None } else { Some(a.rem_euclid(b)) });
        if let Some(domain) = exact {
            return domain;
        }
        let max_abs = other.lb().saturating_abs().max(other.ub().saturating_abs());
        let mut ub = max_abs - 1;
        if self.lb() >= 0 {
            ub = ub.min(self.ub());
        }
        Self::range(0, ub)
    }

    /// Domain of `min(a, b)` for `a` in self and `b` in other.
    pub fn min_domain(&self, other: &Self) -> Self {
        self.min_domain_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    pub fn min_domain_with_cap(&self, other: &Self, cap: usize) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        self.bound(i64::MIN, other.ub())
            .union_with_cap(&other.bound(i64::MIN, self.ub()), cap)
    }

    /// Domain of `max(a, b)` for `a` in self and `b` in other.
    pub fn max_domain(&self, other: &Self) -> Self {
        self.max_domain_with_cap(other, DEFAULT_MAX_SET_SIZE)
    }

    pub fn max_domain_with_cap(&self, other: &Self, cap: usize) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        self.bound(other.lb(), i64::MAX)
            .union_with_cap(&other.bound(self.lb(), i64::MAX), cap)
    }

    fn map_monotone(&self, f: impl Fn(i64) -> i64) -> Self {
        match self {
            IntegerDomain::Range { lb, ub } => {
                if lb > ub {
                    Self::EMPTY
                } else {
                    Self::range(f(*lb), f(*ub))
                }
            }
            IntegerDomain::Set(values) => {
                Self::from_values_with_cap(values.iter().map(|&v| f(v)), usize::MAX)
            }
        }
    }

    /// Negative and positive parts of the domain, zero removed.
    fn without_zero(&self) -> [Self; 2] {
        [self.bound(i64::MIN, -1), self.bound(1, i64::MAX)]
    }

    /// Exact cross product, attempted only when a sparse set is involved
    /// and at most `cap` values come out.
    fn cross(&self, other: &Self, cap: usize, f: impl Fn(i64, i64) -> Option<i64>) -> Option<Self> {
        let sparse = !self.is_contiguous() || !other.is_contiguous();
        if !sparse || self.size() > cap as u64 || other.size() > cap as u64 {
            return None;
        }
        let mut out = BTreeSet::new();
        for a in self.values() {
            for b in other.values() {
                if let Some(v) = f(a, b) {
                    out.insert(v);
                } else if b != 0 {
                    return None;
                }
                if out.len() > cap {
                    return None;
                }
            }
        }
        Some(Self::from_sorted(out.into_iter().collect(), cap))
    }
}

fn min_of(values: &[i64]) -> i64 {
    values.iter().copied().min().unwrap_or(0)
}

fn max_of(values: &[i64]) -> i64 {
    values.iter().copied().max().unwrap_or(0)
}

/// Orders by upper bound, then by the printed form.
///
/// Only used to make processing order deterministic.
impl Ord for IntegerDomain {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ub()
            .cmp(&other.ub())
            .then_with(|| self.to_string().cmp(&other.to_string()))
    }
}

impl PartialOrd for IntegerDomain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IntegerDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegerDomain::Range { lb, ub } if lb > ub => write!(f, "{{}}"),
            IntegerDomain::Range { lb, ub } => write!(f, "[{}..{}]", lb, ub),
            IntegerDomain::Set(values) => {
                write!(f, "{{")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Debug for IntegerDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Ascending iterator over domain values.
pub struct Values<'a>(ValuesInner<'a>);

enum ValuesInner<'a> {
    Range(std::ops::RangeInclusive<i64>),
    Set(std::iter::Copied<std::slice::Iter<'a, i64>>),
}

impl Iterator for Values<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        match &mut self.0 {
            ValuesInner::Range(range) => range.next(),
            ValuesInner::Set(iter) => iter.next(),
        }
    }
}
