//! Boolean formulas over literals and arithmetic predicates.

use std::fmt;

use crate::term::TermId;
use crate::variable::BoolLit;

/// Handle of a predicate inside one [`CspFactory`](crate::CspFactory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateId(pub(crate) u32);

impl PredicateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Comparison operator between two terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// The operator of the negated comparison.
    pub fn negate(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Ge => CompareOp::Lt,
        }
    }

    /// The operator after swapping both sides.
    pub fn flip(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
        }
    }

    pub fn holds(self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        f.write_str(symbol)
    }
}

/// Arithmetic predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Comparison {
        op: CompareOp,
        left: TermId,
        right: TermId,
    },
    /// Pairwise distinct values. Terms are kept sorted.
    AllDifferent(Vec<TermId>),
    /// At least two equal values; the negation of `AllDifferent`.
    Pigeonhole(Vec<TermId>),
}

impl Predicate {
    pub fn negate(&self) -> Predicate {
        match self {
            Predicate::Comparison { op, left, right } => Predicate::Comparison {
                op: op.negate(),
                left: *left,
                right: *right,
            },
            Predicate::AllDifferent(terms) => Predicate::Pigeonhole(terms.clone()),
            Predicate::Pigeonhole(terms) => Predicate::AllDifferent(terms.clone()),
        }
    }
}

/// A boolean formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Constant(bool),
    Literal(BoolLit),
    Predicate(PredicateId),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Equiv(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn and(children: impl IntoIterator<Item = Formula>) -> Self {
        Formula::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Formula>) -> Self {
        Formula::Or(children.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Formula) -> Self {
        Formula::Not(Box::new(child))
    }

    pub fn implies(premise: Formula, conclusion: Formula) -> Self {
        Formula::Implies(Box::new(premise), Box::new(conclusion))
    }

    pub fn equiv(left: Formula, right: Formula) -> Self {
        Formula::Equiv(Box::new(left), Box::new(right))
    }

    pub fn lit(literal: BoolLit) -> Self {
        Formula::Literal(literal)
    }

    /// Negation normal form.
    ///
    /// Implications and equivalences are eliminated and negations are pushed
    /// down until they sit directly on a predicate. Negated literals and
    /// constants are folded.
    pub fn to_nnf(&self) -> Formula {
        match self {
            Formula::Constant(_) | Formula::Literal(_) | Formula::Predicate(_) => self.clone(),
            Formula::Not(child) => child.negated_nnf(),
            Formula::And(children) => Formula::And(children.iter().map(|c| c.to_nnf()).collect()),
            Formula::Or(children) => Formula::Or(children.iter().map(|c| c.to_nnf()).collect()),
            Formula::Implies(a, b) => Formula::Or(vec![a.negated_nnf(), b.to_nnf()]),
            Formula::Equiv(a, b) => Formula::And(vec![
                Formula::Or(vec![a.negated_nnf(), b.to_nnf()]),
                Formula::Or(vec![a.to_nnf(), b.negated_nnf()]),
            ]),
        }
    }

    fn negated_nnf(&self) -> Formula {
        match self {
            Formula::Constant(b) => Formula::Constant(!b),
            Formula::Literal(l) => Formula::Literal(l.negate()),
            Formula::Predicate(_) => Formula::Not(Box::new(self.clone())),
            Formula::Not(child) => child.to_nnf(),
            Formula::And(children) => {
                Formula::Or(children.iter().map(|c| c.negated_nnf()).collect())
            }
            Formula::Or(children) => {
                Formula::And(children.iter().map(|c| c.negated_nnf()).collect())
            }
            Formula::Implies(a, b) => Formula::And(vec![a.to_nnf(), b.negated_nnf()]),
            Formula::Equiv(a, b) => Formula::Or(vec![
                Formula::And(vec![a.to_nnf(), b.negated_nnf()]),
                Formula::And(vec![a.negated_nnf(), b.to_nnf()]),
            ]),
        }
    }
}

impl From<BoolLit> for Formula {
    fn from(literal: BoolLit) -> Self {
        Formula::Literal(literal)
    }
}

impl From<bool> for Formula {
    fn from(value: bool) -> Self {
        Formula::Constant(value)
    }
}
