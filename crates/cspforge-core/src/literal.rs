//! Arithmetic literals.
//!
//! [`LinearLiteral`] and [`ProductLiteral`] come out of predicate
//! decomposition. [`OpXY`], [`OpAdd`] and [`EqMul`] are the canonical
//! relations the compact order encoder rewrites linear literals into before
//! splitting them digit by digit.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::{ceil_div, IntegerDomain};
use crate::term::LinearExpression;
use crate::variable::IntVar;

/// Comparison of a linear expression against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinearOp {
    Le,
    Eq,
    Ne,
}

impl fmt::Display for LinearOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinearOp::Le => "<=",
            LinearOp::Eq => "=",
            LinearOp::Ne => "!=",
        })
    }
}

/// `expr op 0` with GCD-normalized coefficients.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinearLiteral {
    expr: LinearExpression,
    op: LinearOp,
}

impl LinearLiteral {
    /// Builds `expr op 0`, dividing the coefficients by their GCD.
    ///
    /// `=`/`!=` literals whose constant is not a multiple of the GCD fold to
    /// the constant false/true literal, and get a positive leading coefficient.
    pub fn new(expr: LinearExpression, op: LinearOp) -> Self {
        let g = expr.gcd();
        if g == 0 {
            return LinearLiteral { expr, op };
        }
        match op {
            LinearOp::Le => {
                if g == 1 {
                    return LinearLiteral { expr, op };
                }
                let reduced = LinearExpression::new(
                    expr.coefs().iter().map(|(v, a)| (v.clone(), a / g)).collect(),
                    ceil_div(expr.constant(), g),
                );
                LinearLiteral { expr: reduced, op }
            }
            LinearOp::Eq | LinearOp::Ne => {
                if expr.constant() % g != 0 {
                    return Self::constant(op == LinearOp::Ne);
                }
                let mut reduced = expr.divide_exact(g);
                let leading = reduced.coefs().values().next().copied().unwrap_or(1);
                if leading < 0 {
                    reduced = reduced.negate();
                }
                LinearLiteral { expr: reduced, op }
            }
        }
    }

    pub fn le(expr: LinearExpression) -> Self {
        Self::new(expr, LinearOp::Le)
    }

    pub fn eq(expr: LinearExpression) -> Self {
        Self::new(expr, LinearOp::Eq)
    }

    pub fn ne(expr: LinearExpression) -> Self {
        Self::new(expr, LinearOp::Ne)
    }

    /// `0 <= 0` for true, `1 <= 0` for false.
    pub fn constant(value: bool) -> Self {
        let c = if value { 0 } else { 1 };
        LinearLiteral {
            expr: LinearExpression::from_constant(c),
            op: LinearOp::Le,
        }
    }

    pub fn expr(&self) -> &LinearExpression {
        &self.expr
    }

    pub fn op(&self) -> LinearOp {
        self.op
    }

    /// Holds for every value of its variables.
    pub fn is_valid(&self) -> bool {
        let (lb, ub) = self.expr.bounds();
        match self.op {
            LinearOp::Le => ub <= 0,
            LinearOp::Eq => lb == 0 && ub == 0,
            LinearOp::Ne => lb > 0 || ub < 0 || !self.expr.domain().contains(0),
        }
    }

    /// Holds for no value of its variables.
    pub fn is_unsat(&self) -> bool {
        let (lb, ub) = self.expr.bounds();
        match self.op {
            LinearOp::Le => lb > 0,
            LinearOp::Eq => lb > 0 || ub < 0 || !self.expr.domain().contains(0),
            LinearOp::Ne => lb == 0 && ub == 0,
        }
    }

    /// A single-variable `<=` (or a constant), encodable as one order literal.
    pub fn is_simple(&self) -> bool {
        self.op == LinearOp::Le && self.expr.len() <= 1
    }

    pub fn negate(&self) -> Self {
        match self.op {
            LinearOp::Le => Self::le(self.expr.negate().add_constant(1)),
            LinearOp::Eq => Self::ne(self.expr.clone()),
            LinearOp::Ne => Self::eq(self.expr.clone()),
        }
    }

    pub fn substitute(&self, substitution: &BTreeMap<IntVar, IntVar>) -> Self {
        Self::new(self.expr.substitute(substitution), self.op)
    }

    pub fn evaluate(&self, values: &BTreeMap<IntVar, i64>) -> Option<bool> {
        let v = self.expr.evaluate(values)?;
        Some(match self.op {
            LinearOp::Le => v <= 0,
            LinearOp::Eq => v == 0,
            LinearOp::Ne => v != 0,
        })
    }
}

impl fmt::Display for LinearLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} 0", self.expr, self.op)
    }
}

impl fmt::Debug for LinearLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// `z = x * y`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductLiteral {
    pub z: IntVar,
    pub x: IntVar,
    pub y: IntVar,
}

impl ProductLiteral {
    pub fn new(z: IntVar, x: IntVar, y: IntVar) -> Self {
        ProductLiteral { z, x, y }
    }

    fn product_domain(&self) -> IntegerDomain {
        self.x.domain().mul_domain(self.y.domain())
    }

    pub fn is_valid(&self) -> bool {
        self.z.domain().size() == 1
            && self.x.domain().size() == 1
            && self.y.domain().size() == 1
            && self.z.domain().lb() == self.x.domain().lb() * self.y.domain().lb()
    }

    pub fn is_unsat(&self) -> bool {
        self.z.domain().intersection(&self.product_domain()).is_empty()
    }
}

impl fmt::Display for ProductLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} * {}", self.z, self.x, self.y)
    }
}

/// Operand of a canonical relation: a variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operand {
    Var(IntVar),
    Const(i64),
}

impl Operand {
    pub fn lb(&self) -> i64 {
        match self {
            Operand::Var(v) => v.domain().lb(),
            Operand::Const(c) => *c,
        }
    }

    pub fn ub(&self) -> i64 {
        match self {
            Operand::Var(v) => v.domain().ub(),
            Operand::Const(c) => *c,
        }
    }

    pub fn var(&self) -> Option<&IntVar> {
        match self {
            Operand::Var(v) => Some(v),
            Operand::Const(_) => None,
        }
    }

    pub fn to_linear(&self) -> LinearExpression {
        match self {
            Operand::Var(v) => LinearExpression::from_var(v),
            Operand::Const(c) => LinearExpression::from_constant(*c),
        }
    }

    pub fn substitute(&self, substitution: &BTreeMap<IntVar, IntVar>) -> Self {
        match self {
            Operand::Var(v) => Operand::Var(substitution.get(v).unwrap_or(v).clone()),
            Operand::Const(c) => Operand::Const(*c),
        }
    }

    pub fn evaluate(&self, values: &BTreeMap<IntVar, i64>) -> Option<i64> {
        match self {
            Operand::Var(v) => values.get(v).copied(),
            Operand::Const(c) => Some(*c),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(v) => write!(f, "{}", v),
            Operand::Const(c) => write!(f, "{}", c),
        }
    }
}

/// Relation of a canonical literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelOp {
    Le,
    Ge,
    Eq,
    Ne,
}

impl RelOp {
    /// The operator after swapping both sides.
    pub fn flip(self) -> Self {
        match self {
            RelOp::Le => RelOp::Ge,
            RelOp::Ge => RelOp::Le,
            op => op,
        }
    }

    pub fn holds(self, left: i64, right: i64) -> bool {
        match self {
            RelOp::Le => left <= right,
            RelOp::Ge => left >= right,
            RelOp::Eq => left == right,
            RelOp::Ne => left != right,
        }
    }

    /// `left op right` as a linear literal.
    pub fn linear(self, left: LinearExpression, right: LinearExpression) -> LinearLiteral {
        match self {
            RelOp::Le => LinearLiteral::le(left.sub(&right)),
            RelOp::Ge => LinearLiteral::le(right.sub(&left)),
            RelOp::Eq => LinearLiteral::eq(left.sub(&right)),
            RelOp::Ne => LinearLiteral::ne(left.sub(&right)),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
            RelOp::Eq => "=",
            RelOp::Ne => "!=",
        })
    }
}

/// `x op y`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpXY {
    pub op: RelOp,
    pub x: Operand,
    pub y: Operand,
}

impl OpXY {
    pub fn upper_bound(&self) -> i64 {
        self.x.ub().max(self.y.ub())
    }

    pub fn to_linear(&self) -> LinearLiteral {
        self.op.linear(self.x.to_linear(), self.y.to_linear())
    }
}

/// `z op x + y`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpAdd {
    pub op: RelOp,
    pub z: Operand,
    pub x: Operand,
    pub y: Operand,
}

impl OpAdd {
    pub fn upper_bound(&self) -> i64 {
        self.z.ub().max(self.x.ub()).max(self.y.ub())
    }

    pub fn to_linear(&self) -> LinearLiteral {
        self.op
            .linear(self.z.to_linear(), self.x.to_linear().add(&self.y.to_linear()))
    }
}

/// `z = x * y`, where `y` may be a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EqMul {
    pub z: IntVar,
    pub x: IntVar,
    pub y: Operand,
}

impl EqMul {
    pub fn upper_bound(&self) -> i64 {
        self.z.domain().ub().max(self.x.domain().ub()).max(self.y.ub())
    }

    /// The linear form when `y` is a constant.
    pub fn to_linear(&self) -> Option<LinearLiteral> {
        match self.y {
            Operand::Const(c) => Some(LinearLiteral::eq(
                LinearExpression::from_var(&self.z).sub(&LinearExpression::from_term(&self.x, c)),
            )),
            Operand::Var(_) => None,
        }
    }
}

/// Every arithmetic literal kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArithmeticLiteral {
    Linear(LinearLiteral),
    Product(ProductLiteral),
    OpXY(OpXY),
    OpAdd(OpAdd),
    EqMul(EqMul),
}

impl ArithmeticLiteral {
    /// Linear form, if the literal has one.
    pub fn as_linear(&self) -> Option<LinearLiteral> {
        match self {
            ArithmeticLiteral::Linear(l) => Some(l.clone()),
            ArithmeticLiteral::OpXY(l) => Some(l.to_linear()),
            ArithmeticLiteral::OpAdd(l) => Some(l.to_linear()),
            ArithmeticLiteral::EqMul(l) => l.to_linear(),
            ArithmeticLiteral::Product(_) => None,
        }
    }

    /// The product `z = x * y` for the two variable-product kinds.
    pub fn as_product(&self) -> Option<ProductLiteral> {
        match self {
            ArithmeticLiteral::Product(p) => Some(p.clone()),
            ArithmeticLiteral::EqMul(EqMul {
                z,
                x,
                y: Operand::Var(y),
            }) => Some(ProductLiteral::new(z.clone(), x.clone(), y.clone())),
            _ => None,
        }
    }

    pub fn vars(&self) -> BTreeSet<IntVar> {
        let mut vars = BTreeSet::new();
        let mut push = |o: &Operand| {
            if let Operand::Var(v) = o {
                vars.insert(v.clone());
            }
        };
        match self {
            ArithmeticLiteral::Linear(l) => return l.expr().vars().cloned().collect(),
            ArithmeticLiteral::Product(p) => {
                return [p.z.clone(), p.x.clone(), p.y.clone()].into_iter().collect()
            }
            ArithmeticLiteral::OpXY(l) => {
                push(&l.x);
                push(&l.y);
            }
            ArithmeticLiteral::OpAdd(l) => {
                push(&l.z);
                push(&l.x);
                push(&l.y);
            }
            ArithmeticLiteral::EqMul(l) => {
                push(&Operand::Var(l.z.clone()));
                push(&Operand::Var(l.x.clone()));
                push(&l.y);
            }
        }
        vars
    }

    pub fn is_valid(&self) -> bool {
        match self.as_linear() {
            Some(l) => l.is_valid(),
            None => self.as_product().is_some_and(|p| p.is_valid()),
        }
    }

    pub fn is_unsat(&self) -> bool {
        match self.as_linear() {
            Some(l) => l.is_unsat(),
            None => self.as_product().is_some_and(|p| p.is_unsat()),
        }
    }

    /// Upper bound of the operands, used by the digit encoder.
    pub fn upper_bound(&self) -> i64 {
        match self {
            ArithmeticLiteral::Linear(l) => l
                .expr()
                .vars()
                .map(|v| v.domain().ub())
                .max()
                .unwrap_or(0)
                .max(l.expr().constant().abs()),
            ArithmeticLiteral::Product(p) => {
                p.z.domain().ub().max(p.x.domain().ub()).max(p.y.domain().ub())
            }
            ArithmeticLiteral::OpXY(l) => l.upper_bound(),
            ArithmeticLiteral::OpAdd(l) => l.upper_bound(),
            ArithmeticLiteral::EqMul(l) => l.upper_bound(),
        }
    }

    pub fn substitute(&self, substitution: &BTreeMap<IntVar, IntVar>) -> Self {
        let var = |v: &IntVar| substitution.get(v).unwrap_or(v).clone();
        match self {
            ArithmeticLiteral::Linear(l) => ArithmeticLiteral::Linear(l.substitute(substitution)),
            ArithmeticLiteral::Product(p) => {
                ArithmeticLiteral::Product(ProductLiteral::new(var(&p.z), var(&p.x), var(&p.y)))
            }
            ArithmeticLiteral::OpXY(l) => ArithmeticLiteral::OpXY(OpXY {
                op: l.op,
                x: l.x.substitute(substitution),
                y: l.y.substitute(substitution),
            }),
            ArithmeticLiteral::OpAdd(l) => ArithmeticLiteral::OpAdd(OpAdd {
                op: l.op,
                z: l.z.substitute(substitution),
                x: l.x.substitute(substitution),
                y: l.y.substitute(substitution),
            }),
            ArithmeticLiteral::EqMul(l) => ArithmeticLiteral::EqMul(EqMul {
                z: var(&l.z),
                x: var(&l.x),
                y: l.y.substitute(substitution),
            }),
        }
    }

    pub fn evaluate(&self, values: &BTreeMap<IntVar, i64>) -> Option<bool> {
        match self.as_linear() {
            Some(l) => l.evaluate(values),
            None => {
                let p = self.as_product()?;
                Some(values.get(&p.z)? == &(values.get(&p.x)? * values.get(&p.y)?))
            }
        }
    }
}

impl From<LinearLiteral> for ArithmeticLiteral {
    fn from(literal: LinearLiteral) -> Self {
        ArithmeticLiteral::Linear(literal)
    }
}

impl fmt::Display for ArithmeticLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticLiteral::Linear(l) => write!(f, "{}", l),
            ArithmeticLiteral::Product(p) => write!(f, "{}", p),
            ArithmeticLiteral::OpXY(l) => write!(f, "{} {} {}", l.x, l.op, l.y),
            ArithmeticLiteral::OpAdd(l) => write!(f, "{} {} {} + {}", l.z, l.op, l.x, l.y),
            ArithmeticLiteral::EqMul(l) => write!(f, "{} = {} * {}", l.z, l.x, l.y),
        }
    }
}
