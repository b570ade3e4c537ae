//! The term arena, variable table and predicate table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::{TermDecomposition, TermId, TermKind};
use crate::assignment::CspAssignment;
use crate::decompose::Decomposition;
use crate::domain::{IntegerDomain, DEFAULT_MAX_SET_SIZE};
use crate::error::{CspError, Result};
use crate::formula::{CompareOp, Formula, Predicate, PredicateId};
use crate::variable::{BoolVar, IntVar, AUX_PREFIX};

/// Tuning knobs that do not affect satisfiability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Sparse domains with more values than this become ranges.
    pub max_set_size: usize,
    /// Emit the two redundant bound clauses of all-different.
    pub all_different_bounds: bool,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        FactoryOptions {
            max_set_size: DEFAULT_MAX_SET_SIZE,
            all_different_bounds: true,
        }
    }
}

/// Owns every term, variable and predicate of one problem.
///
/// Not thread-safe; use one factory per problem.
#[derive(Default)]
pub struct CspFactory {
    options: FactoryOptions,
    kinds: Vec<TermKind>,
    domains: Vec<IntegerDomain>,
    term_index: HashMap<TermKind, TermId>,
    predicates: Vec<Predicate>,
    predicate_index: HashMap<Predicate, PredicateId>,
    int_vars: Vec<IntVar>,
    int_var_names: HashMap<Arc<str>, IntVar>,
    bool_vars: HashMap<Arc<str>, BoolVar>,
    aux_int_count: u32,
    aux_bool_count: u32,
    pub(crate) term_memo: HashMap<TermId, Arc<TermDecomposition>>,
    pub(crate) predicate_memo: HashMap<PredicateId, Arc<Decomposition>>,
    pub(crate) divmod_memo: HashMap<(TermId, i64), (IntVar, IntVar, Arc<Decomposition>)>,
}

impl CspFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FactoryOptions) -> Self {
        CspFactory {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    // ---- variables ----

    /// Declares a user integer variable.
    ///
    /// # Errors
    ///
    /// `EmptyDomain` for an empty domain, `DuplicateVariable` if the name is
    /// taken, `InvalidArgument` for names using the auxiliary prefix.
    pub fn int_var(&mut self, name: &str, domain: IntegerDomain) -> Result<IntVar> {
        self.check_name(name)?;
        if domain.is_empty() {
            return Err(CspError::EmptyDomain(name.to_string()));
        }
        let domain = self.cap_domain(domain);
        let var = self.push_int_var(Arc::from(name), domain, false);
        Ok(var)
    }

    /// Declares a user integer variable over `[lb, ub]`.
    pub fn int_var_range(&mut self, name: &str, lb: i64, ub: i64) -> Result<IntVar> {
        self.int_var(name, IntegerDomain::range(lb, ub))
    }

    /// Declares a user integer variable over explicit values.
    pub fn int_var_values<I>(&mut self, name: &str, values: I) -> Result<IntVar>
    where
        I: IntoIterator<Item = i64>,
    {
        let domain = IntegerDomain::from_values_with_cap(values, self.options.max_set_size);
        self.int_var(name, domain)
    }

    /// Allocates a fresh auxiliary integer variable.
    ///
    /// The domain must not be empty.
    pub fn aux_int_var(&mut self, domain: IntegerDomain) -> IntVar {
        debug_assert!(!domain.is_empty());
        let name = format!("{}AUX_I{}", AUX_PREFIX, self.aux_int_count);
        self.aux_int_count += 1;
        let domain = self.cap_domain(domain);
        self.push_int_var(Arc::from(name), domain, true)
    }

    /// Declares a user boolean variable.
    pub fn bool_var(&mut self, name: &str) -> Result<BoolVar> {
        self.check_name(name)?;
        let name: Arc<str> = Arc::from(name);
        let var = BoolVar::new(name.clone());
        self.bool_vars.insert(name, var.clone());
        Ok(var)
    }

    /// Allocates a fresh auxiliary boolean variable.
    pub fn aux_bool_var(&mut self) -> BoolVar {
        let name = format!("{}AUX_B{}", AUX_PREFIX, self.aux_bool_count);
        self.aux_bool_count += 1;
        BoolVar::new(name)
    }

    /// All integer variables, user and auxiliary, in creation order.
    pub fn int_vars(&self) -> &[IntVar] {
        &self.int_vars
    }

    pub fn int_var_by_name(&self, name: &str) -> Option<&IntVar> {
        self.int_var_names.get(name)
    }

    pub fn bool_var_by_name(&self, name: &str) -> Option<&BoolVar> {
        self.bool_vars.get(name)
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if name.starts_with(AUX_PREFIX) {
            return Err(CspError::InvalidArgument(format!(
                "variable name {} uses the reserved prefix {}",
                name, AUX_PREFIX
            )));
        }
        if self.int_var_names.contains_key(name) || self.bool_vars.contains_key(name) {
            return Err(CspError::DuplicateVariable(name.to_string()));
        }
        Ok(())
    }

    fn cap_domain(&self, domain: IntegerDomain) -> IntegerDomain {
        if domain.size() > self.options.max_set_size as u64 && !domain.is_contiguous() {
            IntegerDomain::range(domain.lb(), domain.ub())
        } else {
            domain
        }
    }

    fn push_int_var(&mut self, name: Arc<str>, domain: IntegerDomain, aux: bool) -> IntVar {
        let var = IntVar::new(self.int_vars.len() as u32, name.clone(), domain, aux);
        self.int_vars.push(var.clone());
        self.int_var_names.insert(name, var.clone());
        var
    }

    // ---- terms ----

    pub fn kind(&self, term: TermId) -> &TermKind {
        &self.kinds[term.index()]
    }

    /// Domain of the values `term` can take.
    pub fn domain_of(&self, term: TermId) -> &IntegerDomain {
        &self.domains[term.index()]
    }

    /// Returns the constant value if `term` is a constant.
    pub fn as_constant(&self, term: TermId) -> Option<i64> {
        match self.kind(term) {
            TermKind::Constant(c) => Some(*c),
            _ => None,
        }
    }

    pub fn constant(&mut self, value: i64) -> TermId {
        self.intern(TermKind::Constant(value))
    }

    pub fn variable(&mut self, var: &IntVar) -> TermId {
        self.intern(TermKind::Variable(var.clone()))
    }

    /// `a + b`. Operand order does not matter.
    pub fn add(&mut self, a: TermId, b: TermId) -> TermId {
        self.sum(&[a, b])
    }

    /// Sum of all `terms`, flattened with coefficients accumulated.
    pub fn sum(&mut self, terms: &[TermId]) -> TermId {
        let weighted: Vec<(TermId, i64)> = terms.iter().map(|&t| (t, 1)).collect();
        self.linear_combination(&weighted)
    }

    /// `a - b`.
    pub fn sub(&mut self, a: TermId, b: TermId) -> TermId {
        if a == b {
            return self.constant(0);
        }
        match (self.as_constant(a), self.as_constant(b)) {
            (Some(x), Some(y)) => self.constant(x - y),
            (Some(0), None) => self.negate(b),
            (None, Some(0)) => a,
            _ => self.intern(TermKind::Sub(a, b)),
        }
    }

    /// `c * t`.
    pub fn mul(&mut self, c: i64, t: TermId) -> TermId {
        if c == 0 {
            return self.constant(0);
        }
        if c == 1 {
            return t;
        }
        // folding stops where the product leaves i64
        match self.kind(t).clone() {
            TermKind::Constant(v) if c.checked_mul(v).is_some() => self.constant(c * v),
            TermKind::Mul(d, u) if c.checked_mul(d).is_some() => self.mul(c * d, u),
            TermKind::Neg(u) if c != i64::MIN => self.mul(-c, u),
            TermKind::Add(_) => self.linear_combination(&[(t, c)]),
            _ if c == -1 => self.intern(TermKind::Neg(t)),
            _ => self.intern(TermKind::Mul(c, t)),
        }
    }

    /// `-t`.
    pub fn negate(&mut self, t: TermId) -> TermId {
        self.mul(-1, t)
    }

    pub fn min(&mut self, a: TermId, b: TermId) -> TermId {
        if a == b {
            return a;
        }
        if let (Some(x), Some(y)) = (self.as_constant(a), self.as_constant(b)) {
            return self.constant(x.min(y));
        }
        self.intern(TermKind::Min(a.min(b), a.max(b)))
    }

    pub fn max(&mut self, a: TermId, b: TermId) -> TermId {
        if a == b {
            return a;
        }
        if let (Some(x), Some(y)) = (self.as_constant(a), self.as_constant(b)) {
            return self.constant(x.max(y));
        }
        self.intern(TermKind::Max(a.min(b), a.max(b)))
    }

    pub fn abs(&mut self, t: TermId) -> TermId {
        if let Some(c) = self.as_constant(t) {
            return self.constant(c.abs());
        }
        if matches!(self.kind(t), TermKind::Abs(_)) {
            return t;
        }
        self.intern(TermKind::Abs(t))
    }

    /// Euclidean quotient `t div c`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `c` is zero.
    pub fn div(&mut self, t: TermId, c: i64) -> Result<TermId> {
        if c == 0 {
            return Err(CspError::InvalidArgument(format!(
                "division of {} by zero",
                self.display(t)
            )));
        }
        if c == 1 {
            return Ok(t);
        }
        Ok(match self.as_constant(t) {
            Some(v) => self.constant(v.div_euclid(c)),
            None => self.intern(TermKind::Div(t, c)),
        })
    }

    /// Euclidean remainder `t mod c`, always in `[0, |c|)`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `c` is zero.
    pub fn modulo(&mut self, t: TermId, c: i64) -> Result<TermId> {
        if c == 0 {
            return Err(CspError::InvalidArgument(format!(
                "modulo of {} by zero",
                self.display(t)
            )));
        }
        if c.abs() == 1 {
            return Ok(self.constant(0));
        }
        Ok(match self.as_constant(t) {
            Some(v) => self.constant(v.rem_euclid(c)),
            None => self.intern(TermKind::Mod(t, c)),
        })
    }

    /// `a * b` for arbitrary terms. A constant operand gives a scalar multiple.
    pub fn product(&mut self, a: TermId, b: TermId) -> TermId {
        if let Some(c) = self.as_constant(a) {
            return self.mul(c, b);
        }
        if let Some(c) = self.as_constant(b) {
            return self.mul(c, a);
        }
        self.intern(TermKind::Product(a.min(b), a.max(b)))
    }

    fn linear_combination(&mut self, weighted: &[(TermId, i64)]) -> TermId {
        let mut coefs: BTreeMap<TermId, i64> = BTreeMap::new();
        let mut constant = 0i64;
        for &(t, k) in weighted {
            self.collect_linear(t, k, &mut coefs, &mut constant);
        }
        let mut operands = Vec::with_capacity(coefs.len() + 1);
        for (t, k) in coefs {
            match k {
                0 => {}
                1 => operands.push(t),
                -1 => operands.push(self.intern(TermKind::Neg(t))),
                _ => operands.push(self.intern(TermKind::Mul(k, t))),
            }
        }
        if constant != 0 || operands.is_empty() {
            operands.push(self.constant(constant));
        }
        if operands.len() == 1 {
            return operands[0];
        }
        operands.sort();
        self.intern(TermKind::Add(operands))
    }

    fn collect_linear(
        &self,
        t: TermId,
        k: i64,
        coefs: &mut BTreeMap<TermId, i64>,
        constant: &mut i64,
    ) {
        match self.kind(t) {
            TermKind::Constant(c) => *constant += k * c,
            TermKind::Add(children) => {
                for &child in children {
                    self.collect_linear(child, k, coefs, constant);
                }
            }
            TermKind::Mul(c, u) => self.collect_linear(*u, k * c, coefs, constant),
            TermKind::Neg(u) => self.collect_linear(*u, -k, coefs, constant),
            _ => *coefs.entry(t).or_insert(0) += k,
        }
    }

    fn intern(&mut self, kind: TermKind) -> TermId {
        if let Some(&id) = self.term_index.get(&kind) {
            return id;
        }
        let domain = self.compute_domain(&kind);
        let id = TermId(self.kinds.len() as u32);
        self.kinds.push(kind.clone());
        self.domains.push(domain);
        self.term_index.insert(kind, id);
        id
    }

    fn compute_domain(&self, kind: &TermKind) -> IntegerDomain {
        let d = |t: &TermId| self.domain_of(*t);
        let cap = self.options.max_set_size;
        let domain = match kind {
            TermKind::Constant(c) => IntegerDomain::singleton(*c),
            TermKind::Variable(v) => v.domain().clone(),
            TermKind::Add(children) => children
                .iter()
                .fold(IntegerDomain::singleton(0), |acc, t| acc.add_domain_with_cap(d(t), cap)),
            TermKind::Sub(a, b) => d(a).sub_domain_with_cap(d(b), cap),
            TermKind::Mul(c, t) => d(t).mul_with_cap(*c, cap),
            TermKind::Neg(t) => d(t).negate(),
            TermKind::Min(a, b) => d(a).min_domain_with_cap(d(b), cap),
            TermKind::Max(a, b) => d(a).max_domain_with_cap(d(b), cap),
            TermKind::Abs(t) => d(t).abs(),
            TermKind::Div(t, c) => d(t).div(*c),
            TermKind::Mod(t, c) => d(t).modulo_with_cap(*c, cap),
            TermKind::Product(a, b) => d(a).mul_domain_with_cap(d(b), cap),
        };
        self.cap_domain(domain)
    }

    /// Displays a term in infix form.
    pub fn display(&self, term: TermId) -> TermDisplay<'_> {
        TermDisplay {
            factory: self,
            term,
        }
    }

    /// Value of `term` under `values`, or `None` if a variable is unassigned
    /// or the value leaves `i64`.
    pub fn evaluate_term(&self, term: TermId, values: &BTreeMap<IntVar, i64>) -> Option<i64> {
        let eval = |t: &TermId| self.evaluate_term(*t, values);
        Some(match self.kind(term) {
            TermKind::Constant(c) => *c,
            TermKind::Variable(v) => *values.get(v)?,
            TermKind::Add(children) => {
                let mut total: i64 = 0;
                for child in children {
                    total = total.checked_add(eval(child)?)?;
                }
                total
            }
            TermKind::Sub(a, b) => eval(a)?.checked_sub(eval(b)?)?,
            TermKind::Mul(c, t) => c.checked_mul(eval(t)?)?,
            TermKind::Neg(t) => eval(t)?.checked_neg()?,
            TermKind::Min(a, b) => eval(a)?.min(eval(b)?),
            TermKind::Max(a, b) => eval(a)?.max(eval(b)?),
            TermKind::Abs(t) => eval(t)?.checked_abs()?,
            TermKind::Div(t, c) => eval(t)?.checked_div_euclid(*c)?,
            TermKind::Mod(t, c) => eval(t)?.checked_rem_euclid(*c)?,
            TermKind::Product(a, b) => eval(a)?.checked_mul(eval(b)?)?,
        })
    }

    // ---- predicates ----

    pub fn predicate(&self, id: PredicateId) -> Result<&Predicate> {
        self.predicates
            .get(id.index())
            .ok_or_else(|| CspError::UnsupportedPredicate(format!("{:?}", id)))
    }

    /// Handle of the negation of predicate `id`.
    pub fn negate_predicate(&mut self, id: PredicateId) -> Result<PredicateId> {
        let negated = self.predicate(id)?.negate();
        Ok(self.intern_predicate(negated))
    }

    pub(crate) fn intern_predicate(&mut self, predicate: Predicate) -> PredicateId {
        if let Some(&id) = self.predicate_index.get(&predicate) {
            return id;
        }
        let id = PredicateId(self.predicates.len() as u32);
        self.predicates.push(predicate.clone());
        self.predicate_index.insert(predicate, id);
        id
    }

    /// The comparison `left op right`.
    pub fn compare(&mut self, op: CompareOp, left: TermId, right: TermId) -> Formula {
        let id = self.intern_predicate(Predicate::Comparison { op, left, right });
        Formula::Predicate(id)
    }

    pub fn eq(&mut self, left: TermId, right: TermId) -> Formula {
        self.compare(CompareOp::Eq, left, right)
    }

    pub fn ne(&mut self, left: TermId, right: TermId) -> Formula {
        self.compare(CompareOp::Ne, left, right)
    }

    pub fn lt(&mut self, left: TermId, right: TermId) -> Formula {
        self.compare(CompareOp::Lt, left, right)
    }

    pub fn le(&mut self, left: TermId, right: TermId) -> Formula {
        self.compare(CompareOp::Le, left, right)
    }

    pub fn gt(&mut self, left: TermId, right: TermId) -> Formula {
        self.compare(CompareOp::Gt, left, right)
    }

    pub fn ge(&mut self, left: TermId, right: TermId) -> Formula {
        self.compare(CompareOp::Ge, left, right)
    }

    /// All `terms` take pairwise distinct values.
    pub fn all_different(&mut self, terms: &[TermId]) -> Formula {
        let mut terms = terms.to_vec();
        terms.sort();
        Formula::Predicate(self.intern_predicate(Predicate::AllDifferent(terms)))
    }

    /// At least two of `terms` are equal.
    pub fn pigeonhole(&mut self, terms: &[TermId]) -> Formula {
        let mut terms = terms.to_vec();
        terms.sort();
        Formula::Predicate(self.intern_predicate(Predicate::Pigeonhole(terms)))
    }

    /// Truth value of `formula` under `assignment`, or `None` if something
    /// it mentions is unassigned.
    pub fn evaluate(&self, formula: &Formula, assignment: &CspAssignment) -> Result<Option<bool>> {
        let values = assignment.int_values();
        Ok(match formula {
            Formula::Constant(b) => Some(*b),
            Formula::Literal(l) => assignment
                .bool_value(l.var())
                .map(|v| v == l.is_positive()),
            Formula::Predicate(id) => self.evaluate_predicate(*id, values)?,
            Formula::Not(f) => self.evaluate(f, assignment)?.map(|b| !b),
            Formula::And(fs) => {
                let mut result = Some(true);
                for f in fs {
                    match self.evaluate(f, assignment)? {
                        Some(false) => return Ok(Some(false)),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Formula::Or(fs) => {
                let mut result = Some(false);
                for f in fs {
                    match self.evaluate(f, assignment)? {
                        Some(true) => return Ok(Some(true)),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Formula::Implies(a, b) => {
                match (self.evaluate(a, assignment)?, self.evaluate(b, assignment)?) {
                    (Some(false), _) | (_, Some(true)) => Some(true),
                    (Some(true), Some(false)) => Some(false),
                    _ => None,
                }
            }
            Formula::Equiv(a, b) => {
                match (self.evaluate(a, assignment)?, self.evaluate(b, assignment)?) {
                    (Some(x), Some(y)) => Some(x == y),
                    _ => None,
                }
            }
        })
    }

    fn evaluate_predicate(
        &self,
        id: PredicateId,
        values: &BTreeMap<IntVar, i64>,
    ) -> Result<Option<bool>> {
        let all_distinct = |terms: &[TermId]| -> Option<bool> {
            let mut seen = Vec::with_capacity(terms.len());
            for t in terms {
                seen.push(self.evaluate_term(*t, values)?);
            }
            seen.sort_unstable();
            Some(seen.windows(2).all(|w| w[0] != w[1]))
        };
        Ok(match self.predicate(id)? {
            Predicate::Comparison { op, left, right } => {
                match (self.evaluate_term(*left, values), self.evaluate_term(*right, values)) {
                    (Some(l), Some(r)) => Some(op.holds(l, r)),
                    _ => None,
                }
            }
            Predicate::AllDifferent(terms) => all_distinct(terms),
            Predicate::Pigeonhole(terms) => all_distinct(terms).map(|b| !b),
        })
    }
}

/// Infix rendering of a term, see [`CspFactory::display`].
pub struct TermDisplay<'a> {
    factory: &'a CspFactory,
    term: TermId,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |t: &TermId| self.factory.display(*t);
        match self.factory.kind(self.term) {
            TermKind::Constant(c) => write!(f, "{}", c),
            TermKind::Variable(v) => write!(f, "{}", v),
            TermKind::Add(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}", show(child))?;
                }
                write!(f, ")")
            }
            TermKind::Sub(a, b) => write!(f, "({} - {})", show(a), show(b)),
            TermKind::Mul(c, t) => write!(f, "{}*{}", c, show(t)),
            TermKind::Neg(t) => write!(f, "-{}", show(t)),
            TermKind::Min(a, b) => write!(f, "min({}, {})", show(a), show(b)),
            TermKind::Max(a, b) => write!(f, "max({}, {})", show(a), show(b)),
            TermKind::Abs(t) => write!(f, "abs({})", show(t)),
            TermKind::Div(t, c) => write!(f, "({} div {})", show(t), c),
            TermKind::Mod(t, c) => write!(f, "({} mod {})", show(t), c),
            TermKind::Product(a, b) => write!(f, "({} * {})", show(a), show(b)),
        }
    }
}
